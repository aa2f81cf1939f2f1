//! SRT seat reservation bot.
//!
//! Logs in to the SRT reservation site, fills the search form for a route,
//! then keeps re-running the search until a train departing inside the
//! chosen time window shows a reservable seat, and claims it. Payment is
//! left to the operator in the still-open browser.

pub mod booking;
pub mod claimer;
pub mod config;
pub mod domain;
pub mod error;
pub mod matcher;
pub mod poller;
pub mod search;
pub mod session;
pub mod site;
pub mod wait;

#[cfg(test)]
mod fake;
