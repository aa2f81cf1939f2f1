//! Domain types for seat reservation.
//!
//! Validated value types for search criteria and board times. All types
//! enforce their invariants at construction time, so the polling loop can
//! trust them without re-checking.

mod criteria;
mod station;
mod time;

pub use criteria::{
    InvalidPassengerCount, MAX_PASSENGERS, PassengerCount, PolicyError, SearchCriteria,
    SelectionPolicy,
};
pub use station::{InvalidStation, StationName};
pub use time::{BUCKET_HOURS, ClockTime, TimeBucket, TimeError};
