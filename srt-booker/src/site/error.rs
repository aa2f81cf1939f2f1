//! Site interaction error types.

use std::time::Duration;

/// Errors from interacting with the reservation site.
///
/// Only [`SiteError::StaleElement`] has special meaning to the polling loop:
/// it signals that the results table was replaced while being read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiteError {
    /// A control the site contract promises could not be found.
    #[error("element not found: {what}")]
    ElementNotFound { what: &'static str },

    /// An element reference outlived the document it pointed into.
    #[error("stale element reference")]
    StaleElement,

    /// A bounded wait expired.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: &'static str, after: Duration },

    /// Any other failure reported by the browser driver.
    #[error("driver error: {message}")]
    Driver { message: String },
}

impl SiteError {
    /// Create a driver error from any message.
    pub fn driver(message: impl Into<String>) -> Self {
        SiteError::Driver {
            message: message.into(),
        }
    }

    /// Returns true if the error means a row was detached mid-read.
    pub fn is_stale(&self) -> bool {
        matches!(self, SiteError::StaleElement)
    }
}
