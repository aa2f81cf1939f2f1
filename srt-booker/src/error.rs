//! Errors that end a run.

use crate::config::ConfigError;
use crate::search::ConfigurationError;
use crate::session::AuthenticationError;
use crate::site::DriverError;

/// A fatal error from setup. Faults inside the polling loop never get here.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
