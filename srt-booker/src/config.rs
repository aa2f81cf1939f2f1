//! Run configuration: timing for the booking loop and the route file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{ClockTime, PassengerCount, SearchCriteria, SelectionPolicy, StationName};

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Route file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Route file is not valid TOML or has the wrong shape
    #[error("invalid route file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A route entry has an unusable value
    #[error("route {index}: {field}: {message}")]
    InvalidRoute {
        index: usize,
        field: &'static str,
        message: String,
    },

    /// Route file has no `[[route]]` entries
    #[error("route file defines no routes")]
    NoRoutes,

    /// Required environment variable is unset or blank
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Timing parameters for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// How long to wait for the previous first row to detach after a search.
    pub refresh_timeout_secs: u64,

    /// How long to wait for at least one result row.
    pub rows_timeout_secs: u64,

    /// How long to watch for a confirmation dialog after a claim click.
    pub dialog_timeout_secs: u64,

    /// Interval between probes inside a bounded wait (milliseconds).
    pub probe_interval_ms: u64,

    /// Pause after rows appear, before reading them (milliseconds).
    pub settle_pause_ms: u64,

    /// Pause after a cycle that found nothing to claim (milliseconds).
    pub retry_interval_ms: u64,

    /// Pause after a cycle with no rows at all (milliseconds).
    pub empty_backoff_ms: u64,

    /// Pause after an unexpected fault (milliseconds).
    pub error_backoff_ms: u64,
}

impl PollConfig {
    /// Returns the refresh detection timeout as a Duration.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Returns the row presence timeout as a Duration.
    pub fn rows_timeout(&self) -> Duration {
        Duration::from_secs(self.rows_timeout_secs)
    }

    /// Returns the dialog watch timeout as a Duration.
    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_secs(self.dialog_timeout_secs)
    }

    /// Returns the probe interval as a Duration.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Returns the settle pause as a Duration.
    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }

    /// Returns the retry interval as a Duration.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Returns the empty-result backoff as a Duration.
    pub fn empty_backoff(&self) -> Duration {
        Duration::from_millis(self.empty_backoff_ms)
    }

    /// Returns the fault backoff as a Duration.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: 60,
            rows_timeout_secs: 10,
            dialog_timeout_secs: 3,
            probe_interval_ms: 250,
            settle_pause_ms: 500,
            retry_interval_ms: 500,
            empty_backoff_ms: 1000,
            error_backoff_ms: 1000,
        }
    }
}

/// Timing parameters for login.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the browser may stay on the login page after submitting.
    pub login_timeout_secs: u64,

    /// Interval between login page checks (milliseconds).
    pub probe_interval_ms: u64,
}

impl SessionConfig {
    /// Returns the login timeout as a Duration.
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    /// Returns the probe interval as a Duration.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_timeout_secs: 10,
            probe_interval_ms: 250,
        }
    }
}

/// On-disk shape of the route file.
#[derive(Debug, Deserialize)]
struct RouteFile {
    #[serde(rename = "route", default)]
    routes: Vec<RouteEntry>,
}

/// One `[[route]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteEntry {
    origin: String,
    destination: String,
    date: String,
    start_time: String,
    #[serde(default = "default_passengers")]
    passengers: u32,
    exact_time: Option<String>,
    end_time: Option<String>,
}

fn default_passengers() -> u32 {
    1
}

impl RouteEntry {
    fn into_criteria(self, index: usize) -> Result<SearchCriteria, ConfigError> {
        let invalid = |field: &'static str, message: String| ConfigError::InvalidRoute {
            index,
            field,
            message,
        };

        let origin = StationName::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        let destination = StationName::parse(&self.destination)
            .map_err(|e| invalid("destination", e.to_string()))?;
        if origin == destination {
            return Err(invalid(
                "destination",
                "must differ from origin".to_string(),
            ));
        }

        let date = parse_date(&self.date).ok_or_else(|| {
            invalid("date", format!("expected YYYY-MM-DD or YYYYMMDD, got {:?}", self.date))
        })?;

        let start_time =
            ClockTime::parse(&self.start_time).map_err(|e| invalid("start_time", e.to_string()))?;
        let exact_time = self
            .exact_time
            .as_deref()
            .map(ClockTime::parse)
            .transpose()
            .map_err(|e| invalid("exact_time", e.to_string()))?;
        let end_time = self
            .end_time
            .as_deref()
            .map(ClockTime::parse)
            .transpose()
            .map_err(|e| invalid("end_time", e.to_string()))?;

        let policy = SelectionPolicy::from_bounds(start_time, end_time, exact_time)
            .map_err(|e| invalid("end_time", e.to_string()))?;

        let passengers = PassengerCount::new(self.passengers)
            .map_err(|e| invalid("passengers", e.to_string()))?;

        Ok(SearchCriteria::new(
            origin,
            destination,
            date,
            start_time,
            passengers,
            policy,
        ))
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// Parse route definitions from TOML text, in file order.
///
/// Route indices in errors are 1-based, matching the order in the file.
pub fn parse_routes(text: &str) -> Result<Vec<SearchCriteria>, ConfigError> {
    let file: RouteFile = toml::from_str(text)?;
    if file.routes.is_empty() {
        return Err(ConfigError::NoRoutes);
    }

    file.routes
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.into_criteria(i + 1))
        .collect()
}

/// Load route definitions from a TOML file.
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<SearchCriteria>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_routes(&text)
}
