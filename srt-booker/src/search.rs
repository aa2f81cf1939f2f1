//! Filling the search form.
//!
//! Configuration happens once per route, before polling starts. Station
//! names are typed rather than looked up by code, so the site's own
//! autosuggest resolves them. The start time is rounded down to the site's
//! two-hour bucket; the matcher applies the exact policy afterwards.

use std::fmt;

use tracing::{debug, info};

use crate::domain::{SearchCriteria, StationName};
use crate::site::{FormSelect, SearchForm, SiteError, StationField};

/// Search form controls, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormControl {
    Origin,
    Destination,
    Date,
    Time,
    Passengers,
}

impl fmt::Display for FormControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormControl::Origin => "origin station",
            FormControl::Destination => "destination station",
            FormControl::Date => "date",
            FormControl::Time => "departure time",
            FormControl::Passengers => "passenger count",
        };
        f.write_str(name)
    }
}

/// Errors from filling the search form. Always fatal for the route.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The search page could not be reached
    #[error("could not open search page: {0}")]
    Navigation(#[source] SiteError),

    /// A control could not be located or set
    #[error("could not set {control}: {source}")]
    Control {
        control: FormControl,
        #[source]
        source: SiteError,
    },
}

/// Fills the search form from a [`SearchCriteria`].
pub struct SearchConfigurator<'a, F: SearchForm> {
    form: &'a F,
}

impl<'a, F: SearchForm> SearchConfigurator<'a, F> {
    pub fn new(form: &'a F) -> Self {
        Self { form }
    }

    /// Open the search page and set every control. No retries.
    pub async fn configure(&self, criteria: &SearchCriteria) -> Result<(), ConfigurationError> {
        self.form
            .open_search()
            .await
            .map_err(ConfigurationError::Navigation)?;

        self.station(StationField::Origin, &criteria.origin).await?;
        self.station(StationField::Destination, &criteria.destination)
            .await?;

        let bucket = criteria.time_bucket();
        debug!(requested = %criteria.start_time, bucket = %bucket.start(), "time bucket");

        self.select(FormControl::Date, FormSelect::Date, &criteria.date_value())
            .await?;
        self.select(FormControl::Time, FormSelect::Time, &bucket.form_value())
            .await?;
        self.select(
            FormControl::Passengers,
            FormSelect::Passengers,
            &criteria.passengers.form_value(),
        )
        .await?;

        info!(route = %criteria, "search form configured");
        Ok(())
    }

    async fn station(
        &self,
        field: StationField,
        name: &StationName,
    ) -> Result<(), ConfigurationError> {
        let control = match field {
            StationField::Origin => FormControl::Origin,
            StationField::Destination => FormControl::Destination,
        };
        self.form
            .type_station(field, name)
            .await
            .map_err(|source| ConfigurationError::Control { control, source })
    }

    async fn select(
        &self,
        control: FormControl,
        select: FormSelect,
        value: &str,
    ) -> Result<(), ConfigurationError> {
        self.form
            .select(select, value)
            .await
            .map_err(|source| ConfigurationError::Control { control, source })
    }
}
