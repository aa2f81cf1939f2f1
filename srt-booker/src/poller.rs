//! Availability polling.
//!
//! The results table is replaced in place on every search rather than
//! loaded as a new page, so a refresh is detected by watching the previous
//! first row go stale. Each poll yields an owned [`RowSnapshot`] tagged with
//! its [`Cycle`]; handles inside it are never valid in a later cycle.

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::domain::ClockTime;
use crate::site::{ResultsTable, SiteError};
use crate::wait::wait_until;

/// Sequence number of a poll cycle, starting at 1.
///
/// Doubles as the attempt number in progress output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycle(u64);

impl Cycle {
    /// Returns the cycle number.
    pub fn get(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One result row as read during a single poll cycle.
#[derive(Debug, Clone)]
pub struct TrainRow<R> {
    departure_text: String,
    handle: R,
    cycle: Cycle,
}

impl<R> TrainRow<R> {
    /// Create a row read during `cycle`.
    pub fn new(departure_text: impl Into<String>, handle: R, cycle: Cycle) -> Self {
        Self {
            departure_text: departure_text.into(),
            handle,
            cycle,
        }
    }

    /// Raw departure cell text, possibly with the station name around it.
    pub fn departure_text(&self) -> &str {
        &self.departure_text
    }

    /// The departure time embedded in the cell text, if any.
    pub fn departure(&self) -> Option<ClockTime> {
        ClockTime::extract(&self.departure_text)
    }

    /// Handle into the live table. Only meaningful during [`TrainRow::cycle`].
    pub fn handle(&self) -> &R {
        &self.handle
    }

    /// The cycle this row was read in.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }
}

/// All rows read during one poll cycle, in display order.
#[derive(Debug, Clone)]
pub struct RowSnapshot<R> {
    cycle: Cycle,
    rows: Vec<TrainRow<R>>,
}

impl<R> RowSnapshot<R> {
    /// A snapshot with no rows.
    pub fn empty(cycle: Cycle) -> Self {
        Self {
            cycle,
            rows: Vec::new(),
        }
    }

    /// The cycle this snapshot belongs to.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[TrainRow<R>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the search listed no trains.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Re-runs the search and reads the refreshed table.
///
/// Never terminates on its own; the caller decides when to stop polling.
pub struct AvailabilityPoller<'a, T: ResultsTable> {
    table: &'a T,
    config: &'a PollConfig,
    cycle: Cycle,
}

impl<'a, T: ResultsTable> AvailabilityPoller<'a, T> {
    /// Create a poller. The first call to [`AvailabilityPoller::poll`] is cycle 1.
    pub fn new(table: &'a T, config: &'a PollConfig) -> Self {
        Self {
            table,
            config,
            cycle: Cycle(0),
        }
    }

    /// The most recent cycle; rows from any other cycle are stale.
    pub fn current_cycle(&self) -> Cycle {
        self.cycle
    }

    /// Trigger a search, wait for the table to refresh, and read it.
    ///
    /// A refresh that is never observed only produces a warning. An empty
    /// table after the row wait yields an empty snapshot. A
    /// [`SiteError::StaleElement`] means the table changed while being read;
    /// callers should poll again straight away.
    pub async fn poll(&mut self) -> Result<RowSnapshot<T::Row>, SiteError> {
        self.cycle = self.cycle.next();
        let cycle = self.cycle;
        let table = self.table;
        let interval = self.config.probe_interval();

        info!(attempt = cycle.get(), "searching for trains");

        let sentinel = match table.first_row().await {
            Ok(row) => row,
            Err(e) => {
                debug!(attempt = cycle.get(), error = %e, "no staleness sentinel");
                None
            }
        };

        table.trigger_search().await?;

        if let Some(sentinel) = sentinel {
            let timeout = self.config.refresh_timeout();
            match wait_until(timeout, interval, async || table.is_detached(&sentinel).await).await {
                Ok(true) => debug!(attempt = cycle.get(), "results refreshed"),
                Ok(false) => warn!(
                    attempt = cycle.get(),
                    ?timeout,
                    "no refresh observed, reading results anyway"
                ),
                Err(e) => warn!(
                    attempt = cycle.get(),
                    error = %e,
                    "refresh check failed, reading results anyway"
                ),
            }
        }

        let present = wait_until(self.config.rows_timeout(), interval, async || {
            Ok(!table.rows().await?.is_empty())
        })
        .await?;
        if !present {
            return Ok(RowSnapshot::empty(cycle));
        }

        sleep(self.config.settle_pause()).await;

        let mut rows = Vec::new();
        for handle in table.rows().await? {
            let text = table.departure_text(&handle).await?;
            rows.push(TrainRow::new(text, handle, cycle));
        }

        debug!(attempt = cycle.get(), rows = rows.len(), "results read");
        Ok(RowSnapshot { cycle, rows })
    }
}
