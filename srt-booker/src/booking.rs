//! The booking loop: poll, match, claim, repeat.
//!
//! The loop has no natural end. It stops on the first successful claim or
//! when the shutdown future completes. Every fault inside it is absorbed:
//! - a stale read re-polls straight away
//! - an empty table backs off for `empty_backoff`
//! - any other fault backs off for `error_backoff`
//! - a cycle with no claim waits `retry_interval`

use std::future::Future;
use std::pin::{Pin, pin};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::claimer::{ClaimOutcome, ReservationClaimer};
use crate::config::{PollConfig, SessionConfig};
use crate::domain::{ClockTime, SearchCriteria};
use crate::error::RunError;
use crate::matcher::candidates;
use crate::poller::AvailabilityPoller;
use crate::search::SearchConfigurator;
use crate::session::{Credentials, SessionController};
use crate::site::{ClaimSurface, LoginSurface, SearchForm};

/// The train a seat was claimed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedTrain {
    pub departure: ClockTime,
    pub departure_text: String,
    /// Poll cycle the claim happened in.
    pub attempts: u64,
    /// Confirmation dialog that was accepted, if any.
    pub dialog: Option<String>,
}

/// How a booking loop ended. Reported once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    Success(ReservedTrain),
    /// Stopped from outside before anything was claimed.
    Exhausted,
}

impl ReservationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReservationOutcome::Success(_))
    }
}

/// Runs poll cycles against one configured search.
pub struct BookingLoop<'a, S: ClaimSurface> {
    surface: &'a S,
    config: &'a PollConfig,
}

impl<'a, S: ClaimSurface> BookingLoop<'a, S> {
    pub fn new(surface: &'a S, config: &'a PollConfig) -> Self {
        Self { surface, config }
    }

    /// Poll until a seat is claimed or `shutdown` completes.
    ///
    /// The search form must already be configured for `criteria`.
    pub async fn run(
        &self,
        criteria: &SearchCriteria,
        shutdown: impl Future<Output = ()>,
    ) -> ReservationOutcome {
        tokio::select! {
            reserved = self.claim_first(criteria) => ReservationOutcome::Success(reserved),
            () = shutdown => {
                info!(route = %criteria, "stopped before a seat was claimed");
                ReservationOutcome::Exhausted
            }
        }
    }

    async fn claim_first(&self, criteria: &SearchCriteria) -> ReservedTrain {
        let mut poller = AvailabilityPoller::new(self.surface, self.config);
        let claimer = ReservationClaimer::new(self.surface, self.config);

        'poll: loop {
            let snapshot = match poller.poll().await {
                Ok(snapshot) => snapshot,
                Err(e) if e.is_stale() => {
                    info!(
                        attempt = poller.current_cycle().get(),
                        "results changed while reading, searching again"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(attempt = poller.current_cycle().get(), error = %e, "search failed");
                    sleep(self.config.error_backoff()).await;
                    continue;
                }
            };

            let attempt = snapshot.cycle().get();
            if snapshot.is_empty() {
                info!(attempt, "no trains listed");
                sleep(self.config.empty_backoff()).await;
                continue;
            }

            for (row, departure) in candidates(&snapshot, criteria) {
                info!(attempt, %departure, "found matching train");
                match claimer.claim(row, poller.current_cycle()).await {
                    ClaimOutcome::Claimed { dialog } => {
                        info!(attempt, %departure, "seat claimed");
                        return ReservedTrain {
                            departure,
                            departure_text: row.departure_text().to_string(),
                            attempts: attempt,
                            dialog,
                        };
                    }
                    ClaimOutcome::NoActionableAffordance { .. } => {}
                    ClaimOutcome::Failed(e) if e.is_stale() => continue 'poll,
                    ClaimOutcome::Failed(_) => {
                        sleep(self.config.error_backoff()).await;
                        continue 'poll;
                    }
                }
            }

            info!(attempt, rows = snapshot.len(), "no seat claimed, retrying");
            sleep(self.config.retry_interval()).await;
        }
    }
}

/// Result of one route.
#[derive(Debug, Clone)]
pub struct RouteReport {
    pub criteria: SearchCriteria,
    pub outcome: ReservationOutcome,
}

/// Everything a run got done, plus the fatal error that cut it short.
///
/// Routes finished before the error keep their reports, so a seat claimed
/// on an early route is still reported when a later route fails.
#[derive(Debug)]
pub struct BookingRun {
    pub reports: Vec<RouteReport>,
    pub error: Option<RunError>,
}

impl BookingRun {
    /// Returns true if any route ended with a claimed seat.
    pub fn any_reserved(&self) -> bool {
        self.reports.iter().any(|r| r.outcome.is_success())
    }
}

/// Logs in once, then books each route in turn on the same session.
pub struct Booker<'a, S> {
    site: &'a S,
    session: &'a SessionConfig,
    poll: &'a PollConfig,
}

impl<'a, S> Booker<'a, S>
where
    S: LoginSurface + SearchForm + ClaimSurface,
{
    pub fn new(site: &'a S, session: &'a SessionConfig, poll: &'a PollConfig) -> Self {
        Self {
            site,
            session,
            poll,
        }
    }

    /// Book `routes` in order.
    ///
    /// Once `shutdown` completes the current route ends as
    /// [`ReservationOutcome::Exhausted`] and the remaining routes are skipped.
    /// A login or form error stops the run; it is returned next to the
    /// reports of the routes already finished.
    pub async fn run(
        &self,
        credentials: &Credentials,
        routes: &[SearchCriteria],
        shutdown: impl Future<Output = ()>,
    ) -> BookingRun {
        let shutdown = pin!(shutdown);
        let mut reports = Vec::with_capacity(routes.len());

        let error = self
            .book(credentials, routes, shutdown, &mut reports)
            .await
            .err();
        if let Some(e) = &error {
            warn!(error = %e, finished = reports.len(), "run aborted");
        }

        BookingRun { reports, error }
    }

    async fn book<F: Future<Output = ()>>(
        &self,
        credentials: &Credentials,
        routes: &[SearchCriteria],
        mut shutdown: Pin<&mut F>,
        reports: &mut Vec<RouteReport>,
    ) -> Result<(), RunError> {
        let login = SessionController::new(self.site, self.session);
        tokio::select! {
            result = login.authenticate(credentials) => result?,
            () = &mut shutdown => {
                info!("interrupted during login");
                return Ok(());
            }
        }

        let configurator = SearchConfigurator::new(self.site);
        let booking = BookingLoop::new(self.site, self.poll);

        for (i, criteria) in routes.iter().enumerate() {
            info!(route = i + 1, of = routes.len(), %criteria, "starting route");

            let interrupted = tokio::select! {
                result = configurator.configure(criteria) => {
                    result?;
                    false
                }
                () = &mut shutdown => true,
            };
            let outcome = if interrupted {
                ReservationOutcome::Exhausted
            } else {
                booking.run(criteria, shutdown.as_mut()).await
            };

            let stop = !outcome.is_success();
            reports.push(RouteReport {
                criteria: criteria.clone(),
                outcome,
            });
            if stop {
                if i + 1 < routes.len() {
                    warn!(skipped = routes.len() - i - 1, "skipping remaining routes");
                }
                break;
            }
        }

        Ok(())
    }
}
