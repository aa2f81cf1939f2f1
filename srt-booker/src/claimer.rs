//! Claiming a seat on a matching train.
//!
//! The claim affordance is picked by its label, since sold-out, waitlist
//! and reservable states all render into the same cell. Success is declared
//! as soon as the affordance is clicked and any confirmation dialog is
//! accepted; whether the site actually holds the seat is left for the
//! operator to check.

use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::poller::{Cycle, TrainRow};
use crate::site::selectors::RESERVE_LABEL;
use crate::site::{ClaimSurface, SiteError};
use crate::wait::poll_until;

/// Result of one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The affordance was clicked and any dialog accepted.
    Claimed {
        /// Text of the accepted confirmation dialog, if one appeared.
        dialog: Option<String>,
    },

    /// No affordance carries the reservation label. The row may be sold out
    /// or in a non-actionable state.
    NoActionableAffordance {
        /// Labels that were present instead.
        labels: Vec<String>,
    },

    /// The attempt failed; polling should carry on.
    Failed(SiteError),
}

/// Finds and activates a row's reservation affordance.
pub struct ReservationClaimer<'a, S: ClaimSurface> {
    surface: &'a S,
    config: &'a PollConfig,
    label: &'a str,
}

impl<'a, S: ClaimSurface> ReservationClaimer<'a, S> {
    /// Create a claimer looking for the site's reservation label.
    pub fn new(surface: &'a S, config: &'a PollConfig) -> Self {
        Self {
            surface,
            config,
            label: RESERVE_LABEL,
        }
    }

    /// Try to claim `row`, which must come from the `current` poll cycle.
    ///
    /// Never returns an error: every failure is logged and reported as
    /// [`ClaimOutcome::Failed`].
    pub async fn claim(&self, row: &TrainRow<S::Row>, current: Cycle) -> ClaimOutcome {
        if row.cycle() != current {
            warn!(
                row_cycle = row.cycle().get(),
                current = current.get(),
                "refusing to act on a row from an earlier search"
            );
            return ClaimOutcome::Failed(SiteError::StaleElement);
        }

        match self.try_claim(row).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(attempt = current.get(), error = %e, "claim failed");
                ClaimOutcome::Failed(e)
            }
        }
    }

    async fn try_claim(&self, row: &TrainRow<S::Row>) -> Result<ClaimOutcome, SiteError> {
        let attempt = row.cycle().get();
        let handle = row.handle();

        let labels = self.surface.claim_labels(handle).await?;
        let Some(index) = labels.iter().position(|l| l.contains(self.label)) else {
            info!(
                attempt,
                departure = row.departure_text(),
                ?labels,
                "matching train has no reservable seat"
            );
            return Ok(ClaimOutcome::NoActionableAffordance { labels });
        };

        info!(attempt, label = %labels[index], "claiming seat");
        self.surface.activate_claim(handle, index).await?;

        let surface = self.surface;
        let dialog = match poll_until(
            self.config.dialog_timeout(),
            self.config.probe_interval(),
            async || surface.dialog_text().await,
        )
        .await
        {
            Ok(dialog) => dialog,
            Err(e) => {
                debug!(attempt, error = %e, "dialog check failed, assuming none");
                None
            }
        };

        match &dialog {
            Some(text) => {
                info!(attempt, dialog = %text, "accepting confirmation dialog");
                self.surface.accept_dialog().await?;
            }
            None => debug!(attempt, "no confirmation dialog"),
        }

        Ok(ClaimOutcome::Claimed { dialog })
    }
}
