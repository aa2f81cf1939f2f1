//! Bounded waits against the live page.
//!
//! Every wait point in the booking flow goes through [`poll_until`], so each
//! one has an explicit deadline and a fixed probe interval.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::site::SiteError;

/// Re-run `probe` every `interval` until it yields a value or `timeout`
/// elapses.
///
/// Returns `Ok(None)` on timeout. The probe always runs at least once, even
/// with a zero timeout. A probe error ends the wait immediately.
pub async fn poll_until<T, F>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<Option<T>, SiteError>
where
    F: AsyncFnMut() -> Result<Option<T>, SiteError>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// [`poll_until`] for yes/no conditions. Returns whether it became true.
pub async fn wait_until<F>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<bool, SiteError>
where
    F: AsyncFnMut() -> Result<bool, SiteError>,
{
    poll_until(timeout, interval, async || Ok(probe().await?.then_some(())))
        .await
        .map(|met| met.is_some())
}
