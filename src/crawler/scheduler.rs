//! Politeness pacing between requests
//!
//! A run is strictly sequential, so a single pacer holding the time of the
//! previous request is enough. It covers listing and detail fetches alike and
//! folds in any Crawl-delay from robots.txt.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Longest inter-request delay accepted from configuration or robots.txt
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Enforces a minimum interval between consecutive requests
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer with the configured delay in seconds
    ///
    /// Negative and NaN values mean no delay. Values too large for a
    /// `Duration` saturate to `Duration::MAX`.
    pub fn new(delay_seconds: f64) -> Self {
        Self {
            delay: delay_from_secs(delay_seconds),
            last_request: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Raises the delay to at least `seconds` (robots.txt Crawl-delay)
    ///
    /// The floor is capped at [`MAX_DELAY_SECONDS`].
    pub fn raise_floor(&mut self, seconds: f64) {
        if seconds.is_nan() {
            return;
        }
        if seconds > MAX_DELAY_SECONDS {
            tracing::warn!(
                "Crawl-delay of {}s exceeds {}s; using the cap",
                seconds,
                MAX_DELAY_SECONDS
            );
        }
        let floor = delay_from_secs(seconds.min(MAX_DELAY_SECONDS));
        if floor > self.delay {
            tracing::info!(
                "Honouring Crawl-delay of {:.1}s (configured {:.1}s)",
                floor.as_secs_f64(),
                self.delay.as_secs_f64()
            );
            self.delay = floor;
        }
    }

    /// Time left before the next request may be sent
    pub fn time_until_next_request(&self, now: Instant) -> Duration {
        let Some(last) = self.last_request else {
            return Duration::ZERO;
        };
        match last.checked_add(self.delay) {
            Some(next) => next.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }

    /// Waits out the remaining delay, then records a request as sent
    ///
    /// Returns false without recording anything if `cancel` fires first.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let remaining = self.time_until_next_request(Instant::now());
        if !remaining.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = cancel.cancelled() => return false,
            }
        }

        self.last_request = Some(Instant::now());
        true
    }
}

fn delay_from_secs(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
