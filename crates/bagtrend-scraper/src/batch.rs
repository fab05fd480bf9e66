//! Politeness delay between outbound sub-batch requests.
//!
//! The delay is a deliberate serialization point to stay under upstream
//! rate limits, not an incidental bottleneck. It is cancellable at run
//! granularity: aborting a run must not wait out a pending sleep, even
//! though individual request round trips are left to finish.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Inclusive bounds, in seconds, for the randomized politeness delay.
#[derive(Debug, Clone, Copy)]
pub struct DelayRange {
    min_secs: u64,
    max_secs: u64,
}

impl DelayRange {
    /// Inverted bounds are collapsed to the minimum.
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
        }
    }

    /// A zero-length delay, for tests and dry runs.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            min_secs: 0,
            max_secs: 0,
        }
    }

    fn sample(self) -> Duration {
        if self.max_secs == 0 {
            return Duration::ZERO;
        }
        let secs = rand::rng().random_range(self.min_secs..=self.max_secs);
        Duration::from_secs(secs)
    }
}

/// Sleep for a randomized interval drawn from `range`.
///
/// Returns `false` if `cancel` fires before the interval elapses (or had
/// already fired), `true` once the full delay has been served.
pub(crate) async fn polite_delay(range: DelayRange, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let delay = range.sample();
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
