//! Debounce decision: has the log been quiet long enough?
//!
//! A single game action produces a burst of log lines. Surfacing state after
//! every line would hand the consumer half-applied intermediate states, so
//! the watcher only notifies once no signal has arrived for the debounce
//! interval.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default quiet period before state counts as stable
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Monotonic time source, measured from an arbitrary fixed origin
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the watcher.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_nanos(by), Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(duration_nanos(at), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Decides whether the observed state has been quiet for `debounce`
#[derive(Debug)]
pub struct StableDecider {
    debounce: Duration,
    clock: Arc<dyn Clock>,
    /// Clock reading of the last change, in nanoseconds
    last_change: AtomicU64,
}

impl StableDecider {
    /// The quiet period starts at construction
    pub fn new(debounce: Duration, clock: Arc<dyn Clock>) -> Self {
        let now = duration_nanos(clock.now());
        StableDecider {
            debounce,
            clock,
            last_change: AtomicU64::new(now),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Record new activity, restarting the quiet period
    pub fn notify_changed(&self) {
        let now = duration_nanos(self.clock.now());
        self.last_change.store(now, Ordering::Release);
    }

    pub fn is_stable(&self) -> bool {
        self.quiet_for() >= self.debounce
    }

    /// Time since the last recorded change
    pub fn quiet_for(&self) -> Duration {
        let now = duration_nanos(self.clock.now());
        let last = self.last_change.load(Ordering::Acquire);
        Duration::from_nanos(now.saturating_sub(last))
    }
}
