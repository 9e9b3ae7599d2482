//! Rate limiting for repeated rejected-event warnings.
//!
//! A batch full of malformed events would otherwise emit one warning per
//! event. The warner counts rejections and reports them at most once per
//! interval. Time is measured in milliseconds so sub-second intervals hold.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default interval between rejected-event warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Source of the current time in milliseconds.
pub type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

/// Sentinel for "no warning emitted yet".
const NEVER: u64 = u64::MAX;

/// Milliseconds elapsed on a monotonic clock since its first use.
pub fn monotonic_millis() -> u64 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    let origin = *ORIGIN.get_or_init(Instant::now);
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX - 1)
}

/// Counts rejected events and emits a summary warning once per interval.
///
/// [`record_drop`](Self::record_drop) bumps the counter; the next
/// [`warn_if_due`](Self::warn_if_due) call invokes the callback when the
/// interval has elapsed. [`flush`](Self::flush) reports immediately.
pub struct RateLimitedWarner {
    interval_ms: u64,
    last_warn: AtomicU64,
    dropped: AtomicU64,
    clock: Clock,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// Create a warner whose first warning can be emitted immediately.
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Box::new(monotonic_millis))
    }

    /// Create a warner reading time from `clock`.
    pub fn with_clock(interval: Duration, clock: Clock) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_warn: AtomicU64::new(NEVER),
            dropped: AtomicU64::new(0),
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Increment the rejected-event counter.
    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit a warning if the interval has elapsed since the last one.
    pub fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = (self.clock)();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if prev == NEVER || now.saturating_sub(prev) >= self.interval_ms {
            let count = self.dropped.swap(0, Ordering::Relaxed);
            if count > 0 {
                warn(count);
            }
            self.last_warn.store(now, Ordering::Relaxed);
        }
    }

    /// Immediately warn about any pending rejections.
    pub fn flush(&self, mut warn: impl FnMut(u64)) {
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store((self.clock)(), Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for RateLimitedWarner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedWarner")
            .field("interval_ms", &self.interval_ms)
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}
