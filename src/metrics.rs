//! Shipped-line accounting.
//!
//! Clients report every line written through an injected [`ShippedLines`]
//! sink. By default that sink is the process-wide counter exposed by
//! [`shipped_lines`], which an external metrics or debug endpoint can read
//! under [`SHIPPED_LINES_METRIC`]. Tests inject their own
//! [`ShippedLineCounter`] to observe counts in isolation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Name under which the process-wide counter is published.
pub const SHIPPED_LINES_METRIC: &str = "syslog_shipped_lines";

static SHIPPED_LINES: ShippedLineCounter = ShippedLineCounter::new();

/// Sink notified once per line successfully written.
pub trait ShippedLines: Send + Sync {
    /// Record `lines` additional shipped lines.
    fn add(&self, lines: u64);
}

/// Monotonic counter of shipped lines. There is no reset.
#[derive(Debug, Default)]
pub struct ShippedLineCounter {
    lines: AtomicU64,
}

impl ShippedLineCounter {
    pub const fn new() -> Self {
        Self {
            lines: AtomicU64::new(0),
        }
    }

    /// Current value of the counter.
    pub fn get(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }
}

impl ShippedLines for ShippedLineCounter {
    fn add(&self, lines: u64) {
        self.lines.fetch_add(lines, Ordering::Relaxed);
    }
}

impl<T: ShippedLines + ?Sized> ShippedLines for Arc<T> {
    fn add(&self, lines: u64) {
        (**self).add(lines);
    }
}

/// Sink forwarding to the process-wide counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalShippedLines;

impl ShippedLines for GlobalShippedLines {
    fn add(&self, lines: u64) {
        SHIPPED_LINES.add(lines);
    }
}

/// The process-wide counter shared by every client using the default sink.
pub fn shipped_lines() -> &'static ShippedLineCounter {
    &SHIPPED_LINES
}
