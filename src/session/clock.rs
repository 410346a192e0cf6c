//! Clock
//!
//! Wall-clock source for expiry checks.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond wall clock.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Mock clock for testing.
///
/// Starts at a fixed instant and advances with Tokio's clock, so paused-time
/// tests see token expiry move together with the observer timers. Manual
/// offsets can be added on top.
#[derive(Debug)]
pub struct MockClock {
    origin_ms: i64,
    started: tokio::time::Instant,
    offset_ms: AtomicI64,
}

impl MockClock {
    /// Create mock clock starting at `origin_ms`.
    pub fn new(origin_ms: i64) -> Self {
        Self {
            origin_ms,
            started: tokio::time::Instant::now(),
            offset_ms: AtomicI64::new(0),
        }
    }

    /// Shift the clock forward without waiting.
    pub fn advance_ms(&self, ms: i64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        let elapsed = self.started.elapsed().as_millis() as i64;
        self.origin_ms + elapsed + self.offset_ms.load(Ordering::SeqCst)
    }
}
