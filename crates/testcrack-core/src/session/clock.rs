//! Session clock.
//!
//! Timestamps are monotonic milliseconds from an arbitrary origin. Phase
//! durations are always computed from two captured timestamps; the running
//! display value is cosmetic only.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A point on the clock, in milliseconds since the clock's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Whole seconds from `self` to `later`, floored. Zero if `later` is earlier.
    pub fn seconds_until(self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0) / 1000
    }
}

/// Source of timestamps for the session controller.
pub trait Clock {
    fn now(&self) -> Timestamp;

    /// Capture the start of a phase.
    fn start(&self) -> Timestamp {
        self.now()
    }

    /// Whole seconds elapsed since `since`, floored.
    fn elapsed_seconds(&self, since: Timestamp) -> u64 {
        since.seconds_until(self.now())
    }

    /// `m:ss` ticker for on-screen display.
    fn display_elapsed(&self, since: Timestamp) -> String {
        format_ticker(self.elapsed_seconds(since))
    }
}

/// Wall-clock monotonic time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let ms = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        Timestamp(ms)
    }
}

/// Clock that only moves when told to. Clones share the same time, so a
/// test can keep a handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.ms.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set(&self, at: Timestamp) {
        self.ms.store(at.0, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.ms.load(Ordering::SeqCst))
    }
}

/// `m:ss`, minutes unbounded.
pub fn format_ticker(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
