//! Time sources for the drivers.

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Current exchange-local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Called with each event timestamp the driver consumes.
    /// Wall clocks ignore it; replay clocks follow it.
    fn observe(&self, _event_time: NaiveDateTime) {}
}

/// Wall clock shifted to the exchange's UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Create a clock for a fixed UTC offset in minutes (IST is 330).
    /// Out-of-range offsets fall back to UTC.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or(Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Manually driven clock for tests and replays.
///
/// Clones share the same instant. `observe` only ever moves time forward.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to `instant`, forwards or backwards.
    pub fn set(&self, instant: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observe(&self, event_time: NaiveDateTime) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if event_time > *now {
            *now = event_time;
        }
    }
}
