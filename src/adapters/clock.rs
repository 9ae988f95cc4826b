//! Clock adapters.
//!
//! - [`SystemClock`] reads the host wall clock through `chrono`.
//! - [`ManualClock`] is set by hand, for simulation and tests.

use core::cell::Cell;

use chrono::{Local, NaiveTime, TimeDelta, Utc};

use crate::app::ports::ClockPort;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Host wall clock.  Epoch time from UTC, time of day in the local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Hand-driven clock.  Interior mutability lets a test advance time while
/// the same clock is borrowed by the code under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Cell<u64>,
    time_of_day: Cell<NaiveTime>,
}

impl ManualClock {
    /// Start at `now_ms` with the time of day at `hour:minute`.
    pub fn new(now_ms: u64, hour: u32, minute: u32) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
            time_of_day: Cell::new(
                NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
            ),
        }
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }

    /// Advance both the epoch time and the time of day (wrapping at
    /// midnight).
    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(delta_ms));
        let delta = TimeDelta::milliseconds((delta_ms % MS_PER_DAY) as i64);
        let (next, _) = self.time_of_day.get().overflowing_add_signed(delta);
        self.time_of_day.set(next);
    }

    pub fn set_time_of_day(&self, hour: u32, minute: u32) {
        if let Some(t) = NaiveTime::from_hms_opt(hour, minute, 0) {
            self.time_of_day.set(t);
        }
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.time_of_day.get()
    }
}
