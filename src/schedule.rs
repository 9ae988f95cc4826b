//! Alarm schedule and next-dose computation.
//!
//! The device stores up to five daily alarm times as a comma-joined
//! `HH:MM` list (`alarms_str`) plus a `target_cups` count.  The dashboard
//! keeps a cached copy, derives the "next dose" line from it, and builds
//! the cup-by-cup plan shown by the refill wizard.
//!
//! ```text
//!   "08:00,12:30,20:00"  ──parse──▶  [480, 750, 1200] minutes
//!                                        │ sort, first > now
//!                                        ▼
//!                       "12:30"  or  "tomorrow 08:00"  or  "no alarm set"
//! ```

use core::fmt;

use chrono::{NaiveTime, Timelike};
use log::warn;
use serde_json::Value;

use crate::app::commands::TargetCups;
use crate::app::ports::StoreValue;
use crate::config::MAX_ALARM_SLOTS;
use crate::error::ScheduleError;

const ALARM_SEPARATOR: &str = ",";

// ═══════════════════════════════════════════════════════════════
//  Alarm time
// ═══════════════════════════════════════════════════════════════

/// A 24-hour time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse `HH:MM` (surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(Self::from)
            .map_err(|_| ScheduleError::InvalidTime(trimmed.to_string()))
    }

    pub fn minutes_since_midnight(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl From<NaiveTime> for AlarmTime {
    fn from(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Next alarm
// ═══════════════════════════════════════════════════════════════

/// Result of the next-dose computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAlarm {
    Today(AlarmTime),
    /// Every alarm today has passed; wraps to the earliest one.
    Tomorrow(AlarmTime),
    NotSet,
}

impl fmt::Display for NextAlarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today(t) => write!(f, "{t}"),
            Self::Tomorrow(t) => write!(f, "tomorrow {t}"),
            Self::NotSet => write!(f, "no alarm set"),
        }
    }
}

/// First alarm strictly after `now`, wrapping to the earliest alarm
/// tomorrow.
pub fn next_alarm_after(times: &[AlarmTime], now: NaiveTime) -> NextAlarm {
    let now_min = AlarmTime::from(now).minutes_since_midnight();
    let mut sorted: Vec<AlarmTime> = times.to_vec();
    sorted.sort_unstable();

    match sorted.iter().find(|t| t.minutes_since_midnight() > now_min) {
        Some(t) => NextAlarm::Today(*t),
        None => sorted.first().map_or(NextAlarm::NotSet, |t| NextAlarm::Tomorrow(*t)),
    }
}

/// Same as [`next_alarm_after`] over raw `HH:MM` strings.  Unparsable
/// entries are skipped.
pub fn next_alarm<S: AsRef<str>>(entries: &[S], now: NaiveTime) -> NextAlarm {
    let times: Vec<AlarmTime> = entries
        .iter()
        .filter_map(|e| AlarmTime::parse(e.as_ref()).ok())
        .collect();
    next_alarm_after(&times, now)
}

// ═══════════════════════════════════════════════════════════════
//  Schedule
// ═══════════════════════════════════════════════════════════════

/// One row of the refill wizard: which cup gets loaded for which dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillStep {
    /// Zero-based cup index.
    pub cup: usize,
    pub time: AlarmTime,
}

impl RefillStep {
    /// One-based number printed on the device.
    pub fn cup_number(&self) -> usize {
        self.cup + 1
    }
}

/// Cached alarm configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmSchedule {
    /// Slot order as persisted (not sorted).
    times: heapless::Vec<AlarmTime, MAX_ALARM_SLOTS>,
    /// Persisted target; may diverge from `times.len()` if another
    /// client wrote it.
    target_cups: u8,
}

impl AlarmSchedule {
    /// Build from the settings form.  Empty slots are skipped; any other
    /// slot must be a valid `HH:MM`.
    pub fn from_slots<S: AsRef<str>>(
        slots: &[S],
        max_slots: usize,
        target: TargetCups,
        cup_count: usize,
    ) -> Result<Self, ScheduleError> {
        let max = max_slots.min(MAX_ALARM_SLOTS);
        let mut times = heapless::Vec::new();
        for raw in slots.iter().map(AsRef::as_ref) {
            if raw.trim().is_empty() {
                continue;
            }
            let t = AlarmTime::parse(raw)?;
            if times.len() >= max || times.push(t).is_err() {
                return Err(ScheduleError::TooManyAlarms { max });
            }
        }
        let target_cups = match target {
            TargetCups::Auto => times.len() as u8,
            TargetCups::Manual(n) => n.min(cup_count.min(usize::from(u8::MAX)) as u8),
        };
        Ok(Self { times, target_cups })
    }

    /// Build from the two stored config values.  Tolerant: a missing
    /// list is empty, a missing target is 0, bad tokens are skipped.
    pub fn from_store(alarms: Option<&StoreValue>, target_cups: Option<&StoreValue>) -> Self {
        let mut times = heapless::Vec::new();
        if let Some(Value::String(raw)) = alarms {
            for token in raw.split(ALARM_SEPARATOR).filter(|t| !t.trim().is_empty()) {
                match AlarmTime::parse(token) {
                    Ok(t) => {
                        if times.push(t).is_err() {
                            warn!("Schedule: more than {} stored alarms, ignoring the rest", MAX_ALARM_SLOTS);
                            break;
                        }
                    }
                    Err(e) => warn!("Schedule: skipping stored alarm: {}", e),
                }
            }
        } else if let Some(other) = alarms.filter(|v| !v.is_null()) {
            warn!("Schedule: stored alarms_str is not a string: {}", other);
        }

        let target_cups = target_cups
            .and_then(Value::as_u64)
            .map_or(0, |n| n.min(u64::from(u8::MAX)) as u8);

        Self { times, target_cups }
    }

    /// Wire form of the alarm list (`"08:00,12:30"`), slot order kept.
    pub fn alarms_str(&self) -> String {
        self.times
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(ALARM_SEPARATOR)
    }

    pub fn times(&self) -> &[AlarmTime] {
        &self.times
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn target_cups(&self) -> u8 {
        self.target_cups
    }

    /// Count of non-empty slots (the auto-derived target).
    pub fn derived_target_cups(&self) -> u8 {
        self.times.len() as u8
    }

    /// Whether the stored target disagrees with the alarm count.
    pub fn target_diverges(&self) -> bool {
        self.target_cups != self.derived_target_cups()
    }

    pub fn next_alarm(&self, now: NaiveTime) -> NextAlarm {
        next_alarm_after(&self.times, now)
    }

    /// Cups in loading order: cup `i` holds the `i`-th earliest dose.
    pub fn refill_plan(&self) -> Vec<RefillStep> {
        let mut sorted: Vec<AlarmTime> = self.times.to_vec();
        sorted.sort_unstable();
        sorted
            .into_iter()
            .enumerate()
            .map(|(cup, time)| RefillStep { cup, time })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
