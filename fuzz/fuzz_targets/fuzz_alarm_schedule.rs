//! Fuzz target: stored `alarms_str` parsing and next-alarm selection
//!
//! Invariants checked:
//! - No panics on any string
//! - At most five alarms survive parsing
//! - The next alarm, if any, is one of the parsed alarms
//!
//! cargo fuzz run fuzz_alarm_schedule

#![no_main]

use chrono::NaiveTime;
use libfuzzer_sys::fuzz_target;
use pillbox::schedule::{AlarmSchedule, NextAlarm};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (clock, raw) = data.split_at(2);
    let now = NaiveTime::from_hms_opt(u32::from(clock[0] % 24), u32::from(clock[1] % 60), 0)
        .unwrap_or(NaiveTime::MIN);
    let Ok(text) = core::str::from_utf8(raw) else {
        return;
    };

    let schedule = AlarmSchedule::from_store(Some(&serde_json::Value::from(text)), None);
    assert!(schedule.times().len() <= 5);

    match schedule.next_alarm(now) {
        NextAlarm::Today(t) | NextAlarm::Tomorrow(t) => assert!(schedule.times().contains(&t)),
        NextAlarm::NotSet => assert!(schedule.is_empty()),
    }
});
