//! Settings save/load and next-alarm display.

use serde_json::json;

use pillbox::app::commands::{TargetCups, UserAction};
use pillbox::app::events::{DashboardEvent, UserNotice};
use pillbox::app::ports::StoreError;
use pillbox::error::{Error, ScheduleError};
use pillbox::schedule::{AlarmTime, NextAlarm};

use crate::mock_store::{StoreWrite, harness};

#[test]
fn save_then_reload_round_trips() {
    let mut h = harness();
    h.dash
        .save_settings(&mut h.store, &["08:00", "12:30"], TargetCups::Auto, &h.clock, &mut h.sink)
        .unwrap();

    let cfg = h.dash.config().clone();
    assert_eq!(
        h.store.writes,
        vec![StoreWrite::Update(vec![
            (cfg.alarms_path.clone(), json!("08:00,12:30")),
            (cfg.target_cups_path.clone(), json!(2)),
        ])]
    );
    let saved = h.dash.schedule().clone();

    let mut fresh = harness();
    fresh.store = std::mem::take(&mut h.store);
    fresh
        .dash
        .load_settings(&fresh.store, &fresh.clock, &mut fresh.sink)
        .unwrap();
    assert_eq!(fresh.dash.schedule(), &saved);
    assert_eq!(fresh.dash.schedule().target_cups(), 2);
    assert!(fresh.sink.events.contains(&DashboardEvent::SettingsLoaded(saved)));
}

#[test]
fn save_emits_notice_and_next_alarm() {
    let mut h = harness();
    h.dash
        .handle_action(
            UserAction::SaveSettings {
                alarm_slots: vec!["".into(), "20:00".into(), "08:00".into()],
                target_cups: TargetCups::Auto,
            },
            &mut h.store,
            &h.clock,
            &mut h.sink,
        )
        .unwrap();
    assert_eq!(h.sink.notices(), vec![UserNotice::SettingsSaved]);
    assert_eq!(
        h.dash.next_alarm(),
        Some(NextAlarm::Today(AlarmTime::new(20, 0).unwrap()))
    );
    assert_eq!(h.dash.schedule().alarms_str(), "20:00,08:00");
}

#[test]
fn manual_target_is_clamped_to_cup_count() {
    let mut h = harness();
    h.dash
        .save_settings(&mut h.store, &["08:00"], TargetCups::Manual(200), &h.clock, &mut h.sink)
        .unwrap();
    let path = h.dash.config().target_cups_path.clone();
    assert_eq!(h.store.value(&path), Some(&json!(5)));
}

#[test]
fn invalid_slot_writes_nothing() {
    let mut h = harness();
    let err = h
        .dash
        .save_settings(&mut h.store, &["08:00", "25:99"], TargetCups::Auto, &h.clock, &mut h.sink)
        .unwrap_err();
    assert_eq!(err, Error::Schedule(ScheduleError::InvalidTime("25:99".into())));
    assert!(h.store.writes.is_empty());
    assert!(matches!(
        h.sink.notices().as_slice(),
        [UserNotice::SaveFailed(Some(_))]
    ));
}

#[test]
fn rejected_save_keeps_cached_schedule() {
    let mut h = harness();
    h.dash
        .save_settings(&mut h.store, &["08:00"], TargetCups::Auto, &h.clock, &mut h.sink)
        .unwrap();
    h.store.fail_with = Some(StoreError::Rejected(Some("quota exceeded".into())));
    h.sink.clear();

    assert!(
        h.dash
            .save_settings(&mut h.store, &["09:00", "10:00"], TargetCups::Auto, &h.clock, &mut h.sink)
            .is_err()
    );
    assert_eq!(h.dash.schedule().alarms_str(), "08:00");
    let notices = h.sink.notices();
    assert_eq!(notices, vec![UserNotice::SaveFailed(Some("quota exceeded".into()))]);
    assert_eq!(notices[0].to_string(), "Save failed: quota exceeded");
}

#[test]
fn load_defaults_when_paths_empty() {
    let mut h = harness();
    h.dash
        .load_settings(&h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert!(h.dash.schedule().is_empty());
    assert_eq!(h.dash.schedule().target_cups(), 0);
    assert_eq!(h.dash.next_alarm(), Some(NextAlarm::NotSet));
    assert_eq!(h.dash.next_alarm().unwrap().to_string(), "no alarm set");
}

#[test]
fn load_failure_is_reported() {
    let mut h = harness();
    h.store.fail_reads_with = Some(StoreError::Disconnected);
    assert!(
        h.dash
            .load_settings(&h.store, &h.clock, &mut h.sink)
            .is_err()
    );
    assert_eq!(
        h.sink.notices(),
        vec![UserNotice::LoadFailed(Some("store disconnected".into()))]
    );
}

#[test]
fn refresh_emits_only_on_change() {
    let mut h = harness();
    let cfg = h.dash.config().clone();
    h.store.values.insert(cfg.alarms_path, json!("08:00,12:30"));
    h.dash
        .load_settings(&h.store, &h.clock, &mut h.sink)
        .unwrap();

    let next_events = |h: &crate::mock_store::Harness| {
        h.sink
            .count(|e| matches!(e, DashboardEvent::NextAlarmChanged(_)))
    };
    assert_eq!(next_events(&h), 1);

    h.dash.refresh_next_alarm(&h.clock, &mut h.sink);
    assert_eq!(next_events(&h), 1);

    h.clock.set_time_of_day(13, 0);
    h.dash.refresh_next_alarm(&h.clock, &mut h.sink);
    assert_eq!(next_events(&h), 2);
    assert_eq!(
        h.dash.next_alarm().map(|n| n.to_string()),
        Some("tomorrow 08:00".into())
    );
}
