//! Telemetry, connection, alert and refill flows through the Dashboard.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use pillbox::adapters::clock::ManualClock;
use pillbox::alert::ClearReason;
use pillbox::app::commands::{TargetCups, UserAction};
use pillbox::app::events::{DashboardEvent, UserNotice};
use pillbox::app::ports::StoreError;
use pillbox::app::service::Dashboard;
use pillbox::config::DashboardConfig;
use pillbox::connection::ConnectionStatus;
use pillbox::error::{AlertError, Error, RefillError};
use pillbox::runtime::{self, Session, SessionInbox, SessionMsg};
use pillbox::telemetry::{CupState, ErrorState, HallIndicator};

use crate::mock_store::{MockStore, RecordingSink, harness};

fn is_conn(e: &DashboardEvent) -> bool {
    matches!(e, DashboardEvent::ConnectionChanged(_))
}

// ── Connection ────────────────────────────────────────────────

#[test]
fn offline_fires_once_after_threshold() {
    let mut h = harness();
    h.push(json!({ "last_seen": 1 }));
    h.push(json!({ "last_seen": 2 }));
    assert_eq!(h.sink.count(is_conn), 1, "repeat heartbeats must not re-fire");
    assert!(h.dash.is_online());

    for _ in 0..6 {
        h.clock.advance_ms(1_000);
        h.tick();
    }
    assert!(h.dash.is_online(), "exactly 6000 ms is still online");

    h.clock.advance_ms(1_000);
    h.tick();
    h.clock.advance_ms(1_000);
    h.tick();
    assert!(!h.dash.is_online());
    assert_eq!(h.sink.count(is_conn), 2);
    assert_eq!(
        h.sink.events.iter().filter(|e| is_conn(e)).last(),
        Some(&DashboardEvent::ConnectionChanged(ConnectionStatus::Offline))
    );

    h.push(json!({ "last_seen": 3 }));
    assert!(h.dash.is_online());
    assert_eq!(h.sink.count(is_conn), 3);
}

#[test]
fn push_without_last_seen_is_not_a_heartbeat() {
    let mut h = harness();
    h.push(json!({ "temp": 20, "last_seen": null }));
    assert!(!h.dash.is_online());
    assert_eq!(h.sink.count(is_conn), 0);
    assert!(!h.dash.is_loading());
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn loading_finishes_once() {
    let mut h = harness();
    assert!(h.dash.is_loading());
    h.push(json!({ "temp": 20 }));
    h.push(json!({ "temp": 21 }));
    assert_eq!(
        h.sink.count(|e| matches!(e, DashboardEvent::LoadingFinished)),
        1
    );
}

#[test]
fn absent_fields_keep_previous_values() {
    let mut h = harness();
    h.push(json!({
        "temp": 23.5,
        "cups": "1,0,1,0,0",
        "hall_sensor": true,
        "lid": { "count": 3, "target": 3, "is_match": true },
    }));
    h.push(json!({ "cups": "0,1" }));

    let view = h.dash.view();
    assert_eq!(view.temperature_label(), "23.5 \u{00b0}C");
    assert_eq!(
        view.cups,
        vec![
            Some(CupState::Inactive),
            Some(CupState::Active),
            Some(CupState::Active),
            Some(CupState::Inactive),
            Some(CupState::Inactive),
        ]
    );
    assert_eq!(view.hall, Some(HallIndicator::MagnetDetected));
    assert_eq!(view.lid.map(|l| l.count_label()), Some("3".to_string()));
}

#[test]
fn malformed_fields_are_dropped_not_fatal() {
    let mut h = harness();
    h.push(json!({ "temp": 20 }));
    h.push(json!({ "temp": "hot", "lid": 7, "cups": 5, "error_state": 12 }));
    assert_eq!(h.dash.view().temperature_c, Some(20.0));
    assert!(h.dash.view().lid.is_none());
    assert!(h.dash.active_alert().is_none());
}

// ── Alerts ────────────────────────────────────────────────────

#[test]
fn pusher_stuck_requires_confirm_and_sends_clear() {
    let mut h = harness();
    h.push(json!({ "last_seen": 1, "error_state": "pusher_stuck" }));
    assert!(h.dash.active_alert().unwrap().requires_confirmation);

    h.push(json!({ "last_seen": 2, "error_state": "none" }));
    assert!(h.dash.active_alert().is_some(), "none must not clear a confirmation alert");

    assert_eq!(
        h.dash.dismiss_alert(&mut h.sink),
        Err(Error::Alert(AlertError::ConfirmationRequired))
    );

    h.dash
        .confirm_alert(&mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert!(h.dash.active_alert().is_none());
    assert_eq!(h.commands(), vec!["CLEAR_PUSHER_ERROR,1000000".to_string()]);
    assert_eq!(
        h.sink.events.last(),
        Some(&DashboardEvent::AlertCleared(ClearReason::Confirmed))
    );
}

#[test]
fn lid_error_auto_clears() {
    let mut h = harness();
    h.push(json!({ "error_state": "lid_error" }));
    assert!(h.dash.active_alert().is_some());
    h.push(json!({ "error_state": "none" }));
    assert!(h.dash.active_alert().is_none());
    assert!(
        h.sink
            .events
            .contains(&DashboardEvent::AlertCleared(ClearReason::Resolved))
    );
    assert!(h.commands().is_empty());
}

#[test]
fn cup_not_taken_names_last_active_cup() {
    let mut h = harness();
    h.push(json!({ "error_state": "cup_not_taken", "last_active_cup": 4 }));
    let alert = h.dash.active_alert().unwrap();
    assert!(alert.message.contains("Cup 4"), "{}", alert.message);
    assert!(!alert.requires_confirmation);
}

#[test]
fn unknown_code_confirms_with_clear_error() {
    let mut h = harness();
    h.push(json!({ "error_state": "motor_overheat" }));
    let alert = h.dash.active_alert().unwrap();
    assert_eq!(alert.code, ErrorState::Unknown("motor_overheat".into()));
    assert_eq!(alert.message, "Device reported error: motor_overheat");

    h.dash
        .handle_action(UserAction::ConfirmAlert, &mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert_eq!(h.commands(), vec!["CLEAR_ERROR,1000000".to_string()]);
}

#[test]
fn failed_confirm_keeps_alert_and_notifies() {
    let mut h = harness();
    h.push(json!({ "error_state": "pusher_stuck" }));
    h.store.fail_with = Some(StoreError::Rejected(Some("PERMISSION_DENIED".into())));

    let err = h
        .dash
        .confirm_alert(&mut h.store, &h.clock, &mut h.sink)
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(h.dash.active_alert().is_some());
    assert_eq!(
        h.sink.notices(),
        vec![UserNotice::SendFailed(Some("PERMISSION_DENIED".into()))]
    );
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn stamps_are_monotonic_and_may_repeat() {
    let mut h = harness();
    h.dash
        .send_manual(&mut h.store, "MOTOR_STEP", &h.clock, &mut h.sink)
        .unwrap();
    h.dash
        .send_manual(&mut h.store, "MOTOR_STEP", &h.clock, &mut h.sink)
        .unwrap();
    h.clock.set_ms(999_000);
    h.dash
        .send_manual(&mut h.store, "BUZZ", &h.clock, &mut h.sink)
        .unwrap();
    assert_eq!(
        h.commands(),
        vec![
            "MOTOR_STEP,1000000".to_string(),
            "MOTOR_STEP,1000000".to_string(),
            "BUZZ,1000000".to_string(),
        ]
    );
    assert_eq!(
        h.sink
            .count(|e| matches!(e, DashboardEvent::CommandSent(_))),
        3
    );
}

#[test]
fn send_failure_without_reason_uses_generic_notice() {
    let mut h = harness();
    h.store.fail_with = Some(StoreError::Rejected(None));
    assert!(
        h.dash
            .send_manual(&mut h.store, "PLAY_MUSIC", &h.clock, &mut h.sink)
            .is_err()
    );
    let notices = h.sink.notices();
    assert_eq!(notices, vec![UserNotice::SendFailed(None)]);
    assert_eq!(notices[0].to_string(), "Command failed");
}

// ── Refill wizard ─────────────────────────────────────────────

#[test]
fn refill_enter_chime_then_finish() {
    let mut h = harness();
    h.dash
        .save_settings(&mut h.store, &["20:00", "08:00"], TargetCups::Auto, &h.clock, &mut h.sink)
        .unwrap();
    h.sink.clear();

    h.dash
        .begin_refill(&mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert!(h.dash.is_refill_open());
    let plan: Vec<(usize, String)> = h
        .dash
        .refill_plan()
        .iter()
        .map(|r| (r.cup_number(), r.time.to_string()))
        .collect();
    assert_eq!(plan, vec![(1, "08:00".into()), (2, "20:00".into())]);

    h.clock.advance_ms(30_000);
    h.dash
        .finish_refill(&mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert!(!h.dash.is_refill_open());
    assert_eq!(
        h.commands(),
        vec![
            "ENTER_REFILL,1000000".to_string(),
            "PLAY_MUSIC,1000000".to_string(),
            "EXIT_REFILL,1030000".to_string(),
        ]
    );
    assert_eq!(h.sink.events.last(), Some(&DashboardEvent::RefillCompleted));
}

#[test]
fn cancel_refill_sends_exit() {
    let mut h = harness();
    h.dash
        .handle_action(UserAction::BeginRefill, &mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    h.dash
        .handle_action(UserAction::CancelRefill, &mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert_eq!(h.commands().last().map(String::as_str), Some("EXIT_REFILL,1000000"));
    assert_eq!(h.sink.events.last(), Some(&DashboardEvent::RefillCancelled));
    assert_eq!(
        h.dash
            .cancel_refill(&mut h.store, &h.clock, &mut h.sink),
        Err(Error::Refill(RefillError::NotOpen))
    );
}

#[test]
fn refill_blocked_while_device_in_refill_mode() {
    let mut h = harness();
    h.push(json!({ "refill_mode": true }));
    assert_eq!(
        h.dash.begin_refill(&mut h.store, &h.clock, &mut h.sink),
        Err(Error::Refill(RefillError::DeviceInRefillMode))
    );
    assert!(h.commands().is_empty());
}

#[test]
fn refill_allowed_during_cup_not_taken() {
    let mut h = harness();
    h.push(json!({ "error_state": "cup_not_taken", "refill_mode": false }));
    assert!(
        h.dash
            .begin_refill(&mut h.store, &h.clock, &mut h.sink)
            .is_ok()
    );
}

#[test]
fn failed_enter_keeps_wizard_closed() {
    let mut h = harness();
    h.store.fail_with = Some(StoreError::Unavailable);
    assert!(
        h.dash
            .begin_refill(&mut h.store, &h.clock, &mut h.sink)
            .is_err()
    );
    assert!(!h.dash.is_refill_open());
    assert_eq!(
        h.sink.notices(),
        vec![UserNotice::SendFailed(Some("store unavailable".into()))]
    );
    assert_eq!(
        h.sink
            .count(|e| matches!(e, DashboardEvent::RefillStarted(_))),
        0
    );
}

#[test]
fn failed_chime_leaves_wizard_open() {
    let mut h = harness();
    h.store.fail_after = Some((1, StoreError::Rejected(Some("quota exceeded".into()))));

    let err = h
        .dash
        .begin_refill(&mut h.store, &h.clock, &mut h.sink)
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(h.dash.is_refill_open(), "device is already in refill mode");
    assert_eq!(h.commands(), vec!["ENTER_REFILL,1000000".to_string()]);
    assert_eq!(
        h.sink.notices(),
        vec![UserNotice::SendFailed(Some("quota exceeded".into()))]
    );
    assert_eq!(
        h.sink
            .count(|e| matches!(e, DashboardEvent::RefillStarted(_))),
        1
    );
}

#[test]
fn failed_exit_keeps_wizard_open_for_retry() {
    let mut h = harness();
    h.dash
        .begin_refill(&mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    h.store.fail_after = Some((2, StoreError::Unavailable));

    assert_eq!(
        h.dash
            .finish_refill(&mut h.store, &h.clock, &mut h.sink),
        Err(Error::Store(StoreError::Unavailable))
    );
    assert!(h.dash.is_refill_open());
    assert_eq!(
        h.sink
            .count(|e| matches!(e, DashboardEvent::RefillCompleted)),
        0
    );

    h.store.fail_after = None;
    h.clock.advance_ms(5_000);
    h.dash
        .finish_refill(&mut h.store, &h.clock, &mut h.sink)
        .unwrap();
    assert!(!h.dash.is_refill_open());
    assert_eq!(h.commands().last().map(String::as_str), Some("EXIT_REFILL,1005000"));
    assert_eq!(h.sink.events.last(), Some(&DashboardEvent::RefillCompleted));
}

// ── Session loop ──────────────────────────────────────────────

#[test]
fn failed_subscription_stays_loading() {
    let mut store = MockStore::new();
    store.fail_subscribe_with = Some(StoreError::Rejected(Some("PERMISSION_DENIED".into())));
    let session = Rc::new(RefCell::new(Session::new(
        Dashboard::new(DashboardConfig::default()),
        store,
        ManualClock::new(1_000_000, 9, 0),
        RecordingSink::new(),
    )));
    let inbox = Rc::new(SessionInbox::new());
    inbox.try_send(SessionMsg::Shutdown).unwrap();

    runtime::run(&session, &inbox, core::future::pending());

    let s = session.borrow();
    assert!(s.dashboard.is_loading());
    assert!(!s.dashboard.is_online());
    assert_eq!(
        s.sink
            .count(|e| matches!(e, DashboardEvent::LoadingFinished)),
        0
    );
    assert_eq!(
        s.sink
            .count(|e| matches!(e, DashboardEvent::SettingsLoaded(_))),
        1
    );
}
