//! Fuzz target: telemetry push → interpret → view/alert state
//!
//! Feeds arbitrary bytes as a store value through the full inbound path.
//!
//! Invariants checked:
//! - No panics under any JSON document
//! - The retained cup list never changes length
//! - A confirmation alert is never cleared by a pushed snapshot
//!
//! cargo fuzz run fuzz_telemetry

#![no_main]

use libfuzzer_sys::fuzz_target;
use pillbox::alert::{AlertController, AlertTransition};
use pillbox::telemetry::{TelemetrySnapshot, ViewState, interpret};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Some(snapshot) = TelemetrySnapshot::from_store(&value) else {
        return;
    };

    let mut view = ViewState::new(5);
    let derived = interpret(&snapshot);
    view.apply(&derived);
    assert_eq!(view.cups.len(), 5);

    let mut alerts = AlertController::new();
    if let Some(state) = &derived.error_state {
        alerts.observe(state, view.last_active_cup);
        let sticky = alerts.active().is_some_and(|a| a.requires_confirmation);
        let again = alerts.observe(state, view.last_active_cup);
        if sticky {
            assert!(!matches!(again, Some(AlertTransition::Cleared(_))));
        }
    }
});
