//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every dashboard event as one log
//! line.  The simulator uses it as its presentation layer; a UI adapter
//! would implement the same trait.

use log::{info, warn};

use crate::app::events::{DashboardEvent, UserNotice};
use crate::app::ports::EventSink;

/// Adapter that logs every [`DashboardEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DashboardEvent) {
        match event {
            DashboardEvent::ConnectionChanged(status) => {
                info!("CONN | {}", status.label());
            }
            DashboardEvent::Telemetry(t) => {
                let cups: String = t.cups.as_ref().map_or_else(
                    || "-".into(),
                    |cups| cups.iter().map(|c| if c.is_active() { '1' } else { '0' }).collect(),
                );
                info!(
                    "TELEM | hb={} | T={:?} | cups={} | hall={} | lid={} | refill={:?} | err={}",
                    t.heartbeat,
                    t.temperature_c,
                    cups,
                    t.hall.map_or("-", |h| h.label()),
                    t.lid.map_or_else(
                        || "-".into(),
                        |l| format!("{}/{} {}", l.count_label(), l.target_label(), l.matched.label())
                    ),
                    t.refill_banner,
                    t.error_state.as_ref().map_or("-", |e| e.as_wire()),
                );
            }
            DashboardEvent::LoadingFinished => info!("LOAD | first snapshot"),
            DashboardEvent::AlertRaised(alert) => {
                info!(
                    "ALERT | raised '{}' confirm={} | {}",
                    alert.code.as_wire(),
                    alert.requires_confirmation,
                    alert.message
                );
            }
            DashboardEvent::AlertCleared(reason) => info!("ALERT | cleared ({:?})", reason),
            DashboardEvent::NextAlarmChanged(next) => info!("ALARM | next {}", next),
            DashboardEvent::SettingsLoaded(s) => {
                info!("CFG | loaded alarms='{}' target={}", s.alarms_str(), s.target_cups());
            }
            DashboardEvent::SettingsSaved => info!("CFG | saved"),
            DashboardEvent::CommandSent(wire) => info!("CMD | {}", wire),
            DashboardEvent::RefillStarted(plan) => {
                let rows: Vec<String> = plan
                    .iter()
                    .map(|r| format!("cup {} @ {}", r.cup_number(), r.time))
                    .collect();
                info!("REFILL | started [{}]", rows.join(", "));
            }
            DashboardEvent::RefillCancelled => info!("REFILL | cancelled"),
            DashboardEvent::RefillCompleted => info!("REFILL | completed"),
            DashboardEvent::Notice(notice @ UserNotice::SettingsSaved) => {
                info!("NOTICE | {}", notice);
            }
            DashboardEvent::Notice(notice) => warn!("NOTICE | {}", notice),
        }
    }
}
