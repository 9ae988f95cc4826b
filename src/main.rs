//! Pillbox dashboard simulator.
//!
//! Wires the dashboard core to an in-memory store, a wall clock and a
//! log-based presentation layer, then plays a scripted device session
//! against it:
//!
//! ```text
//!   scripted device ──writes──▶ SharedStore ──push──▶ inbox ──▶ Dashboard
//!         │                                                       │
//!         └──────────── user actions ──▶ inbox          LogEventSink ◀┘
//! ```
//!
//! Set `PILLBOX_CONFIG` to a JSON file to override [`DashboardConfig`]
//! defaults; `RUST_LOG` controls verbosity.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::{Value, json};

use pillbox::adapters::clock::SystemClock;
use pillbox::adapters::log_sink::LogEventSink;
use pillbox::adapters::memory_store::SharedStore;
use pillbox::app::commands::{TargetCups, UserAction};
use pillbox::app::ports::StorePort;
use pillbox::app::service::Dashboard;
use pillbox::config::DashboardConfig;
use pillbox::runtime::{self, Session, SessionInbox, SessionMsg};

const CONFIG_ENV: &str = "PILLBOX_CONFIG";

fn load_config() -> Result<DashboardConfig> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        info!("{} not set, using default configuration", CONFIG_ENV);
        return Ok(DashboardConfig::default());
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = DashboardConfig::from_json(&raw).with_context(|| format!("parsing {path}"))?;
    info!("Configuration loaded from {}", path);
    Ok(config)
}

// ── Scripted device ───────────────────────────────────────────

/// One step of the simulated session.
enum Step {
    /// Telemetry written by the device.
    Publish(Value),
    /// Something the user clicks.
    User(UserAction),
    /// Let the clock run without any device activity.
    Silence(Duration),
}

fn script() -> Vec<Step> {
    let now = || chrono::Utc::now().timestamp_millis();
    vec![
        Step::Publish(json!({
            "last_seen": now(),
            "temp": 22.5,
            "cups": "1,1,0,0,0",
            "hall_sensor": true,
            "lid": { "count": 2, "target": 2, "is_match": true },
            "refill_mode": false,
            "error_state": "none",
        })),
        Step::User(UserAction::SaveSettings {
            alarm_slots: vec!["08:00".into(), "12:30".into(), "".into(), "20:00".into(), "".into()],
            target_cups: TargetCups::Auto,
        }),
        Step::Publish(json!({ "last_seen": now(), "error_state": "pusher_stuck" })),
        Step::Publish(json!({ "last_seen": now(), "error_state": "none" })),
        Step::User(UserAction::ConfirmAlert),
        Step::User(UserAction::BeginRefill),
        Step::Publish(json!({ "last_seen": now(), "refill_mode": true, "cups": "0,0,0,0,0" })),
        Step::User(UserAction::FinishRefill),
        Step::Publish(json!({
            "last_seen": now(),
            "refill_mode": false,
            "cups": "1,1,1,0,0",
            "error_state": "refill_cups_left",
        })),
        Step::User(UserAction::DismissAlert),
        Step::Silence(Duration::from_secs(8)),
    ]
}

async fn simulated_device(mut store: SharedStore, monitor_path: String, inbox: Rc<SessionInbox>) {
    let pause = Duration::from_millis(1500);
    for step in script() {
        match step {
            Step::Publish(value) => {
                if let Err(e) = store.set(&monitor_path, value) {
                    warn!("SIM | device publish failed: {}", e);
                }
            }
            Step::User(action) => {
                info!("SIM | user: {:?}", action);
                if inbox.try_send(SessionMsg::Action(action)).is_err() {
                    warn!("SIM | inbox full, action dropped");
                }
            }
            Step::Silence(d) => {
                info!("SIM | device goes quiet for {:?}", d);
                async_io_mini::Timer::after(d).await;
            }
        }
        async_io_mini::Timer::after(pause).await;
    }
    if inbox.try_send(SessionMsg::Shutdown).is_err() {
        warn!("SIM | inbox full, shutdown dropped");
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Pillbox dashboard simulator v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let store = SharedStore::new();
    let inbox = Rc::new(SessionInbox::new());
    let device = simulated_device(store.clone(), config.monitor_path.clone(), Rc::clone(&inbox));
    let session = Rc::new(RefCell::new(Session::new(
        Dashboard::new(config),
        store,
        SystemClock,
        LogEventSink::new(),
    )));

    runtime::run(&session, &inbox, device);

    let s = session.borrow();
    info!(
        "Final state: {} | alarms='{}' | next={}",
        s.dashboard.connection_status().label(),
        s.dashboard.schedule().alarms_str(),
        s.dashboard
            .next_alarm()
            .map_or_else(|| "-".to_string(), |n| n.to_string()),
    );
    Ok(())
}
