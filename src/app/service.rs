//! Dashboard service: the hexagonal core.
//!
//! [`Dashboard`] owns every piece of session state: connection status,
//! retained view, active alert, cached schedule, refill wizard.  All I/O
//! flows through port traits injected at call sites, so the whole service
//! runs against mock adapters.
//!
//! ```text
//!  StorePort (push) ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                       │          Dashboard            │
//!  StorePort (write) ◀──│ Connection · Telemetry ·      │
//!                       │ Alert · Schedule · Refill     │
//!  ClockPort ─────────▶ └──────────────────────────────┘
//! ```

use log::{debug, info, warn};
use serde_json::Value;

use crate::alert::{AlertController, AlertTransition, ActiveAlert, ClearReason};
use crate::config::DashboardConfig;
use crate::connection::{ConnectionMonitor, ConnectionStatus};
use crate::error::{Error, Result};
use crate::refill::{CLOSE_COMMAND, OPEN_SEQUENCE, RefillWizard};
use crate::schedule::{AlarmSchedule, NextAlarm, RefillStep};
use crate::telemetry::{TelemetrySnapshot, ViewState, interpret};

use super::commands::{DeviceCommand, TargetCups, UserAction};
use super::events::{DashboardEvent, UserNotice};
use super::ports::{ClockPort, EventSink, StorePort, StoreValue};

// ───────────────────────────────────────────────────────────────
// Dashboard
// ───────────────────────────────────────────────────────────────

/// One dashboard session.
pub struct Dashboard {
    config: DashboardConfig,
    connection: ConnectionMonitor,
    view: ViewState,
    alerts: AlertController,
    schedule: AlarmSchedule,
    /// Last next-alarm value handed to the sink.
    next_alarm: Option<NextAlarm>,
    refill: RefillWizard,
    loading: bool,
    /// Highest command stamp used so far.
    last_stamp_ms: u64,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            connection: ConnectionMonitor::new(config.heartbeat_timeout_ms),
            view: ViewState::new(config.cup_count),
            alerts: AlertController::new(),
            schedule: AlarmSchedule::default(),
            next_alarm: None,
            refill: RefillWizard::default(),
            loading: true,
            last_stamp_ms: 0,
            config,
        }
    }

    // ── Store pushes ──────────────────────────────────────────

    /// Handle one telemetry push from the monitor path.
    ///
    /// An empty path or a non-object value keeps the session loading and
    /// changes nothing else.
    pub fn on_store_push(
        &mut self,
        value: Option<StoreValue>,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let Some(snapshot) = value.as_ref().and_then(TelemetrySnapshot::from_store) else {
            debug!("Telemetry push without data, still loading={}", self.loading);
            return;
        };

        if self.loading {
            self.loading = false;
            info!("First telemetry snapshot received");
            sink.emit(&DashboardEvent::LoadingFinished);
        }

        if snapshot.has_heartbeat() {
            if let Some(status) = self.connection.on_heartbeat(clock.now_ms()) {
                sink.emit(&DashboardEvent::ConnectionChanged(status));
            }
        }

        let derived = interpret(&snapshot);
        self.view.apply(&derived);
        let error_state = derived.error_state.clone();
        sink.emit(&DashboardEvent::Telemetry(derived));

        if let Some(state) = error_state {
            match self.alerts.observe(&state, self.view.last_active_cup) {
                Some(AlertTransition::Raised(alert)) => {
                    sink.emit(&DashboardEvent::AlertRaised(alert));
                }
                Some(AlertTransition::Cleared(reason)) => {
                    sink.emit(&DashboardEvent::AlertCleared(reason));
                }
                None => {}
            }
        }
    }

    // ── Timers ────────────────────────────────────────────────

    /// Staleness check, driven on the heartbeat check cadence.
    pub fn heartbeat_tick(&mut self, clock: &impl ClockPort, sink: &mut impl EventSink) {
        if let Some(status) = self.connection.tick(clock.now_ms()) {
            sink.emit(&DashboardEvent::ConnectionChanged(status));
        }
    }

    /// Recompute the next-dose line.  Emits only when it changed.
    pub fn refresh_next_alarm(&mut self, clock: &impl ClockPort, sink: &mut impl EventSink) {
        let next = self.schedule.next_alarm(clock.time_of_day());
        if self.next_alarm != Some(next) {
            debug!("Next alarm: {}", next);
            self.next_alarm = Some(next);
            sink.emit(&DashboardEvent::NextAlarmChanged(next));
        }
    }

    // ── Settings ──────────────────────────────────────────────

    /// One-shot read of the stored schedule and target cups.
    pub fn load_settings(
        &mut self,
        store: &impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let read = store
            .read_once(&self.config.alarms_path)
            .and_then(|alarms| Ok((alarms, store.read_once(&self.config.target_cups_path)?)));
        let (alarms, target) = match read {
            Ok(values) => values,
            Err(e) => {
                warn!("Settings load failed: {}", e);
                let reason = e.reason().map(str::to_owned);
                sink.emit(&DashboardEvent::Notice(UserNotice::LoadFailed(reason)));
                return Err(e.into());
            }
        };

        self.schedule = AlarmSchedule::from_store(alarms.as_ref(), target.as_ref());
        info!(
            "Settings loaded: alarms='{}' target_cups={}",
            self.schedule.alarms_str(),
            self.schedule.target_cups()
        );
        if self.schedule.target_diverges() {
            warn!(
                "Stored target_cups={} differs from {} alarm(s)",
                self.schedule.target_cups(),
                self.schedule.derived_target_cups()
            );
        }
        sink.emit(&DashboardEvent::SettingsLoaded(self.schedule.clone()));
        self.refresh_next_alarm(clock, sink);
        Ok(())
    }

    /// Validate and persist the settings form in one multi-path update.
    /// The cached schedule changes only once the write was accepted.
    pub fn save_settings<S: AsRef<str>>(
        &mut self,
        store: &mut impl StorePort,
        alarm_slots: &[S],
        target_cups: TargetCups,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let schedule = match AlarmSchedule::from_slots(
            alarm_slots,
            self.config.max_alarm_slots,
            target_cups,
            self.config.cup_count,
        ) {
            Ok(s) => s,
            Err(e) => {
                warn!("Settings rejected: {}", e);
                sink.emit(&DashboardEvent::Notice(UserNotice::SaveFailed(Some(e.to_string()))));
                return Err(e.into());
            }
        };

        let updates = [
            (
                self.config.alarms_path.as_str(),
                Value::String(schedule.alarms_str()),
            ),
            (
                self.config.target_cups_path.as_str(),
                Value::from(schedule.target_cups()),
            ),
        ];
        if let Err(e) = store.update(&updates) {
            warn!("Settings save failed: {}", e);
            let reason = e.reason().map(str::to_owned);
            sink.emit(&DashboardEvent::Notice(UserNotice::SaveFailed(reason)));
            return Err(e.into());
        }

        info!(
            "Settings saved: alarms='{}' target_cups={}",
            schedule.alarms_str(),
            schedule.target_cups()
        );
        self.schedule = schedule;
        sink.emit(&DashboardEvent::SettingsSaved);
        sink.emit(&DashboardEvent::Notice(UserNotice::SettingsSaved));
        self.refresh_next_alarm(clock, sink);
        Ok(())
    }

    // ── Alerts ────────────────────────────────────────────────

    pub fn dismiss_alert(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.alerts.dismiss()?;
        info!("Alert dismissed by user");
        sink.emit(&DashboardEvent::AlertCleared(ClearReason::Dismissed));
        Ok(())
    }

    /// Send the alert's clear command, then clear it.  A failed send
    /// leaves the alert showing.
    pub fn confirm_alert(
        &mut self,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let command = self.alerts.pending_confirm_command()?;
        self.send_command(store, command, clock, sink)?;
        self.alerts.confirm()?;
        sink.emit(&DashboardEvent::AlertCleared(ClearReason::Confirmed));
        Ok(())
    }

    // ── Refill wizard ─────────────────────────────────────────

    /// Open the wizard: `ENTER_REFILL`, then `PLAY_MUSIC`.
    ///
    /// A failed `ENTER_REFILL` leaves the wizard closed.  A failed chime
    /// leaves it open (the device is already in refill mode) and returns
    /// the send error.
    pub fn begin_refill(
        &mut self,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.refill.can_open(self.view.refill_mode)?;
        let [enter, chime] = OPEN_SEQUENCE;
        self.send_command(store, enter, clock, sink)?;

        let plan = self.refill.open(&self.schedule).to_vec();
        info!("Refill wizard opened with {} cup(s)", plan.len());
        sink.emit(&DashboardEvent::RefillStarted(plan));

        self.send_command(store, chime, clock, sink)
    }

    pub fn cancel_refill(
        &mut self,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.close_refill(store, clock, sink)?;
        info!("Refill cancelled");
        sink.emit(&DashboardEvent::RefillCancelled);
        Ok(())
    }

    pub fn finish_refill(
        &mut self,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.close_refill(store, clock, sink)?;
        info!("Refill completed");
        sink.emit(&DashboardEvent::RefillCompleted);
        Ok(())
    }

    fn close_refill(
        &mut self,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<Vec<RefillStep>> {
        self.refill.ensure_open()?;
        self.send_command(store, CLOSE_COMMAND, clock, sink)?;
        Ok(self.refill.close()?)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Stamp and write one command.  Stamps never go backwards within a
    /// session; two sends in the same millisecond share a stamp.
    pub fn send_command(
        &mut self,
        store: &mut impl StorePort,
        command: DeviceCommand,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let stamp = clock.now_ms().max(self.last_stamp_ms);
        self.last_stamp_ms = stamp;
        let wire = command.compose(stamp);

        match store.set(&self.config.command_path, Value::String(wire.clone())) {
            Ok(()) => {
                info!("Command sent: {}", wire);
                sink.emit(&DashboardEvent::CommandSent(wire));
                Ok(())
            }
            Err(e) => {
                warn!("Command {} failed: {}", command, e);
                let reason = e.reason().map(str::to_owned);
                sink.emit(&DashboardEvent::Notice(UserNotice::SendFailed(reason)));
                Err(Error::Store(e))
            }
        }
    }

    /// Manual-control page command, passed through verbatim.
    pub fn send_manual(
        &mut self,
        store: &mut impl StorePort,
        raw: &str,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.send_command(store, DeviceCommand::Manual(raw.trim().to_string()), clock, sink)
    }

    /// Dispatch a presentation-layer action.
    pub fn handle_action(
        &mut self,
        action: UserAction,
        store: &mut impl StorePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match action {
            UserAction::SaveSettings {
                alarm_slots,
                target_cups,
            } => self.save_settings(store, &alarm_slots, target_cups, clock, sink),
            UserAction::ReloadSettings => self.load_settings(store, clock, sink),
            UserAction::DismissAlert => self.dismiss_alert(sink),
            UserAction::ConfirmAlert => self.confirm_alert(store, clock, sink),
            UserAction::BeginRefill => self.begin_refill(store, clock, sink),
            UserAction::CancelRefill => self.cancel_refill(store, clock, sink),
            UserAction::FinishRefill => self.finish_refill(store, clock, sink),
            UserAction::Manual(raw) => self.send_manual(store, &raw, clock, sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn is_online(&self) -> bool {
        self.connection.is_online()
    }

    /// True until the first telemetry object arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn active_alert(&self) -> Option<&ActiveAlert> {
        self.alerts.active()
    }

    pub fn schedule(&self) -> &AlarmSchedule {
        &self.schedule
    }

    /// Last computed next alarm; `None` before the first refresh.
    pub fn next_alarm(&self) -> Option<NextAlarm> {
        self.next_alarm
    }

    pub fn is_refill_open(&self) -> bool {
        self.refill.is_open()
    }

    pub fn refill_plan(&self) -> &[RefillStep] {
        self.refill.plan()
    }

    pub fn last_command_stamp(&self) -> u64 {
        self.last_stamp_ms
    }
}
