//! Dashboard configuration parameters
//!
//! All tunable parameters for a dashboard session: where the device
//! publishes in the hosted store, and the timing constants that drive
//! connection detection and the next-dose display.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hard ceiling on alarm slots; the device firmware only holds five.
pub const MAX_ALARM_SLOTS: usize = 5;

/// Core dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    // --- Store key paths ---
    /// Telemetry snapshot path (subscribed)
    pub monitor_path: String,
    /// Command path (single scalar `"<NAME>,<epoch_ms>"`)
    pub command_path: String,
    /// Comma-joined `HH:MM` alarm list
    pub alarms_path: String,
    /// Integer target cup count
    pub target_cups_path: String,

    // --- Connection ---
    /// Heartbeat staleness threshold (milliseconds)
    pub heartbeat_timeout_ms: u64,
    /// Staleness check cadence (milliseconds)
    pub heartbeat_check_interval_ms: u64,

    // --- Schedule ---
    /// Next-alarm display refresh cadence (seconds)
    pub alarm_refresh_interval_secs: u64,
    /// Number of alarm slots offered by the settings form
    pub max_alarm_slots: usize,

    // --- Device ---
    /// Number of cups on the device carousel
    pub cup_count: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            monitor_path: "/pillbox/monitor".into(),
            command_path: "/pillbox/command".into(),
            alarms_path: "/pillbox/config/alarms_str".into(),
            target_cups_path: "/pillbox/config/target_cups".into(),

            heartbeat_timeout_ms: 6000,
            heartbeat_check_interval_ms: 1000,

            alarm_refresh_interval_secs: 60,
            max_alarm_slots: MAX_ALARM_SLOTS,

            cup_count: 5,
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON config document; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|_| Error::Config("config is not valid JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<()> {
        for path in [
            &self.monitor_path,
            &self.command_path,
            &self.alarms_path,
            &self.target_cups_path,
        ] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(Error::Config("store paths must be absolute and non-empty"));
            }
        }
        if self.heartbeat_timeout_ms == 0 {
            return Err(Error::Config("heartbeat_timeout_ms must be > 0"));
        }
        if self.heartbeat_check_interval_ms == 0
            || self.heartbeat_check_interval_ms >= self.heartbeat_timeout_ms
        {
            return Err(Error::Config(
                "heartbeat_check_interval_ms must be > 0 and below heartbeat_timeout_ms",
            ));
        }
        if self.alarm_refresh_interval_secs == 0 {
            return Err(Error::Config("alarm_refresh_interval_secs must be > 0"));
        }
        if !(1..=MAX_ALARM_SLOTS).contains(&self.max_alarm_slots) {
            return Err(Error::Config("max_alarm_slots must be 1-5"));
        }
        if !(1..=16).contains(&self.cup_count) {
            return Err(Error::Config("cup_count must be 1-16"));
        }
        Ok(())
    }
}
