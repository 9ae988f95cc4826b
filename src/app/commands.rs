//! Outbound device commands and inbound user actions.
//!
//! [`DeviceCommand`] is what the dashboard writes to the command path.
//! [`UserAction`] is what the presentation layer asks the
//! [`Dashboard`](super::service::Dashboard) to do.

use core::fmt;

/// Separator between command name and stamp on the wire.
const STAMP_SEPARATOR: char = ',';

/// Commands the Command Sink understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    EnterRefill,
    ExitRefill,
    PlayMusic,
    ClearError,
    ClearPusherError,
    /// Device-specific manual control, passed through verbatim.
    Manual(String),
}

impl DeviceCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::EnterRefill => "ENTER_REFILL",
            Self::ExitRefill => "EXIT_REFILL",
            Self::PlayMusic => "PLAY_MUSIC",
            Self::ClearError => "CLEAR_ERROR",
            Self::ClearPusherError => "CLEAR_PUSHER_ERROR",
            Self::Manual(raw) => raw,
        }
    }

    /// Wire form: `"<NAME>,<epoch_ms>"`.  The stamp lets the device drop
    /// repeated values.
    pub fn compose(&self, stamp_ms: u64) -> String {
        format!("{}{}{}", self.name(), STAMP_SEPARATOR, stamp_ms)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target-cups handling on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCups {
    /// Count the non-empty alarm slots.
    Auto,
    /// Explicit value from the settings form (clamped to the cup count).
    Manual(u8),
}

/// Actions requested by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Persist the settings form.  `alarm_slots` holds the raw slot
    /// values; empty slots are skipped.
    SaveSettings {
        alarm_slots: Vec<String>,
        target_cups: TargetCups,
    },
    /// Re-read settings from the store.
    ReloadSettings,
    DismissAlert,
    ConfirmAlert,
    BeginRefill,
    CancelRefill,
    FinishRefill,
    /// Manual-control page command.
    Manual(String),
}
