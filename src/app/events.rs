//! Outbound dashboard events.
//!
//! The [`Dashboard`](super::service::Dashboard) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The presentation layer on
//! the other side decides how to render them.

use core::fmt;

use crate::alert::{ActiveAlert, ClearReason};
use crate::connection::ConnectionStatus;
use crate::schedule::{AlarmSchedule, NextAlarm, RefillStep};
use crate::telemetry::DerivedViewState;

/// Structured events emitted by the dashboard core.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Online/offline edge.  Never repeated for the same status.
    ConnectionChanged(ConnectionStatus),

    /// One interpreted telemetry push.  Absent fields mean "leave as is".
    Telemetry(DerivedViewState),

    /// First telemetry object arrived.  Fires once per session.
    LoadingFinished,

    AlertRaised(ActiveAlert),
    AlertCleared(ClearReason),

    /// The next-dose line changed.
    NextAlarmChanged(NextAlarm),

    /// Settings were (re)loaded from the store.
    SettingsLoaded(AlarmSchedule),
    SettingsSaved,

    /// Wire string of a dispatched command.
    CommandSent(String),

    /// Refill wizard opened with this loading plan.
    RefillStarted(Vec<RefillStep>),
    RefillCancelled,
    RefillCompleted,

    /// Blocking user-visible notice.
    Notice(UserNotice),
}

/// Notices the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNotice {
    SettingsSaved,
    SaveFailed(Option<String>),
    SendFailed(Option<String>),
    LoadFailed(Option<String>),
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingsSaved => f.write_str("Settings saved"),
            Self::SaveFailed(Some(msg)) => write!(f, "Save failed: {msg}"),
            Self::SaveFailed(None) => f.write_str("Save failed"),
            Self::SendFailed(Some(msg)) => write!(f, "Command failed: {msg}"),
            Self::SendFailed(None) => f.write_str("Command failed"),
            Self::LoadFailed(Some(msg)) => write!(f, "Could not load settings: {msg}"),
            Self::LoadFailed(None) => f.write_str("Could not load settings"),
        }
    }
}
