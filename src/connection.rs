//! Connection monitor.
//!
//! Derives the device's online/offline status from heartbeat recency.
//! The device writes `last_seen` into every telemetry push; the mere
//! presence of that field is a heartbeat.
//!
//! ## Timing
//!
//! A staleness check runs on a fixed cadence (1 s by default) and
//! declares the device offline once more than the timeout (6 s) has
//! elapsed since the last heartbeat.  Offline detection latency is
//! therefore in `[timeout, timeout + interval)`.
//!
//! ## Edge triggering
//!
//! [`on_heartbeat`](ConnectionMonitor::on_heartbeat) and
//! [`tick`](ConnectionMonitor::tick) return `Some(status)` only when the
//! status actually flips.  Repeated heartbeats while online, or repeated
//! ticks while offline, report nothing.

use log::{info, warn};

/// Online/offline transition reported by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Status line shown by the dashboard header.
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Connected",
            Self::Offline => "Disconnected (device not responding)",
        }
    }
}

/// Process-wide connection state for one dashboard session.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    timeout_ms: u64,
    is_online: bool,
    /// `None` until the first heartbeat (conceptually minus infinity).
    last_heartbeat_ms: Option<u64>,
}

impl ConnectionMonitor {
    /// Starts offline with no heartbeat recorded.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            is_online: false,
            last_heartbeat_ms: None,
        }
    }

    /// Record a heartbeat at `now_ms`.
    pub fn on_heartbeat(&mut self, now_ms: u64) -> Option<ConnectionStatus> {
        self.last_heartbeat_ms = Some(now_ms);
        if self.is_online {
            return None;
        }
        self.is_online = true;
        info!("Connection: device online");
        Some(ConnectionStatus::Online)
    }

    /// Periodic staleness check.
    pub fn tick(&mut self, now_ms: u64) -> Option<ConnectionStatus> {
        if !self.is_online || !self.is_stale(now_ms) {
            return None;
        }
        self.is_online = false;
        warn!(
            "Connection: no heartbeat for {}ms, device offline",
            self.elapsed_ms(now_ms).unwrap_or(0)
        );
        Some(ConnectionStatus::Offline)
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.is_online {
            ConnectionStatus::Online
        } else {
            ConnectionStatus::Offline
        }
    }

    pub fn last_heartbeat_ms(&self) -> Option<u64> {
        self.last_heartbeat_ms
    }

    /// Milliseconds since the last heartbeat.  A clock that stepped
    /// backwards reads as zero elapsed.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_heartbeat_ms.map(|t| now_ms.saturating_sub(t))
    }

    fn is_stale(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms).is_none_or(|e| e > self.timeout_ms)
    }
}
