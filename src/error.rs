//! Unified error types for the dashboard core.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! session loop handles failures uniformly.  Device-reported error
//! states are *not* here: they are domain events owned by
//! [`alert`](crate::alert).

use core::fmt;

use crate::app::ports::StoreError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The hosted store refused or failed a read/write.
    Store(StoreError),
    /// An alarm schedule could not be parsed or is out of range.
    Schedule(ScheduleError),
    /// An alert action is not permitted in the current alert state.
    Alert(AlertError),
    /// A refill wizard action is not permitted right now.
    Refill(RefillError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Alert(e) => write!(f, "alert: {e}"),
            Self::Refill(e) => write!(f, "refill: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Schedule errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A slot did not hold a valid 24-hour `HH:MM` value.
    InvalidTime(String),
    /// More alarms than the device has slots for.
    TooManyAlarms { max: usize },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(raw) => write!(f, "invalid alarm time '{raw}' (expected HH:MM)"),
            Self::TooManyAlarms { max } => write!(f, "at most {max} alarms can be set"),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Alert errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertError {
    /// Dismiss/confirm requested with no alert showing.
    NoActiveAlert,
    /// Plain dismiss attempted on an alert that must be confirmed.
    ConfirmationRequired,
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveAlert => write!(f, "no active alert"),
            Self::ConfirmationRequired => write!(f, "alert must be confirmed, not dismissed"),
        }
    }
}

impl From<AlertError> for Error {
    fn from(e: AlertError) -> Self {
        Self::Alert(e)
    }
}

// ---------------------------------------------------------------------------
// Refill errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillError {
    /// The wizard is already open.
    AlreadyOpen,
    /// The device already reports refill mode.
    DeviceInRefillMode,
    /// Cancel/finish requested while the wizard is closed.
    NotOpen,
}

impl fmt::Display for RefillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen => write!(f, "refill wizard already open"),
            Self::DeviceInRefillMode => write!(f, "device is already in refill mode"),
            Self::NotOpen => write!(f, "refill wizard is not open"),
        }
    }
}

impl From<RefillError> for Error {
    fn from(e: RefillError) -> Self {
        Self::Refill(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
