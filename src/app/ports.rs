//! Port traits: the hexagonal boundary between the dashboard core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dashboard (domain)
//! ```
//!
//! Driven adapters (hosted store, wall clock, presentation layer)
//! implement these traits.  The [`Dashboard`](super::service::Dashboard)
//! consumes them via generics, so the domain core never talks to the
//! network or the DOM directly.
//!
//! The core never talks to the device either: commands are plain store
//! writes, and the device republishes telemetry on its own schedule.

use chrono::NaiveTime;
use core::fmt;

/// Values held by the store.  The hosted backend is a JSON tree, so every
/// node (scalar or object) is a JSON value.
pub type StoreValue = serde_json::Value;

/// Push callback registered on a store path.  Receives the full value at
/// the path on every committed change, or `None` if the path is empty.
pub type Subscriber = Box<dyn FnMut(Option<StoreValue>)>;

/// Handle returned by [`StorePort::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

// ───────────────────────────────────────────────────────────────
// Store gateway (driven adapter: domain ↔ hosted real-time store)
// ───────────────────────────────────────────────────────────────

/// Thin adapter over the hosted store: subscribe-to-path, write-path,
/// one-shot read.  No business logic lives behind this trait.
///
/// Writes are fire-and-forget from the core's point of view: an `Ok`
/// means the write was handed to the backend.  A backend that reports
/// failure later surfaces it through the next call's `Err`; a hung write
/// simply never reports anything.
pub trait StorePort {
    /// Register a push subscriber on `path`.  Implementations deliver the
    /// current value once immediately, then on every committed change, in
    /// commit order.
    fn subscribe(&mut self, path: &str, subscriber: Subscriber) -> Result<SubscriptionId, StoreError>;

    /// Drop a subscription.  Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Overwrite a single path.
    fn set(&mut self, path: &str, value: StoreValue) -> Result<(), StoreError>;

    /// Apply a multi-path update as one commit.
    fn update(&mut self, updates: &[(&str, StoreValue)]) -> Result<(), StoreError>;

    /// Read a path once, without subscribing.
    fn read_once(&self, path: &str) -> Result<Option<StoreValue>, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  Injected so heartbeat and schedule logic can be
/// driven deterministically in tests.
pub trait ClockPort {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Local time of day, used for the next-alarm display.
    fn time_of_day(&self) -> NaiveTime;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → presentation)
// ───────────────────────────────────────────────────────────────

/// The presentation layer registers one of these to receive
/// [`DashboardEvent`](super::events::DashboardEvent)s.  Rendering,
/// blocking notices and navigation are entirely its business.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DashboardEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StorePort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend refused the operation.  Carries the backend's message
    /// when it supplied one.
    Rejected(Option<String>),
    /// The backend could not be reached.
    Unavailable,
    /// The session with the backend was torn down.
    Disconnected,
}

impl StoreError {
    /// Underlying reason suitable for user-facing text, if known.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Rejected(msg) => msg.as_deref(),
            Self::Unavailable => Some("store unavailable"),
            Self::Disconnected => Some("store disconnected"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(Some(msg)) => write!(f, "rejected: {}", msg),
            Self::Rejected(None) => write!(f, "rejected"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}
