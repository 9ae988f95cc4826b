//! Session loop: single-threaded, cooperative, reactor-driven.
//!
//! Uses `edge-executor` for cooperative scheduling and `async-io-mini`
//! for reactor timers.  Three activities share one [`Dashboard`]:
//!
//! 1. **Inbox**: store pushes and user actions.  Pushes land in an
//!    `embassy-sync` [`Signal`] holding only the latest snapshot; actions
//!    queue in a bounded `Channel`.  A pending snapshot is handled first.
//! 2. **Heartbeat**: staleness check on the configured cadence (1 s).
//! 3. **Alarm refresh**: next-dose recomputation (60 s).
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  futures_lite::future::block_on                          │
//!  │  ┌────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                      │  │
//!  │  │  ┌───────────┐  ┌─────────────┐  ┌──────────────┐  │  │
//!  │  │  │  Inbox    │  │ Heartbeat   │  │ Alarm refresh│  │  │
//!  │  │  │ wake-on-  │  │ 1 s ⏱       │  │ 60 s ⏱       │  │  │
//!  │  │  │ send      │  │             │  │              │  │  │
//!  │  │  └───────────┘  └─────────────┘  └──────────────┘  │  │
//!  │  └────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handler runs to completion under one `RefCell` borrow, never
//! across an `.await`, so handlers cannot interleave.  The loop ends when
//! a [`SessionMsg::Shutdown`] is received.

use core::cell::RefCell;
use core::future::Future;
use core::time::Duration;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::app::commands::UserAction;
use crate::app::ports::{ClockPort, EventSink, StorePort, StoreValue};
use crate::app::service::Dashboard;

/// Depth of the action queue.  Telemetry does not count against it.
pub const INBOX_DEPTH: usize = 16;

/// Queued messages for the inbox task.
#[derive(Debug, Clone)]
pub enum SessionMsg {
    Action(UserAction),
    Shutdown,
}

enum Inbound {
    Snapshot(Option<StoreValue>),
    Msg(SessionMsg),
}

/// Session inbox: latest-wins telemetry slot plus a FIFO of actions.
pub struct SessionInbox {
    latest: Signal<NoopRawMutex, Option<StoreValue>>,
    queue: Channel<NoopRawMutex, SessionMsg, INBOX_DEPTH>,
}

impl Default for SessionInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionInbox {
    pub const fn new() -> Self {
        Self {
            latest: Signal::new(),
            queue: Channel::new(),
        }
    }

    /// Replace any snapshot not yet handled.  Never fails.
    pub fn publish(&self, value: Option<StoreValue>) {
        self.latest.signal(value);
    }

    pub fn try_send(&self, msg: SessionMsg) -> Result<(), TrySendError<SessionMsg>> {
        self.queue.try_send(msg)
    }

    async fn next(&self) -> Inbound {
        futures_lite::future::or(
            async { Inbound::Snapshot(self.latest.wait().await) },
            async { Inbound::Msg(self.queue.receive().await) },
        )
        .await
    }
}

/// Everything the loop drives.
pub struct Session<S, C, K> {
    pub dashboard: Dashboard,
    pub store: S,
    pub clock: C,
    pub sink: K,
}

pub type SharedSession<S, C, K> = Rc<RefCell<Session<S, C, K>>>;

impl<S: StorePort, C: ClockPort, K: EventSink> Session<S, C, K> {
    pub fn new(dashboard: Dashboard, store: S, clock: C, sink: K) -> Self {
        Self {
            dashboard,
            store,
            clock,
            sink,
        }
    }

    /// Handle one inbox item.  Returns `false` on shutdown.
    fn handle(&mut self, inbound: Inbound) -> bool {
        match inbound {
            Inbound::Snapshot(value) => {
                self.dashboard.on_store_push(value, &self.clock, &mut self.sink);
            }
            Inbound::Msg(SessionMsg::Action(action)) => {
                debug!("Session: action {:?}", action);
                if let Err(e) =
                    self.dashboard
                        .handle_action(action, &mut self.store, &self.clock, &mut self.sink)
                {
                    info!("Session: action not completed: {}", e);
                }
            }
            Inbound::Msg(SessionMsg::Shutdown) => return false,
        }
        true
    }
}

// ── Tasks ────────────────────────────────────────────────────

async fn inbox_loop<S, C, K>(session: SharedSession<S, C, K>, inbox: Rc<SessionInbox>)
where
    S: StorePort,
    C: ClockPort,
    K: EventSink,
{
    loop {
        let inbound = inbox.next().await;
        if !session.borrow_mut().handle(inbound) {
            info!("Session: shutdown requested");
            return;
        }
    }
}

async fn heartbeat_loop<S, C, K>(session: SharedSession<S, C, K>, interval: Duration)
where
    C: ClockPort,
    K: EventSink,
{
    loop {
        async_io_mini::Timer::after(interval).await;
        let mut guard = session.borrow_mut();
        let s = &mut *guard;
        s.dashboard.heartbeat_tick(&s.clock, &mut s.sink);
    }
}

async fn alarm_refresh_loop<S, C, K>(session: SharedSession<S, C, K>, interval: Duration)
where
    C: ClockPort,
    K: EventSink,
{
    loop {
        async_io_mini::Timer::after(interval).await;
        let mut guard = session.borrow_mut();
        let s = &mut *guard;
        s.dashboard.refresh_next_alarm(&s.clock, &mut s.sink);
    }
}

// ── Entry point ──────────────────────────────────────────────

/// Run one dashboard session until a [`SessionMsg::Shutdown`] arrives.
///
/// Subscribes to the telemetry path, loads settings once, then drives
/// the three tasks plus `companion` (a simulated device, a UI bridge, or
/// `core::future::pending()`).  A failed subscription is logged and the
/// session stays in its loading state.
pub fn run<S, C, K, F>(session: &SharedSession<S, C, K>, inbox: &Rc<SessionInbox>, companion: F)
where
    S: StorePort,
    C: ClockPort,
    K: EventSink,
    F: Future<Output = ()>,
{
    let (subscription, heartbeat_every, refresh_every) = {
        let mut guard = session.borrow_mut();
        let s = &mut *guard;
        let config = s.dashboard.config().clone();

        let tx = Rc::clone(inbox);
        let subscription = s
            .store
            .subscribe(
                &config.monitor_path,
                Box::new(move |value| tx.publish(value)),
            )
            .inspect_err(|e| warn!("Session: telemetry subscription failed: {}", e))
            .ok();

        // Failure already surfaced as a notice.
        let _ = s.dashboard.load_settings(&s.store, &s.clock, &mut s.sink);
        s.dashboard.refresh_next_alarm(&s.clock, &mut s.sink);

        (
            subscription,
            Duration::from_millis(config.heartbeat_check_interval_ms),
            Duration::from_secs(config.alarm_refresh_interval_secs),
        )
    };

    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    executor
        .spawn(heartbeat_loop(Rc::clone(session), heartbeat_every))
        .detach();
    executor
        .spawn(alarm_refresh_loop(Rc::clone(session), refresh_every))
        .detach();
    executor.spawn(companion).detach();

    info!(
        "Session started (heartbeat check {:?}, alarm refresh {:?})",
        heartbeat_every, refresh_every
    );

    futures_lite::future::block_on(executor.run(inbox_loop(Rc::clone(session), Rc::clone(inbox))));

    if let Some(id) = subscription {
        session.borrow_mut().store.unsubscribe(id);
    }
    info!("Session stopped");
}
