//! Mock store and recording sink for integration tests.
//!
//! `MockStore` records every write so tests can assert on the full
//! command history without a backend.  Push delivery is not simulated:
//! tests feed telemetry straight into `Dashboard::on_store_push`.

use std::collections::HashMap;

use pillbox::adapters::clock::ManualClock;
use pillbox::app::events::{DashboardEvent, UserNotice};
use pillbox::app::ports::{EventSink, StoreError, StorePort, StoreValue, Subscriber, SubscriptionId};
use pillbox::app::service::Dashboard;
use pillbox::config::DashboardConfig;

// ── Write record ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Set(String, StoreValue),
    Update(Vec<(String, StoreValue)>),
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub values: HashMap<String, StoreValue>,
    pub writes: Vec<StoreWrite>,
    pub fail_with: Option<StoreError>,
    /// `(n, error)`: the first `n` writes succeed, every later one fails.
    pub fail_after: Option<(usize, StoreError)>,
    pub fail_reads_with: Option<StoreError>,
    pub fail_subscribe_with: Option<StoreError>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command strings written to `path`, oldest first.
    pub fn commands(&self, path: &str) -> Vec<String> {
        self.writes
            .iter()
            .filter_map(|w| match w {
                StoreWrite::Set(p, StoreValue::String(s)) if p == path => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn value(&self, path: &str) -> Option<&StoreValue> {
        self.values.get(path)
    }

    fn write_allowed(&self) -> Result<(), StoreError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        match &self.fail_after {
            Some((n, e)) if self.writes.len() >= *n => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

impl StorePort for MockStore {
    fn subscribe(&mut self, _path: &str, _subscriber: Subscriber) -> Result<SubscriptionId, StoreError> {
        match &self.fail_subscribe_with {
            Some(e) => Err(e.clone()),
            None => Ok(SubscriptionId(0)),
        }
    }

    fn unsubscribe(&mut self, _id: SubscriptionId) {}

    fn set(&mut self, path: &str, value: StoreValue) -> Result<(), StoreError> {
        self.write_allowed()?;
        self.values.insert(path.to_string(), value.clone());
        self.writes.push(StoreWrite::Set(path.to_string(), value));
        Ok(())
    }

    fn update(&mut self, updates: &[(&str, StoreValue)]) -> Result<(), StoreError> {
        self.write_allowed()?;
        let mut record = Vec::new();
        for (path, value) in updates {
            self.values.insert((*path).to_string(), value.clone());
            record.push(((*path).to_string(), value.clone()));
        }
        self.writes.push(StoreWrite::Update(record));
        Ok(())
    }

    fn read_once(&self, path: &str) -> Result<Option<StoreValue>, StoreError> {
        if let Some(e) = &self.fail_reads_with {
            return Err(e.clone());
        }
        Ok(self.values.get(path).cloned())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<DashboardEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<UserNotice> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DashboardEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DashboardEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DashboardEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Harness {
    pub dash: Dashboard,
    pub store: MockStore,
    pub clock: ManualClock,
    pub sink: RecordingSink,
}

/// Fresh dashboard at epoch `1_000_000` ms, 09:00 local.
pub fn harness() -> Harness {
    Harness {
        dash: Dashboard::new(DashboardConfig::default()),
        store: MockStore::new(),
        clock: ManualClock::new(1_000_000, 9, 0),
        sink: RecordingSink::new(),
    }
}

#[allow(dead_code)]
impl Harness {
    pub fn push(&mut self, value: StoreValue) {
        self.dash.on_store_push(Some(value), &self.clock, &mut self.sink);
    }

    pub fn tick(&mut self) {
        self.dash.heartbeat_tick(&self.clock, &mut self.sink);
    }

    pub fn command_path(&self) -> String {
        self.dash.config().command_path.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.store.commands(&self.command_path())
    }
}
