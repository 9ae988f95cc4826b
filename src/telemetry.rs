//! Telemetry interpreter.
//!
//! Turns one raw store push into a [`TelemetrySnapshot`], and a snapshot
//! into a [`DerivedViewState`] the presentation layer can render.
//!
//! ## Partial updates
//!
//! Absence of a field means "no update this push", never "reset to
//! default".  Every derived field is therefore an `Option`; `None`
//! leaves the previously rendered value in place.  [`ViewState`] is the
//! retained, merged result that applies these rules.
//!
//! Malformed fields (wrong JSON type, unparsable numbers) are logged and
//! treated as absent.  Nothing in here can fail or panic on device input.

use log::warn;
use serde_json::{Map, Value};

use crate::app::ports::StoreValue;

// ---------------------------------------------------------------------------
// Wire keys
// ---------------------------------------------------------------------------

const KEY_LAST_SEEN: &str = "last_seen";
const KEY_TEMP: &str = "temp";
const KEY_CUPS: &str = "cups";
const KEY_HALL: &str = "hall_sensor";
const KEY_LID: &str = "lid";
const KEY_LID_COUNT: &str = "count";
const KEY_LID_TARGET: &str = "target";
const KEY_LID_MATCH: &str = "is_match";
const KEY_REFILL: &str = "refill_mode";
const KEY_ERROR: &str = "error_state";
const KEY_LAST_CUP: &str = "last_active_cup";

/// Separator of the compact per-cup encoding (`"1,0,1,0,0"`).
const CUP_SEPARATOR: char = ',';

// ---------------------------------------------------------------------------
// Snapshot model
// ---------------------------------------------------------------------------

/// Per-cup occupancy as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupState {
    Active,
    Inactive,
}

impl CupState {
    /// Only the literal token `"1"` is active.
    pub fn from_token(token: &str) -> Self {
        if token == "1" {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Error condition reported by the device in `error_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorState {
    None,
    PusherStuck,
    LidError,
    CupNotTaken,
    RefillCupsLeft,
    PreviousCupLeft,
    /// A code this dashboard does not know.  Carried verbatim.
    Unknown(String),
}

impl ErrorState {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim() {
            "" | "none" => Self::None,
            "pusher_stuck" => Self::PusherStuck,
            "lid_error" => Self::LidError,
            "cup_not_taken" => Self::CupNotTaken,
            "refill_cups_left" => Self::RefillCupsLeft,
            "previous_cup_left" => Self::PreviousCupLeft,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::None => "none",
            Self::PusherStuck => "pusher_stuck",
            Self::LidError => "lid_error",
            Self::CupNotTaken => "cup_not_taken",
            Self::RefillCupsLeft => "refill_cups_left",
            Self::PreviousCupLeft => "previous_cup_left",
            Self::Unknown(code) => code,
        }
    }
}

/// Lid sensor block (`lid.count`, `lid.target`, `lid.is_match`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LidReading {
    pub count: Option<i64>,
    pub target: Option<i64>,
    /// Absent reads as a mismatch.
    pub is_match: bool,
}

/// One telemetry push.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Heartbeat marker; only its presence matters.
    pub last_seen: Option<Value>,
    pub temperature_c: Option<f32>,
    pub cups: Option<Vec<CupState>>,
    pub hall_sensor_active: Option<bool>,
    pub lid: Option<LidReading>,
    pub refill_mode_active: Option<bool>,
    pub error_state: Option<ErrorState>,
    pub last_active_cup: Option<i64>,
}

impl TelemetrySnapshot {
    /// Parse a raw store value.  Returns `None` when the push carries no
    /// object at all (empty path, or a scalar).
    pub fn from_store(value: &StoreValue) -> Option<Self> {
        let Value::Object(obj) = value else {
            if !value.is_null() {
                warn!("Telemetry: expected an object, got {}", value);
            }
            return None;
        };
        Some(Self::from_object(obj))
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            last_seen: obj.get(KEY_LAST_SEEN).filter(|v| is_truthy(v)).cloned(),
            temperature_c: obj.get(KEY_TEMP).and_then(|v| parse_f32(KEY_TEMP, v)),
            cups: obj.get(KEY_CUPS).and_then(parse_cups),
            hall_sensor_active: obj.get(KEY_HALL).and_then(|v| parse_bool(KEY_HALL, v)),
            lid: obj.get(KEY_LID).and_then(parse_lid),
            refill_mode_active: obj.get(KEY_REFILL).and_then(|v| parse_bool(KEY_REFILL, v)),
            error_state: obj.get(KEY_ERROR).and_then(parse_error_state),
            last_active_cup: obj.get(KEY_LAST_CUP).and_then(|v| parse_i64(KEY_LAST_CUP, v)),
        }
    }

    /// Whether this push counts as a heartbeat.
    pub fn has_heartbeat(&self) -> bool {
        self.last_seen.is_some()
    }
}

// ── Field parsers ─────────────────────────────────────────────

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_f32(key: &str, v: &Value) -> Option<f32> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => return None,
        _ => None,
    };
    if parsed.is_none() {
        warn!("Telemetry: ignoring non-numeric '{}' = {}", key, v);
    }
    parsed.map(|f| f as f32)
}

fn parse_i64(key: &str, v: &Value) -> Option<i64> {
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null => return None,
        _ => None,
    };
    if parsed.is_none() {
        warn!("Telemetry: ignoring non-integer '{}' = {}", key, v);
    }
    parsed
}

fn parse_bool(key: &str, v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Null => None,
        other => {
            warn!("Telemetry: ignoring non-boolean '{}' = {}", key, other);
            None
        }
    }
}

fn parse_cups(v: &Value) -> Option<Vec<CupState>> {
    match v {
        Value::String(s) if !s.is_empty() => Some(parse_cup_tokens(s)),
        Value::String(_) | Value::Null => None,
        other => {
            warn!("Telemetry: ignoring non-string 'cups' = {}", other);
            None
        }
    }
}

/// Split the compact cup encoding; token `i` describes cup `i`.
pub fn parse_cup_tokens(raw: &str) -> Vec<CupState> {
    raw.split(CUP_SEPARATOR).map(CupState::from_token).collect()
}

fn parse_lid(v: &Value) -> Option<LidReading> {
    let Value::Object(lid) = v else {
        if !v.is_null() {
            warn!("Telemetry: ignoring non-object 'lid' = {}", v);
        }
        return None;
    };
    Some(LidReading {
        count: lid.get(KEY_LID_COUNT).and_then(|c| parse_i64("lid.count", c)),
        target: lid.get(KEY_LID_TARGET).and_then(|t| parse_i64("lid.target", t)),
        is_match: lid.get(KEY_LID_MATCH).is_some_and(is_truthy),
    })
}

fn parse_error_state(v: &Value) -> Option<ErrorState> {
    match v {
        Value::String(s) => Some(ErrorState::from_wire(s)),
        Value::Null => None,
        other => {
            warn!("Telemetry: ignoring non-string 'error_state' = {}", other);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Derived view state
// ---------------------------------------------------------------------------

/// Two-state hall sensor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HallIndicator {
    MagnetDetected,
    NoSignal,
}

impl HallIndicator {
    pub fn from_active(active: bool) -> Self {
        if active { Self::MagnetDetected } else { Self::NoSignal }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MagnetDetected => "Magnet detected",
            Self::NoSignal => "No signal",
        }
    }
}

/// Lid count check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidMatch {
    Matches,
    Mismatch,
}

impl LidMatch {
    pub fn from_is_match(is_match: bool) -> Self {
        if is_match { Self::Matches } else { Self::Mismatch }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Matches => "Count matches",
            Self::Mismatch => "Count mismatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LidView {
    pub count: Option<i64>,
    pub target: Option<i64>,
    pub matched: LidMatch,
}

impl LidView {
    pub fn count_label(&self) -> String {
        self.count.map_or_else(|| "--".into(), |c| c.to_string())
    }

    pub fn target_label(&self) -> String {
        self.target.map_or_else(|| "--".into(), |t| t.to_string())
    }
}

/// What one snapshot changes on screen.  `None` = leave as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedViewState {
    pub heartbeat: bool,
    pub temperature_c: Option<f32>,
    pub cups: Option<Vec<CupState>>,
    pub hall: Option<HallIndicator>,
    pub lid: Option<LidView>,
    pub refill_banner: Option<bool>,
    pub error_state: Option<ErrorState>,
    pub last_active_cup: Option<i64>,
}

/// Classify a snapshot.  Pure: no state, no I/O.
pub fn interpret(snapshot: &TelemetrySnapshot) -> DerivedViewState {
    DerivedViewState {
        heartbeat: snapshot.has_heartbeat(),
        temperature_c: snapshot.temperature_c,
        cups: snapshot.cups.clone(),
        hall: snapshot.hall_sensor_active.map(HallIndicator::from_active),
        lid: snapshot.lid.map(|lid| LidView {
            count: lid.count,
            target: lid.target,
            matched: LidMatch::from_is_match(lid.is_match),
        }),
        refill_banner: snapshot.refill_mode_active,
        error_state: snapshot.error_state.clone(),
        last_active_cup: snapshot.last_active_cup,
    }
}

// ---------------------------------------------------------------------------
// Retained view state
// ---------------------------------------------------------------------------

/// Everything currently on screen, built up from successive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub temperature_c: Option<f32>,
    /// One entry per physical cup; `None` until the device reports it.
    pub cups: Vec<Option<CupState>>,
    pub hall: Option<HallIndicator>,
    pub lid: Option<LidView>,
    pub refill_mode: bool,
    pub error_state: ErrorState,
    pub last_active_cup: Option<i64>,
}

impl ViewState {
    pub fn new(cup_count: usize) -> Self {
        Self {
            temperature_c: None,
            cups: vec![None; cup_count],
            hall: None,
            lid: None,
            refill_mode: false,
            error_state: ErrorState::None,
            last_active_cup: None,
        }
    }

    /// Merge one derived update.  Cup tokens beyond the physical cup
    /// count are dropped; a short list updates only its prefix.
    pub fn apply(&mut self, derived: &DerivedViewState) {
        if let Some(t) = derived.temperature_c {
            self.temperature_c = Some(t);
        }
        if let Some(cups) = &derived.cups {
            if cups.len() != self.cups.len() {
                warn!(
                    "Telemetry: {} cup tokens for {} cups, updating the addressable ones",
                    cups.len(),
                    self.cups.len()
                );
            }
            for (slot, state) in self.cups.iter_mut().zip(cups) {
                *slot = Some(*state);
            }
        }
        if let Some(hall) = derived.hall {
            self.hall = Some(hall);
        }
        if let Some(lid) = derived.lid {
            self.lid = Some(lid);
        }
        if let Some(refill) = derived.refill_banner {
            self.refill_mode = refill;
        }
        if let Some(err) = &derived.error_state {
            self.error_state = err.clone();
        }
        if let Some(cup) = derived.last_active_cup {
            self.last_active_cup = Some(cup);
        }
    }

    pub fn temperature_label(&self) -> String {
        self.temperature_c
            .map_or_else(|| "--".into(), |t| format!("{t} \u{00b0}C"))
    }
}
