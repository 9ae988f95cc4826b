//! Alert controller.
//!
//! Owns the single active alert raised from device-reported error states.
//! Device errors are domain events, not software faults.
//!
//! ```text
//!             errorState != none
//!   Idle ─────────────────────────▶ Shown(code, confirm)
//!    ▲                                 │        │
//!    │  errorState == none,            │        │ errorState == none,
//!    │  confirm = false                │        │ confirm = true
//!    ├─────────────────────────────────┘        └──▶ (stays Shown)
//!    │
//!    ├──── user dismiss  (confirm = false only)
//!    └──── user confirm  (+ clear command to the device)
//! ```
//!
//! A confirmation alert is sticky: new error codes and `none` pushes are
//! both ignored until the user confirms it.

use log::info;

use crate::app::commands::DeviceCommand;
use crate::error::AlertError;
use crate::telemetry::ErrorState;

// ---------------------------------------------------------------------------
// Error-state table
// ---------------------------------------------------------------------------

/// Static description of how one error state is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRule {
    pub requires_confirmation: bool,
    pub confirm_command: DeviceCommand,
}

/// Mapping from error state to alert behaviour.  Total over
/// [`ErrorState`]; `None` means "no alert".
pub fn alert_rule(state: &ErrorState) -> Option<AlertRule> {
    let (requires_confirmation, confirm_command) = match state {
        ErrorState::None => return None,
        ErrorState::PusherStuck => (true, DeviceCommand::ClearPusherError),
        ErrorState::LidError
        | ErrorState::CupNotTaken
        | ErrorState::RefillCupsLeft
        | ErrorState::PreviousCupLeft
        | ErrorState::Unknown(_) => (false, DeviceCommand::ClearError),
    };
    Some(AlertRule {
        requires_confirmation,
        confirm_command,
    })
}

/// User-facing alert text.  `last_active_cup` only matters for
/// `cup_not_taken`.
pub fn alert_message(state: &ErrorState, last_active_cup: Option<i64>) -> String {
    match state {
        ErrorState::None => String::new(),
        ErrorState::PusherStuck => {
            "The pusher may be stuck. Check that it is clear, then press Confirm.".into()
        }
        ErrorState::LidError => "The lid has been open for too long. Please close it.".into(),
        ErrorState::CupNotTaken => match last_active_cup {
            Some(cup) => format!(
                "Cup {cup} was not taken in time and has been pushed out. Please retrieve it."
            ),
            None => "A cup was not taken in time and has been pushed out. Please retrieve it."
                .into(),
        },
        ErrorState::RefillCupsLeft => {
            "Refill finished, but some cups are still empty.".into()
        }
        ErrorState::PreviousCupLeft => {
            "The previous cup was not retrieved. Dispensing continues anyway.".into()
        }
        ErrorState::Unknown(code) => format!("Device reported error: {code}"),
    }
}

// ---------------------------------------------------------------------------
// Active alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    pub message: String,
    pub requires_confirmation: bool,
    pub code: ErrorState,
    pub confirm_command: DeviceCommand,
}

impl ActiveAlert {
    fn from_state(state: &ErrorState, last_active_cup: Option<i64>) -> Option<Self> {
        let rule = alert_rule(state)?;
        Some(Self {
            message: alert_message(state, last_active_cup),
            requires_confirmation: rule.requires_confirmation,
            code: state.clone(),
            confirm_command: rule.confirm_command,
        })
    }
}

/// Why an alert left the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// The device reported `none`.
    Resolved,
    Dismissed,
    Confirmed,
}

/// What an observed error state did to the alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertTransition {
    Raised(ActiveAlert),
    Cleared(ClearReason),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AlertController {
    active: Option<ActiveAlert>,
}

impl AlertController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveAlert> {
        self.active.as_ref()
    }

    /// Feed the error state from one snapshot.  Returns a transition only
    /// when the visible alert changes.
    pub fn observe(
        &mut self,
        state: &ErrorState,
        last_active_cup: Option<i64>,
    ) -> Option<AlertTransition> {
        if self.active.as_ref().is_some_and(|a| a.requires_confirmation) {
            return None;
        }

        match ActiveAlert::from_state(state, last_active_cup) {
            None => {
                let cleared = self.active.take()?;
                info!("Alert: '{}' resolved by device", cleared.code.as_wire());
                Some(AlertTransition::Cleared(ClearReason::Resolved))
            }
            Some(alert) => {
                if self.active.as_ref() == Some(&alert) {
                    return None;
                }
                info!(
                    "Alert: raised '{}' (confirm={})",
                    alert.code.as_wire(),
                    alert.requires_confirmation
                );
                self.active = Some(alert.clone());
                Some(AlertTransition::Raised(alert))
            }
        }
    }

    /// Plain dismiss.  Refused for confirmation alerts.
    pub fn dismiss(&mut self) -> Result<(), AlertError> {
        match &self.active {
            None => Err(AlertError::NoActiveAlert),
            Some(a) if a.requires_confirmation => Err(AlertError::ConfirmationRequired),
            Some(_) => {
                self.active = None;
                Ok(())
            }
        }
    }

    /// Look at the command a confirm would send, without clearing yet.
    pub fn pending_confirm_command(&self) -> Result<DeviceCommand, AlertError> {
        self.active
            .as_ref()
            .map(|a| a.confirm_command.clone())
            .ok_or(AlertError::NoActiveAlert)
    }

    /// Clear the alert after its confirm command was dispatched.
    pub fn confirm(&mut self) -> Result<ActiveAlert, AlertError> {
        let alert = self.active.take().ok_or(AlertError::NoActiveAlert)?;
        info!("Alert: '{}' confirmed by user", alert.code.as_wire());
        Ok(alert)
    }
}
