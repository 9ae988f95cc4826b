//! Refill wizard lifecycle.
//!
//! Opening the wizard puts the device into refill mode and plays the
//! chime; cancelling or finishing takes it back out.  The two opening
//! commands are separate writes, so a device can end up in refill mode
//! without the chime; nothing here depends on the chime.

use crate::app::commands::DeviceCommand;
use crate::error::RefillError;
use crate::schedule::{AlarmSchedule, RefillStep};

/// Commands sent, in order, when the wizard opens.
pub const OPEN_SEQUENCE: [DeviceCommand; 2] = [DeviceCommand::EnterRefill, DeviceCommand::PlayMusic];

/// Sent on both cancel and finish.
pub const CLOSE_COMMAND: DeviceCommand = DeviceCommand::ExitRefill;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefillWizard {
    #[default]
    Closed,
    Open { plan: Vec<RefillStep> },
}

impl RefillWizard {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn plan(&self) -> &[RefillStep] {
        match self {
            Self::Open { plan } => plan,
            Self::Closed => &[],
        }
    }

    /// Check whether the wizard may open given the device's refill flag.
    pub fn can_open(&self, device_in_refill_mode: bool) -> Result<(), RefillError> {
        if self.is_open() {
            return Err(RefillError::AlreadyOpen);
        }
        if device_in_refill_mode {
            return Err(RefillError::DeviceInRefillMode);
        }
        Ok(())
    }

    /// Open with a plan built from the current schedule.
    pub fn open(&mut self, schedule: &AlarmSchedule) -> &[RefillStep] {
        *self = Self::Open {
            plan: schedule.refill_plan(),
        };
        self.plan()
    }

    pub fn ensure_open(&self) -> Result<(), RefillError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(RefillError::NotOpen)
        }
    }

    /// Close after [`CLOSE_COMMAND`] went out.  Returns the plan that was
    /// showing.
    pub fn close(&mut self) -> Result<Vec<RefillStep>, RefillError> {
        match core::mem::take(self) {
            Self::Open { plan } => Ok(plan),
            Self::Closed => Err(RefillError::NotOpen),
        }
    }
}
