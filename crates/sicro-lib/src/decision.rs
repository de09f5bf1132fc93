//! Replica decision engine
//!
//! Pure mapping from `(is_alert, is_stable, current_replicas)` to the next
//! replica count. Rules are checked in order and the first match wins:
//! 1. alert and below the ceiling: scale up by one
//! 2. stable, no alert and above the floor: scale down by one
//! 3. otherwise maintain
//!
//! An alert always beats stability when both flags assert.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::models::ScalingAction;
use serde::{Deserialize, Serialize};

/// Outcome of a single decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub new_replicas: u32,
    pub action: ScalingAction,
}

impl From<Decision> for (u32, ScalingAction) {
    fn from(decision: Decision) -> Self {
        (decision.new_replicas, decision.action)
    }
}

/// Stateless scaling policy bounded by `[min_replicas, max_replicas]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionEngine {
    min_replicas: u32,
    max_replicas: u32,
}

impl DecisionEngine {
    /// Build an engine for the inclusive replica range; inverted bounds are rejected
    pub fn new(min_replicas: u32, max_replicas: u32) -> Result<Self, ControllerError> {
        if min_replicas > max_replicas {
            return Err(ControllerError::InvalidConfiguration(format!(
                "min_replicas ({min_replicas}) exceeds max_replicas ({max_replicas})"
            )));
        }
        Ok(Self {
            min_replicas,
            max_replicas,
        })
    }

    pub fn from_config(config: &ControllerConfig) -> Result<Self, ControllerError> {
        Self::new(config.min_replicas, config.max_replicas)
    }

    /// Decide the next replica count from the current window flags
    ///
    /// Never leaves `[min_replicas, max_replicas]`: an alert at the ceiling or
    /// stability at the floor maintains instead of scaling.
    pub fn decide(&self, is_alert: bool, is_stable: bool, current_replicas: u32) -> Decision {
        if is_alert && current_replicas < self.max_replicas {
            Decision {
                new_replicas: current_replicas + 1,
                action: ScalingAction::ScaleUp,
            }
        } else if is_stable && !is_alert && current_replicas > self.min_replicas {
            Decision {
                new_replicas: current_replicas - 1,
                action: ScalingAction::ScaleDown,
            }
        } else {
            Decision {
                new_replicas: current_replicas,
                action: ScalingAction::Maintain,
            }
        }
    }
}
