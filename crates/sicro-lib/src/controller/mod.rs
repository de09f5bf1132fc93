//! Controller loop and end-to-end pipeline
//!
//! The loop owns the replica count and advances one tick per sample,
//! consulting the decision engine on every `decision_interval`-th tick.
//! `Pipeline` wires classifier, aggregator and loop together for a batch.

mod r#loop;
mod pipeline;

pub use pipeline::{Pipeline, RunReport};
pub use r#loop::{ControllerLoop, TickOutcome};

use crate::decision::Decision;
use serde::{Deserialize, Serialize};

/// Mutable controller state; only the controller loop writes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    current_replicas: u32,
}

impl ControllerState {
    pub fn new(current_replicas: u32) -> Self {
        Self { current_replicas }
    }

    pub fn current_replicas(&self) -> u32 {
        self.current_replicas
    }

    fn apply(&mut self, decision: &Decision) {
        self.current_replicas = decision.new_replicas;
    }
}
