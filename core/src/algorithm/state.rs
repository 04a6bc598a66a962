//! Engine lifecycle state and execution metrics
//!
//! Every flow engine is a state machine advanced by discrete calls:
//!
//! ```text
//! Uninitialized --(initialize)--> Active --(active set empty)--> Finished
//!       ^                                                           |
//!       +------------------------- reset --------------------------+
//! ```
//!
//! Initialization is a single transient transition; `Finished` is absorbing
//! until an explicit reset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a flow engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Uninitialized,
    Active,
    Finished,
}

/// Flow algorithm performance metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Number of state transitions executed
    pub steps: usize,
    /// Number of push operations
    pub push_operations: usize,
    /// Pushes that exhausted the residual capacity of their arc
    pub saturating_pushes: usize,
    /// Number of relabel operations
    pub relabel_operations: usize,
    /// Number of augmenting paths applied
    pub augmentations: usize,
    /// Wall-clock time spent inside `run`
    pub execution_time: Duration,
}

impl FlowMetrics {
    pub fn record_push(&mut self, saturating: bool) {
        self.push_operations += 1;
        if saturating {
            self.saturating_pushes += 1;
        }
    }

    pub fn record_relabel(&mut self) {
        self.relabel_operations += 1;
    }

    pub fn record_augmentation(&mut self) {
        self.augmentations += 1;
    }

    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    pub fn non_saturating_pushes(&self) -> usize {
        self.push_operations - self.saturating_pushes
    }
}
