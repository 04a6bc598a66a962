//! Preflow algorithm framework
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod config;
pub mod graph;
pub mod state;
pub mod traits;

pub use self::config::{AlgorithmParameter, ParameterType, SolverConfig};
pub use self::graph::*;
pub use self::state::{EngineState, FlowMetrics};
pub use self::traits::*;
pub use crate::data_structures::priority_queue::SelectionRule;
