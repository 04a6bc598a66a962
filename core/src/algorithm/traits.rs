//! Core algorithm trait definitions for the preflow solver family
//!
//! This module establishes the shared interface of all maximum flow
//! variants. Each variant owns its problem instance and residual graph and
//! is driven either to completion (`run`) or one state transition at a time
//! (`run_step`), so an external driver can observe intermediate graphs.
//!
//! # Key Design Principles
//! - Variants are strategies behind one trait, dispatched through a tagged
//!   enum rather than an inheritance chain
//! - State isolation between runs: `reset` restores a freshly built engine
//! - Deterministic behavior for given inputs

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::algorithm::state::FlowMetrics;
use crate::data_structures::graph::{Flow, FlowGraph, GraphError};
use crate::data_structures::residual::{FlowError, ResidualGraph};
use crate::execution::tracer::FlowEvent;
use crate::validation::correctness::InvariantViolation;

/// Node identifier ensuring type safety and preventing mixing with other numeric types
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Comprehensive error types for algorithm operations
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("Precondition violated: {0}")]
    Flow(#[from] FlowError),

    #[error("Invariant violated: {0}")]
    InvariantViolated(#[from] InvariantViolation),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("{0} has not finished yet")]
    NotFinished(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Maximum flow algorithm variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Goldberg-Tarjan preflow-push with configurable active-vertex selection
    #[default]
    PushRelabel,
    /// Shortest augmenting paths found by breadth-first search
    EdmondsKarp,
}

impl AlgorithmKind {
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::PushRelabel => "Push-Relabel",
            AlgorithmKind::EdmondsKarp => "Edmonds-Karp",
        }
    }
}

/// Algorithm complexity information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmComplexity {
    pub time_complexity: String,
    pub space_complexity: String,
}

/// Shared interface of the maximum flow variants
///
/// # Invariants
/// - `run_step` performs exactly one state transition and returns its event
/// - once `is_finished` holds, further steps do not mutate anything
/// - `graph()` always reflects the flow read back from the residual graph
pub trait MaxFlowAlgorithm: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's asymptotic complexity
    fn complexity(&self) -> AlgorithmComplexity;

    /// Runs to completion and returns the maximum flow value
    fn run(&mut self) -> Result<Flow, AlgorithmError>;

    /// Executes a single state transition
    fn run_step(&mut self) -> Result<FlowEvent, AlgorithmError>;

    fn is_finished(&self) -> bool;

    /// Clears all flow and rebuilds the residual graph from scratch
    fn reset(&mut self);

    /// Original graph with the current flow on every arc
    fn graph(&self) -> &FlowGraph;

    /// Current residual graph structure
    fn residual_graph(&self) -> &ResidualGraph;

    fn metrics(&self) -> &FlowMetrics;

    /// Value of the flow currently held by the graph
    fn flow_value(&self) -> Flow;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_type_safety() {
        let node1 = NodeId(42);
        let node2 = NodeId(42);
        let node3 = NodeId(43);

        assert_eq!(node1, node2);
        assert_ne!(node1, node3);
        assert_eq!(node1.as_usize(), 42);
        assert_eq!(node3.to_string(), "v43");
    }

    #[test]
    fn test_algorithm_kind_serde_names() {
        assert_eq!(serde_json::to_string(&AlgorithmKind::EdmondsKarp).unwrap(), "\"edmonds_karp\"");
        let kind: AlgorithmKind = serde_json::from_str("\"push_relabel\"").unwrap();
        assert_eq!(kind, AlgorithmKind::PushRelabel);
        assert_eq!(kind.name(), "Push-Relabel");
    }

    #[test]
    fn test_error_conversion() {
        let err: AlgorithmError = FlowError::NoExcess(NodeId(3)).into();
        assert!(matches!(err, AlgorithmError::Flow(_)));
        assert!(err.to_string().contains("v3"));
    }
}
