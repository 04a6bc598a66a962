//! Preflow core: maximum flow via highest-label push-relabel
//!
//! The crate computes maximum flows on capacitated directed graphs with the
//! Goldberg-Tarjan preflow-push method. Every push and relabel is observable,
//! and the engine can be advanced one decision at a time so an external
//! driver can inspect intermediate residual graphs.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;
pub mod execution;
pub mod optimization;
pub mod validation;

pub use algorithm::{
    solve, AlgorithmError, AlgorithmKind, AugmentingPath, EdmondsKarp, EngineState, FlowMetrics,
    MaxFlowAlgorithm, MaxFlowResult, MaxFlowSolver, MinCut, NodeId, PushRelabel, SelectionRule,
    SolverConfig,
};
pub use data_structures::graph::{ArcId, Capacity, Flow, FlowArc, FlowGraph, GraphError, MaxFlowProblem};
pub use data_structures::residual::{FlowError, ResArcId, ResidualArc, ResidualGraph, VertexState};
pub use execution::tracer::{ExecutionTracer, FlowEvent, FlowObserver, FnObserver, NullObserver};
pub use optimization::parallel::solve_batch;
pub use validation::correctness::InvariantViolation;

/// Crate version as published in Cargo metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
