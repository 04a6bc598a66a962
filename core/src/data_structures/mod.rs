//! Flow network data structures: original graph, residual arena, active-vertex queue

pub mod graph;
pub mod priority_queue;
pub mod residual;

pub use self::graph::{ArcId, Capacity, Flow, FlowArc, FlowGraph, GraphError, MaxFlowProblem};
pub use self::priority_queue::{ActiveVertexQueue, SelectionRule};
pub use self::residual::{DistanceLabel, FlowError, ResArcId, ResidualArc, ResidualGraph, VertexState};
