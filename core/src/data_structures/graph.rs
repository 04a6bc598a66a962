//! Capacitated flow graph and maximum flow problem definition
//!
//! This module implements the original (non-residual) network: labelled
//! vertices and directed arcs carrying a fixed integer capacity and a mutable
//! flow value. Topology is immutable once a [`MaxFlowProblem`] has been
//! formed; only flow values change afterwards, and only through the solver
//! reading back residual results.
//!
//! # Validation
//! Malformed input is rejected at construction time: negative capacities,
//! arcs referring to unknown vertices, duplicate vertex labels, and problems
//! whose source equals the target. A target that is unreachable from the
//! source is accepted and simply yields a zero flow.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::NodeId;

/// Arc capacity type (integral)
pub type Capacity = i64;

/// Flow value type (integral)
pub type Flow = i64;

/// Arc identifier into the original graph's arc list
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ArcId(pub usize);

impl ArcId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Errors raised while building a graph or a problem on top of it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Unknown vertex: {0}")]
    UnknownVertex(NodeId),

    #[error("Unknown vertex label: {0:?}")]
    UnknownLabel(String),

    #[error("Duplicate vertex label: {0:?}")]
    DuplicateLabel(String),

    #[error("Arc {start} -> {end} has negative capacity {capacity}")]
    NegativeCapacity {
        start: String,
        end: String,
        capacity: Capacity,
    },

    #[error("Source and target are the same vertex: {0:?}")]
    SourceEqualsTarget(String),

    #[error("Total capacity {direction} vertex {vertex:?} overflows the flow type")]
    CapacityOverflow { vertex: String, direction: &'static str },
}

/// Original arc of the capacitated graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowArc {
    /// Tail vertex
    pub start: NodeId,
    /// Head vertex
    pub end: NodeId,
    /// Fixed, non-negative capacity
    pub capacity: Capacity,
    /// Current flow, always within `0..=capacity`
    pub flow: Flow,
}

impl FlowArc {
    /// Remaining capacity in the arc's own direction
    pub fn residual_capacity(&self) -> Capacity {
        self.capacity - self.flow
    }

    pub fn is_saturated(&self) -> bool {
        self.flow == self.capacity
    }
}

/// Directed graph with integer arc capacities and flows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphRepr")]
pub struct FlowGraph {
    labels: Vec<String>,
    arcs: Vec<FlowArc>,
    #[serde(skip)]
    by_label: HashMap<String, NodeId>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex with a unique human-readable label
    pub fn add_vertex(&mut self, label: impl Into<String>) -> Result<NodeId, GraphError> {
        let label = label.into();
        if self.by_label.contains_key(&label) {
            return Err(GraphError::DuplicateLabel(label));
        }
        let id = NodeId(self.labels.len());
        self.by_label.insert(label.clone(), id);
        self.labels.push(label);
        Ok(id)
    }

    /// Adds an arc with zero initial flow
    pub fn add_arc(&mut self, start: NodeId, end: NodeId, capacity: Capacity) -> Result<ArcId, GraphError> {
        self.check_vertex(start)?;
        self.check_vertex(end)?;
        if capacity < 0 {
            return Err(GraphError::NegativeCapacity {
                start: self.labels[start.0].clone(),
                end: self.labels[end.0].clone(),
                capacity,
            });
        }
        let id = ArcId(self.arcs.len());
        self.arcs.push(FlowArc { start, end, capacity, flow: 0 });
        Ok(id)
    }

    /// Adds an arc between two labelled vertices
    pub fn add_arc_between(&mut self, start: &str, end: &str, capacity: Capacity) -> Result<ArcId, GraphError> {
        let start = self.vertex_by_label(start)?;
        let end = self.vertex_by_label(end)?;
        self.add_arc(start, end, capacity)
    }

    /// Builds a graph from vertex labels and `(start, end, capacity)` triples
    pub fn from_arcs(labels: &[&str], arcs: &[(&str, &str, Capacity)]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for label in labels {
            graph.add_vertex(*label)?;
        }
        for (start, end, capacity) in arcs {
            graph.add_arc_between(start, end, *capacity)?;
        }
        Ok(graph)
    }

    pub fn vertex_by_label(&self, label: &str) -> Result<NodeId, GraphError> {
        self.by_label
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::UnknownLabel(label.to_owned()))
    }

    pub fn label(&self, vertex: NodeId) -> Option<&str> {
        self.labels.get(vertex.0).map(String::as_str)
    }

    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.labels.len()).map(NodeId)
    }

    pub fn arcs(&self) -> &[FlowArc] {
        &self.arcs
    }

    pub fn arc(&self, id: ArcId) -> Option<&FlowArc> {
        self.arcs.get(id.0)
    }

    /// Overwrites the flow of one arc with a value read back from the residual graph
    pub(crate) fn set_flow(&mut self, id: ArcId, flow: Flow) {
        let arc = &mut self.arcs[id.0];
        debug_assert!((0..=arc.capacity).contains(&flow), "flow {} outside [0, {}]", flow, arc.capacity);
        arc.flow = flow;
    }

    /// Clears the flow on every arc
    pub fn reset_flows(&mut self) {
        for arc in &mut self.arcs {
            arc.flow = 0;
        }
    }

    /// Sum of flow on arcs entering `vertex`
    pub fn inflow(&self, vertex: NodeId) -> Flow {
        self.arcs.iter().filter(|a| a.end == vertex).map(|a| a.flow).sum()
    }

    /// Sum of flow on arcs leaving `vertex`
    pub fn outflow(&self, vertex: NodeId) -> Flow {
        self.arcs.iter().filter(|a| a.start == vertex).map(|a| a.flow).sum()
    }

    /// Net flow leaving `source`, i.e. the value of the current flow
    pub fn flow_value(&self, source: NodeId) -> Flow {
        self.outflow(source) - self.inflow(source)
    }

    /// Vertices reachable from `from` along arcs of positive capacity
    pub fn reachable_from(&self, from: NodeId) -> Vec<bool> {
        let mut seen = vec![false; self.labels.len()];
        let mut queue = VecDeque::new();
        if let Some(slot) = seen.get_mut(from.0) {
            *slot = true;
            queue.push_back(from);
        }
        while let Some(u) = queue.pop_front() {
            for arc in self.arcs.iter().filter(|a| a.start == u && a.capacity > 0) {
                if !seen[arc.end.0] {
                    seen[arc.end.0] = true;
                    queue.push_back(arc.end);
                }
            }
        }
        seen
    }

    /// Rejects graphs where the capacities entering or leaving one vertex sum past `Flow::MAX`
    ///
    /// Excess, residual capacity and flow value are all bounded by these sums,
    /// so an accepted graph cannot overflow during a run.
    fn check_capacity_sums(&self) -> Result<(), GraphError> {
        let mut incoming: Vec<Option<Flow>> = vec![Some(0); self.labels.len()];
        let mut outgoing: Vec<Option<Flow>> = vec![Some(0); self.labels.len()];
        for arc in &self.arcs {
            incoming[arc.end.0] = incoming[arc.end.0].and_then(|sum| sum.checked_add(arc.capacity));
            outgoing[arc.start.0] = outgoing[arc.start.0].and_then(|sum| sum.checked_add(arc.capacity));
        }
        for (v, label) in self.labels.iter().enumerate() {
            let direction = if incoming[v].is_none() {
                "into"
            } else if outgoing[v].is_none() {
                "out of"
            } else {
                continue;
            };
            return Err(GraphError::CapacityOverflow {
                vertex: label.clone(),
                direction,
            });
        }
        Ok(())
    }

    fn check_vertex(&self, vertex: NodeId) -> Result<(), GraphError> {
        if vertex.0 < self.labels.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(vertex))
        }
    }
}

/// Serialized graph shape, re-validated on the way in
#[derive(Deserialize)]
struct GraphRepr {
    labels: Vec<String>,
    arcs: Vec<FlowArc>,
}

impl TryFrom<GraphRepr> for FlowGraph {
    type Error = GraphError;

    fn try_from(repr: GraphRepr) -> Result<Self, Self::Error> {
        let mut graph = FlowGraph::new();
        for label in repr.labels {
            graph.add_vertex(label)?;
        }
        for arc in repr.arcs {
            let id = graph.add_arc(arc.start, arc.end, arc.capacity)?;
            graph.set_flow(id, arc.flow.clamp(0, arc.capacity));
        }
        Ok(graph)
    }
}

/// A flow graph with a designated source and target
#[derive(Debug, Clone, Serialize)]
pub struct MaxFlowProblem {
    graph: FlowGraph,
    source: NodeId,
    target: NodeId,
}

impl MaxFlowProblem {
    /// Validates the endpoints and freezes the topology
    pub fn new(graph: FlowGraph, source: NodeId, target: NodeId) -> Result<Self, GraphError> {
        graph.check_vertex(source)?;
        graph.check_vertex(target)?;
        if source == target {
            return Err(GraphError::SourceEqualsTarget(graph.labels[source.0].clone()));
        }
        graph.check_capacity_sums()?;
        if !graph.reachable_from(source)[target.0] {
            warn!(
                "Target {:?} is unreachable from source {:?}; the maximum flow is zero",
                graph.labels[target.0], graph.labels[source.0]
            );
        }
        Ok(Self { graph, source, target })
    }

    /// Same as [`MaxFlowProblem::new`] with endpoints given by label
    pub fn with_labels(graph: FlowGraph, source: &str, target: &str) -> Result<Self, GraphError> {
        let source = graph.vertex_by_label(source)?;
        let target = graph.vertex_by_label(target)?;
        Self::new(graph, source, target)
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut FlowGraph {
        &mut self.graph
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_terminal(&self, vertex: NodeId) -> bool {
        vertex == self.source || vertex == self.target
    }

    pub fn into_graph(self) -> FlowGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_construction() {
        let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 1)]).unwrap();

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.arc_count(), 2);
        assert_eq!(graph.vertex_by_label("A").unwrap(), NodeId(1));
        assert_eq!(graph.label(NodeId(2)), Some("T"));
        assert!(graph.arcs().iter().all(|a| a.flow == 0));
    }

    #[test]
    fn test_rejects_negative_capacity() {
        let mut graph = FlowGraph::new();
        let s = graph.add_vertex("S").unwrap();
        let t = graph.add_vertex("T").unwrap();

        let err = graph.add_arc(s, t, -4).unwrap_err();
        assert_eq!(
            err,
            GraphError::NegativeCapacity { start: "S".into(), end: "T".into(), capacity: -4 }
        );
        assert!(err.to_string().contains("S -> T"));
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_vertices() {
        let mut graph = FlowGraph::new();
        let s = graph.add_vertex("S").unwrap();

        assert_eq!(graph.add_vertex("S"), Err(GraphError::DuplicateLabel("S".into())));
        assert_eq!(graph.add_arc(s, NodeId(7), 1), Err(GraphError::UnknownVertex(NodeId(7))));
        assert!(graph.add_arc_between("S", "X", 1).is_err());
    }

    #[test]
    fn test_problem_validation() {
        let graph = FlowGraph::from_arcs(&["S", "T"], &[("S", "T", 7)]).unwrap();

        let err = MaxFlowProblem::with_labels(graph.clone(), "S", "S").unwrap_err();
        assert_eq!(err, GraphError::SourceEqualsTarget("S".into()));
        assert!(MaxFlowProblem::new(graph.clone(), NodeId(0), NodeId(9)).is_err());

        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();
        assert!(problem.is_terminal(NodeId(0)));
        assert!(problem.is_terminal(NodeId(1)));
    }

    #[test]
    fn test_rejects_capacity_sums_past_flow_range() {
        let graph = FlowGraph::from_arcs(
            &["S", "A", "T"],
            &[("S", "A", Capacity::MAX), ("S", "A", Capacity::MAX), ("A", "T", 1)],
        )
        .unwrap();
        let err = MaxFlowProblem::with_labels(graph, "S", "T").unwrap_err();
        assert_eq!(err, GraphError::CapacityOverflow { vertex: "A".into(), direction: "into" });
        assert!(err.to_string().contains("\"A\""));

        let fan_out = FlowGraph::from_arcs(
            &["S", "A", "B", "T"],
            &[("S", "A", Capacity::MAX), ("A", "T", Capacity::MAX), ("A", "B", 1), ("B", "T", 1)],
        )
        .unwrap();
        assert_eq!(
            MaxFlowProblem::with_labels(fan_out, "S", "T").unwrap_err(),
            GraphError::CapacityOverflow { vertex: "A".into(), direction: "out of" }
        );

        // A single maximal arc per vertex still fits
        let edge = FlowGraph::from_arcs(&["S", "T"], &[("S", "T", Capacity::MAX)]).unwrap();
        assert!(MaxFlowProblem::with_labels(edge, "S", "T").is_ok());
    }

    #[test]
    fn test_disconnected_problem_is_accepted() {
        let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 5)]).unwrap();
        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();

        assert!(!problem.graph().reachable_from(problem.source())[problem.target().0]);
    }

    #[test]
    fn test_flow_accounting() {
        let mut graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 1)]).unwrap();
        graph.set_flow(ArcId(0), 1);
        graph.set_flow(ArcId(1), 1);

        assert_eq!(graph.flow_value(NodeId(0)), 1);
        assert_eq!(graph.inflow(NodeId(1)), graph.outflow(NodeId(1)));
        assert_eq!(graph.arc(ArcId(0)).unwrap().residual_capacity(), 2);

        graph.reset_flows();
        assert_eq!(graph.flow_value(NodeId(0)), 0);
    }

    #[test]
    fn test_json_round_trip_revalidates() {
        let graph = FlowGraph::from_arcs(&["S", "T"], &[("S", "T", 7)]).unwrap();
        let json = serde_json::to_string(&graph).unwrap();
        let back: FlowGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vertex_by_label("T").unwrap(), NodeId(1));
        assert_eq!(back.arcs(), graph.arcs());

        let bad = r#"{"labels":["S","T"],"arcs":[{"start":0,"end":1,"capacity":-1,"flow":0}]}"#;
        assert!(serde_json::from_str::<FlowGraph>(bad).is_err());
    }
}
