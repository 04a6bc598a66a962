//! Residual graph arena with index-paired forward/backward arcs
//!
//! Every original arc `k` is represented by two residual arcs stored
//! contiguously in one arena: the forward arc at index `2k` and the backward
//! arc at index `2k + 1`. Each arc records the index of its reverse partner,
//! so the pairing is established once at construction and never reassigned.
//!
//! # Invariants
//! - `residual(2k) + residual(2k + 1) == capacity(k)` at all times
//! - `residual(2k + 1)` is the current flow on original arc `k`
//! - a vertex's `excess` equals its net inflow accumulated since construction
//!
//! Per-vertex state (height label, excess, current-arc cursor) lives next to
//! the arcs so that a push touches a single owner.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::{ArcId, Capacity, Flow, FlowGraph};

/// Height label type for push-relabel
pub type DistanceLabel = usize;

/// Residual arc identifier into the residual arena
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ResArcId(pub usize);

impl ResArcId {
    /// Forward residual arc of an original arc
    #[inline]
    pub fn forward_of(arc: ArcId) -> Self {
        Self(arc.0 * 2)
    }

    /// Backward residual arc of an original arc
    #[inline]
    pub fn backward_of(arc: ArcId) -> Self {
        Self(arc.0 * 2 + 1)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Precondition violations on residual-graph operations
///
/// None of these can occur while the engine's invariants hold; they surface
/// a broken invariant upstream rather than a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Cannot push along saturated residual arc {0}")]
    SaturatedArc(ResArcId),

    #[error("Cannot push from vertex {0} without positive excess")]
    NoExcess(NodeId),

    #[error("Vertex {0} has no incident residual arc with positive capacity")]
    NoResidualArc(NodeId),

    #[error("Residual arc {arc} holds {available} but {requested} was requested")]
    InsufficientCapacity {
        arc: ResArcId,
        requested: Flow,
        available: Capacity,
    },

    #[error("Unknown residual arc: {0}")]
    UnknownArc(ResArcId),

    #[error("Unknown vertex: {0}")]
    UnknownVertex(NodeId),
}

/// Residual arc carrying remaining pushable capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualArc {
    pub start: NodeId,
    pub end: NodeId,
    /// Remaining capacity in this direction
    pub residual: Capacity,
    /// Index of the paired reverse arc
    pub reverse: ResArcId,
    /// Original arc represented by this residual arc
    pub original: ArcId,
    /// `true` for the original direction, `false` for the undo direction
    pub forward: bool,
}

impl ResidualArc {
    pub fn is_saturated(&self) -> bool {
        self.residual <= 0
    }
}

/// Per-vertex push-relabel state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexState {
    pub id: NodeId,
    pub height: DistanceLabel,
    pub excess: Flow,
    /// Outgoing residual arcs in construction order
    pub incident: Vec<ResArcId>,
    cursor: usize,
}

impl VertexState {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            height: 0,
            excess: 0,
            incident: Vec::new(),
            cursor: 0,
        }
    }

    /// Position of the current-arc cursor in `incident`
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Residual graph: vertex states plus the residual arc arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResidualGraph {
    vertices: Vec<VertexState>,
    arcs: Vec<ResidualArc>,
}

impl ResidualGraph {
    /// Derives the residual graph of `graph` under its current flow
    pub fn from_graph(graph: &FlowGraph) -> Self {
        let mut vertices: Vec<VertexState> = graph.vertices().map(VertexState::new).collect();
        let mut arcs = Vec::with_capacity(graph.arc_count() * 2);

        for (k, arc) in graph.arcs().iter().enumerate() {
            let original = ArcId(k);
            let forward = ResArcId::forward_of(original);
            let backward = ResArcId::backward_of(original);

            arcs.push(ResidualArc {
                start: arc.start,
                end: arc.end,
                residual: arc.capacity - arc.flow,
                reverse: backward,
                original,
                forward: true,
            });
            arcs.push(ResidualArc {
                start: arc.end,
                end: arc.start,
                residual: arc.flow,
                reverse: forward,
                original,
                forward: false,
            });

            vertices[arc.start.0].incident.push(forward);
            vertices[arc.end.0].incident.push(backward);
        }

        info!(
            "Residual graph created: (|V|,|A|) = ({}, {})",
            vertices.len(),
            arcs.len()
        );

        Self { vertices, arcs }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[VertexState] {
        &self.vertices
    }

    pub fn arcs(&self) -> &[ResidualArc] {
        &self.arcs
    }

    pub fn vertex(&self, v: NodeId) -> Result<&VertexState, FlowError> {
        self.vertices.get(v.0).ok_or(FlowError::UnknownVertex(v))
    }

    pub fn arc(&self, a: ResArcId) -> Result<&ResidualArc, FlowError> {
        self.arcs.get(a.0).ok_or(FlowError::UnknownArc(a))
    }

    fn vertex_mut(&mut self, v: NodeId) -> Result<&mut VertexState, FlowError> {
        self.vertices.get_mut(v.0).ok_or(FlowError::UnknownVertex(v))
    }

    // The unchecked accessors below take ids produced by this graph itself;
    // callers holding foreign ids go through `vertex` / `arc` instead.

    pub(crate) fn height(&self, v: NodeId) -> DistanceLabel {
        self.vertices[v.0].height
    }

    pub(crate) fn excess(&self, v: NodeId) -> Flow {
        self.vertices[v.0].excess
    }

    pub fn set_height(&mut self, v: NodeId, height: DistanceLabel) -> Result<(), FlowError> {
        self.vertex_mut(v)?.height = height;
        Ok(())
    }

    /// Flow currently routed over original arc `arc`
    pub(crate) fn flow_of(&self, arc: ArcId) -> Flow {
        self.arcs[ResArcId::backward_of(arc).0].residual
    }

    /// An arc is admissible iff it has residual capacity and leads exactly one level down
    pub(crate) fn is_admissible(&self, a: ResArcId) -> bool {
        let arc = &self.arcs[a.0];
        arc.residual > 0 && self.vertices[arc.start.0].height == self.vertices[arc.end.0].height + 1
    }

    /// Pushes `min(residual, excess(start))` along `a` and returns the amount moved
    pub fn push_flow(&mut self, a: ResArcId) -> Result<Flow, FlowError> {
        let arc = self.arc(a)?;
        if arc.residual <= 0 {
            return Err(FlowError::SaturatedArc(a));
        }
        let excess = self.vertices[arc.start.0].excess;
        if excess <= 0 {
            return Err(FlowError::NoExcess(arc.start));
        }
        let amount = arc.residual.min(excess);
        self.transfer(a, amount);
        Ok(amount)
    }

    /// Moves a caller-chosen `value` along `a`, bounded by its residual capacity
    pub fn add_flow(&mut self, a: ResArcId, value: Flow) -> Result<(), FlowError> {
        let arc = self.arc(a)?;
        if value < 0 || value > arc.residual {
            return Err(FlowError::InsufficientCapacity {
                arc: a,
                requested: value,
                available: arc.residual,
            });
        }
        self.transfer(a, value);
        Ok(())
    }

    fn transfer(&mut self, a: ResArcId, amount: Flow) {
        let (start, end, reverse) = {
            let arc = &mut self.arcs[a.0];
            arc.residual -= amount;
            (arc.start, arc.end, arc.reverse)
        };
        self.arcs[reverse.0].residual += amount;
        self.vertices[start.0].excess -= amount;
        self.vertices[end.0].excess += amount;
    }

    /// Returns the arc under `v`'s cursor and advances the cursor
    pub fn current_res_arc(&mut self, v: NodeId) -> Result<Option<ResArcId>, FlowError> {
        let vertex = self.vertex_mut(v)?;
        let arc = vertex.incident.get(vertex.cursor).copied();
        if arc.is_some() {
            vertex.cursor += 1;
        }
        Ok(arc)
    }

    /// Steps the cursor back so the last returned arc is probed again
    pub fn retain_current_res_arc(&mut self, v: NodeId) -> Result<(), FlowError> {
        let vertex = self.vertex_mut(v)?;
        vertex.cursor = vertex.cursor.saturating_sub(1);
        Ok(())
    }

    pub fn reset_current_res_arc(&mut self, v: NodeId) -> Result<(), FlowError> {
        self.vertex_mut(v)?.cursor = 0;
        Ok(())
    }

    /// Minimum end-vertex height over `v`'s incident arcs with positive residual capacity
    pub fn min_incident_res_arc_height(&self, v: NodeId) -> Result<DistanceLabel, FlowError> {
        self.vertex(v)?
            .incident
            .iter()
            .map(|a| &self.arcs[a.0])
            .filter(|arc| arc.residual > 0)
            .map(|arc| self.vertices[arc.end.0].height)
            .min()
            .ok_or(FlowError::NoResidualArc(v))
    }

    /// Copies the flow of one original arc back onto `graph`
    pub(crate) fn write_back_arc(&self, graph: &mut FlowGraph, arc: ArcId) {
        graph.set_flow(arc, self.flow_of(arc));
    }

    /// Copies every original arc's flow back onto `graph`
    pub(crate) fn write_back(&self, graph: &mut FlowGraph) {
        for k in 0..self.arcs.len() / 2 {
            self.write_back_arc(graph, ArcId(k));
        }
    }
}
