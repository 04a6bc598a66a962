//! Minimum s-t cut extraction
//!
//! Once no augmenting path remains, the vertices reachable from the source
//! in the residual graph form the source side of a minimum cut. Every
//! original arc leaving that side is saturated, and their capacities sum to
//! the maximum flow value (max-flow min-cut theorem).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::{ArcId, Capacity, FlowGraph};
use crate::data_structures::residual::ResidualGraph;

/// Source side, crossing arcs and capacity of an s-t cut
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCut {
    /// Vertices on the source side, in ascending order
    pub source_side: Vec<NodeId>,
    /// Original arcs from the source side to the target side
    pub arcs: Vec<ArcId>,
    /// Total capacity of `arcs`
    pub capacity: Capacity,
}

impl MinCut {
    /// Cut induced by residual reachability from `source`
    pub fn from_residual(graph: &FlowGraph, residual: &ResidualGraph, source: NodeId) -> Self {
        let side = residual_reachable(residual, source);
        let arcs: Vec<ArcId> = graph
            .arcs()
            .iter()
            .enumerate()
            .filter(|(_, a)| side[a.start.0] && !side[a.end.0])
            .map(|(k, _)| ArcId(k))
            .collect();

        Self {
            source_side: (0..side.len()).filter(|&v| side[v]).map(NodeId).collect(),
            capacity: cut_capacity(graph, &arcs),
            arcs,
        }
    }

    pub fn contains(&self, vertex: NodeId) -> bool {
        self.source_side.binary_search(&vertex).is_ok()
    }
}

/// Vertices reachable from `from` over residual arcs with positive capacity
pub fn residual_reachable(residual: &ResidualGraph, from: NodeId) -> Vec<bool> {
    let mut seen = vec![false; residual.vertex_count()];
    let mut queue = VecDeque::new();
    if let Some(slot) = seen.get_mut(from.0) {
        *slot = true;
        queue.push_back(from);
    }
    while let Some(u) = queue.pop_front() {
        for &a in &residual.vertices()[u.0].incident {
            let arc = &residual.arcs()[a.0];
            if arc.residual > 0 && !seen[arc.end.0] {
                seen[arc.end.0] = true;
                queue.push_back(arc.end);
            }
        }
    }
    seen
}

pub fn cut_capacity(graph: &FlowGraph, arcs: &[ArcId]) -> Capacity {
    arcs.iter().filter_map(|&k| graph.arc(k)).map(|a| a.capacity).sum()
}
