//! Flow Correctness Verification
//!
//! Executable checks for the invariants every flow engine maintains. Each
//! check inspects a problem together with the engine's residual graph and
//! reports the first violation found, naming the offending arc or vertex.
//!
//! # Invariants
//!
//! | check                              | holds                        |
//! |------------------------------------|------------------------------|
//! | [`check_capacity`]                 | always                       |
//! | [`check_residual_complementarity`] | always                       |
//! | [`check_flow_in_sync`]             | after every step             |
//! | [`check_excess_consistency`]       | always                       |
//! | [`check_preflow`]                  | always                       |
//! | [`check_valid_labeling`]           | after every step             |
//! | [`check_height_bound`]             | always                       |
//! | [`check_conservation`]             | once an engine has finished  |
//!
//! [`verify_step`] composes the checks that hold after every step;
//! [`verify_flow`] adds conservation for a finished run.

use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::{ArcId, Capacity, Flow, MaxFlowProblem};
use crate::data_structures::residual::{DistanceLabel, ResArcId, ResidualGraph};

/// A broken flow invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Arc {arc} carries flow {flow} outside [0, {capacity}]")]
    CapacityExceeded { arc: ArcId, flow: Flow, capacity: Capacity },

    #[error("Vertex {vertex} has inflow {inflow} but outflow {outflow}")]
    ConservationViolated { vertex: NodeId, inflow: Flow, outflow: Flow },

    #[error("Residual pair of {arc} sums to {forward} + {backward}, expected {capacity}")]
    ResidualMismatch {
        arc: ArcId,
        forward: Capacity,
        backward: Capacity,
        capacity: Capacity,
    },

    #[error("Arc {arc} holds flow {graph} but the residual graph implies {residual}")]
    FlowOutOfSync { arc: ArcId, graph: Flow, residual: Flow },

    #[error("Open residual arc {arc} drops from height {start_height} to {end_height}")]
    InvalidLabeling {
        arc: ResArcId,
        start_height: DistanceLabel,
        end_height: DistanceLabel,
    },

    #[error("Vertex {vertex} has height {height} above bound {bound}")]
    HeightOutOfBounds {
        vertex: NodeId,
        height: DistanceLabel,
        bound: DistanceLabel,
    },

    #[error("Vertex {vertex} has negative excess {excess}")]
    NegativeExcess { vertex: NodeId, excess: Flow },

    #[error("Vertex {vertex} records excess {recorded} but its arcs imply {expected}")]
    ExcessMismatch { vertex: NodeId, recorded: Flow, expected: Flow },

    #[error("Residual graph has {vertices} vertices and {arcs} arcs, expected {expected_vertices} and {expected_arcs}")]
    ShapeMismatch {
        vertices: usize,
        arcs: usize,
        expected_vertices: usize,
        expected_arcs: usize,
    },
}

pub fn check_shape(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    let graph = problem.graph();
    if residual.vertex_count() != graph.vertex_count() || residual.arcs().len() != 2 * graph.arc_count() {
        return Err(InvariantViolation::ShapeMismatch {
            vertices: residual.vertex_count(),
            arcs: residual.arcs().len(),
            expected_vertices: graph.vertex_count(),
            expected_arcs: 2 * graph.arc_count(),
        });
    }
    Ok(())
}

/// `0 <= flow <= capacity` on every original arc
pub fn check_capacity(problem: &MaxFlowProblem) -> Result<(), InvariantViolation> {
    for (k, arc) in problem.graph().arcs().iter().enumerate() {
        if arc.flow < 0 || arc.flow > arc.capacity {
            return Err(InvariantViolation::CapacityExceeded {
                arc: ArcId(k),
                flow: arc.flow,
                capacity: arc.capacity,
            });
        }
    }
    Ok(())
}

/// Inflow equals outflow at every vertex other than source and target
pub fn check_conservation(problem: &MaxFlowProblem) -> Result<(), InvariantViolation> {
    let graph = problem.graph();
    for vertex in graph.vertices().filter(|&v| !problem.is_terminal(v)) {
        let (inflow, outflow) = (graph.inflow(vertex), graph.outflow(vertex));
        if inflow != outflow {
            return Err(InvariantViolation::ConservationViolated { vertex, inflow, outflow });
        }
    }
    Ok(())
}

/// Forward plus backward residual equals capacity, both non-negative
pub fn check_residual_complementarity(
    problem: &MaxFlowProblem,
    residual: &ResidualGraph,
) -> Result<(), InvariantViolation> {
    check_shape(problem, residual)?;
    for (k, arc) in problem.graph().arcs().iter().enumerate() {
        let id = ArcId(k);
        let forward = residual.arcs()[ResArcId::forward_of(id).0].residual;
        let backward = residual.arcs()[ResArcId::backward_of(id).0].residual;
        if forward < 0 || backward < 0 || forward.checked_add(backward) != Some(arc.capacity) {
            return Err(InvariantViolation::ResidualMismatch {
                arc: id,
                forward,
                backward,
                capacity: arc.capacity,
            });
        }
    }
    Ok(())
}

/// Original arc flows match what the residual graph implies
pub fn check_flow_in_sync(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    check_shape(problem, residual)?;
    for (k, arc) in problem.graph().arcs().iter().enumerate() {
        let implied = residual.flow_of(ArcId(k));
        if arc.flow != implied {
            return Err(InvariantViolation::FlowOutOfSync {
                arc: ArcId(k),
                graph: arc.flow,
                residual: implied,
            });
        }
    }
    Ok(())
}

/// `height(start) <= height(end) + 1` on every open residual arc
pub fn check_valid_labeling(residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    for (i, arc) in residual.arcs().iter().enumerate() {
        if arc.residual <= 0 {
            continue;
        }
        let start_height = residual.height(arc.start);
        let end_height = residual.height(arc.end);
        if start_height > end_height + 1 {
            return Err(InvariantViolation::InvalidLabeling {
                arc: ResArcId(i),
                start_height,
                end_height,
            });
        }
    }
    Ok(())
}

/// Target stays at height 0, other non-source vertices below `2|V|`
pub fn check_height_bound(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    let bound = (2 * residual.vertex_count()).saturating_sub(1);
    for state in residual.vertices() {
        let limit = if state.id == problem.target() {
            0
        } else if state.id == problem.source() {
            continue;
        } else {
            bound
        };
        if state.height > limit {
            return Err(InvariantViolation::HeightOutOfBounds {
                vertex: state.id,
                height: state.height,
                bound: limit,
            });
        }
    }
    Ok(())
}

/// Every vertex except the source holds non-negative excess
pub fn check_preflow(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    for state in residual.vertices() {
        if state.id != problem.source() && state.excess < 0 {
            return Err(InvariantViolation::NegativeExcess {
                vertex: state.id,
                excess: state.excess,
            });
        }
    }
    Ok(())
}

/// Recorded excess equals net inflow over the original arcs
pub fn check_excess_consistency(
    problem: &MaxFlowProblem,
    residual: &ResidualGraph,
) -> Result<(), InvariantViolation> {
    let graph = problem.graph();
    let mut expected = vec![0 as Flow; graph.vertex_count()];
    for arc in graph.arcs() {
        expected[arc.end.0] += arc.flow;
        expected[arc.start.0] -= arc.flow;
    }
    for (state, expected) in residual.vertices().iter().zip(expected) {
        if state.excess != expected {
            return Err(InvariantViolation::ExcessMismatch {
                vertex: state.id,
                recorded: state.excess,
                expected,
            });
        }
    }
    Ok(())
}

/// Checks that hold after every engine step
pub fn verify_step(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    check_shape(problem, residual)?;
    check_capacity(problem)?;
    check_residual_complementarity(problem, residual)?;
    check_flow_in_sync(problem, residual)?;
    check_excess_consistency(problem, residual)?;
    check_preflow(problem, residual)?;
    check_valid_labeling(residual)?;
    check_height_bound(problem, residual)
}

/// Checks for a finished run: every step invariant plus conservation
pub fn verify_flow(problem: &MaxFlowProblem, residual: &ResidualGraph) -> Result<(), InvariantViolation> {
    verify_step(problem, residual)?;
    check_conservation(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::FlowGraph;

    fn chain() -> MaxFlowProblem {
        let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 1)]).unwrap();
        MaxFlowProblem::with_labels(graph, "S", "T").unwrap()
    }

    fn sync(problem: &mut MaxFlowProblem, residual: &ResidualGraph) {
        residual.write_back(problem.graph_mut());
    }

    #[test]
    fn test_fresh_residual_graph_passes() {
        let problem = chain();
        let residual = ResidualGraph::from_graph(problem.graph());
        assert_eq!(verify_flow(&problem, &residual), Ok(()));
    }

    #[test]
    fn test_preflow_is_not_a_flow() {
        let mut problem = chain();
        let mut residual = ResidualGraph::from_graph(problem.graph());
        residual.set_height(NodeId(0), 3).unwrap();
        residual.add_flow(ResArcId(0), 3).unwrap();
        sync(&mut problem, &residual);

        assert_eq!(verify_step(&problem, &residual), Ok(()));
        assert_eq!(
            verify_flow(&problem, &residual),
            Err(InvariantViolation::ConservationViolated { vertex: NodeId(1), inflow: 3, outflow: 0 })
        );
    }

    #[test]
    fn test_unsynced_flow_detected() {
        let problem = chain();
        let mut residual = ResidualGraph::from_graph(problem.graph());
        residual.add_flow(ResArcId(0), 1).unwrap();

        assert_eq!(
            check_flow_in_sync(&problem, &residual),
            Err(InvariantViolation::FlowOutOfSync { arc: ArcId(0), graph: 0, residual: 1 })
        );
        assert!(matches!(
            check_excess_consistency(&problem, &residual),
            Err(InvariantViolation::ExcessMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_labeling_detected() {
        let problem = chain();
        let mut residual = ResidualGraph::from_graph(problem.graph());
        residual.set_height(NodeId(1), 2).unwrap();

        assert_eq!(
            check_valid_labeling(&residual),
            Err(InvariantViolation::InvalidLabeling { arc: ResArcId(2), start_height: 2, end_height: 0 })
        );
    }

    #[test]
    fn test_height_bound() {
        let problem = chain();
        let mut residual = ResidualGraph::from_graph(problem.graph());
        residual.set_height(NodeId(0), 100).unwrap();
        residual.set_height(NodeId(1), 5).unwrap();
        assert_eq!(check_height_bound(&problem, &residual), Ok(()));

        residual.set_height(NodeId(1), 6).unwrap();
        assert_eq!(
            check_height_bound(&problem, &residual),
            Err(InvariantViolation::HeightOutOfBounds { vertex: NodeId(1), height: 6, bound: 5 })
        );

        residual.set_height(NodeId(1), 0).unwrap();
        residual.set_height(NodeId(2), 1).unwrap();
        assert!(check_height_bound(&problem, &residual).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let problem = chain();
        let other = FlowGraph::from_arcs(&["S", "T"], &[("S", "T", 1)]).unwrap();
        let residual = ResidualGraph::from_graph(&other);
        assert!(matches!(
            check_shape(&problem, &residual),
            Err(InvariantViolation::ShapeMismatch { expected_arcs: 4, .. })
        ));
        // Arc-indexed checks report the mismatch instead of reading past the arena
        assert!(matches!(
            check_residual_complementarity(&problem, &residual),
            Err(InvariantViolation::ShapeMismatch { arcs: 2, .. })
        ));
        assert!(matches!(
            check_flow_in_sync(&problem, &residual),
            Err(InvariantViolation::ShapeMismatch { arcs: 2, .. })
        ));
    }
}
