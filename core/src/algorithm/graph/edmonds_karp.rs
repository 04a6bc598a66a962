//! Edmonds-Karp shortest augmenting paths
//!
//! Each step finds a shortest source-to-target path in the residual graph by
//! breadth-first search and pushes its bottleneck along every arc. Shortest
//! path lengths never decrease, which bounds the number of augmentations by
//! `O(|V||A|)`.
//!
//! The engine shares [`FlowBase`] with push-relabel and applies paths through
//! [`FlowBase::update_graphs`], so it doubles as an independent cross-check
//! of the residual bookkeeping.

use std::collections::VecDeque;
use std::time::Instant;

use log::trace;

use crate::algorithm::config::SolverConfig;
use crate::algorithm::graph::max_flow::{drive, AugmentingPath, FlowBase};
use crate::algorithm::state::{EngineState, FlowMetrics};
use crate::algorithm::traits::{AlgorithmComplexity, AlgorithmError, MaxFlowAlgorithm};
use crate::data_structures::graph::{Flow, FlowGraph, MaxFlowProblem};
use crate::data_structures::residual::{FlowError, ResArcId, ResidualGraph};
use crate::execution::tracer::{FlowEvent, FlowObserver, NullObserver};

/// Augmenting-path maximum flow engine
#[derive(Debug)]
pub struct EdmondsKarp<O: FlowObserver = NullObserver> {
    base: FlowBase<O>,
}

impl EdmondsKarp<NullObserver> {
    pub fn new(problem: MaxFlowProblem) -> Self {
        Self::with_config(problem, SolverConfig::default(), NullObserver)
    }
}

impl<O: FlowObserver> EdmondsKarp<O> {
    const NAME: &'static str = "Edmonds-Karp";

    pub fn with_observer(problem: MaxFlowProblem, observer: O) -> Self {
        Self::with_config(problem, SolverConfig::default(), observer)
    }

    pub fn with_config(problem: MaxFlowProblem, config: SolverConfig, observer: O) -> Self {
        Self {
            base: FlowBase::new(problem, config, observer),
        }
    }

    pub fn base(&self) -> &FlowBase<O> {
        &self.base
    }

    pub fn observer(&self) -> &O {
        self.base.observer()
    }

    pub fn into_observer(self) -> O {
        self.base.into_observer()
    }

    /// Shortest residual path from source to target, with its bottleneck
    pub fn shortest_path(&self) -> Result<Option<AugmentingPath>, FlowError> {
        let residual = &self.base.residual;
        let source = self.base.problem.source();
        let target = self.base.problem.target();

        let mut prev: Vec<Option<ResArcId>> = vec![None; residual.vertex_count()];
        let mut visited = vec![false; residual.vertex_count()];
        let mut queue = VecDeque::from([source]);
        visited[source.0] = true;

        while let Some(u) = queue.pop_front() {
            if u == target {
                break;
            }
            for &a in &residual.vertex(u)?.incident {
                let arc = residual.arc(a)?;
                if visited[arc.end.0] || arc.residual <= 0 {
                    continue;
                }
                visited[arc.end.0] = true;
                prev[arc.end.0] = Some(a);
                queue.push_back(arc.end);
            }
        }

        if !visited[target.0] {
            return Ok(None);
        }

        let mut arcs = Vec::new();
        let mut v = target;
        while let Some(a) = prev[v.0] {
            arcs.push(a);
            v = residual.arc(a)?.start;
        }
        arcs.reverse();

        Ok(AugmentingPath::bottleneck(residual, &arcs)?.map(|value| AugmentingPath::new(arcs, value)))
    }

    fn augment(&mut self) -> Result<FlowEvent, AlgorithmError> {
        match self.shortest_path()? {
            Some(path) => {
                self.base.update_graphs(&path)?;
                self.base.metrics.record_augmentation();
                trace!("augment {}", path);
                Ok(FlowEvent::Augment { path })
            }
            None => Ok(self.base.finish(Self::NAME)),
        }
    }
}

impl<O: FlowObserver> MaxFlowAlgorithm for EdmondsKarp<O> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity {
            time_complexity: "O(VE²)".to_string(),
            space_complexity: "O(V + E)".to_string(),
        }
    }

    fn run(&mut self) -> Result<Flow, AlgorithmError> {
        let start = Instant::now();
        let result = drive(|| self.run_step());
        self.base.metrics.execution_time += start.elapsed();
        result
    }

    fn run_step(&mut self) -> Result<FlowEvent, AlgorithmError> {
        if self.base.state == EngineState::Finished {
            return Ok(FlowEvent::Finished {
                value: self.base.flow_value(),
            });
        }
        self.base.check_step_limit()?;
        self.base.state = EngineState::Active;
        let event = self.augment()?;
        self.base.complete_step(&event)?;
        Ok(event)
    }

    fn is_finished(&self) -> bool {
        self.base.state == EngineState::Finished
    }

    fn reset(&mut self) {
        self.base.reset();
    }

    fn graph(&self) -> &FlowGraph {
        self.base.problem.graph()
    }

    fn residual_graph(&self) -> &ResidualGraph {
        &self.base.residual
    }

    fn metrics(&self) -> &FlowMetrics {
        &self.base.metrics
    }

    fn flow_value(&self) -> Flow {
        self.base.flow_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::NodeId;
    use crate::data_structures::graph::ArcId;
    use crate::execution::tracer::ExecutionTracer;

    fn diamond() -> MaxFlowProblem {
        let graph = FlowGraph::from_arcs(
            &["S", "A", "B", "T"],
            &[("S", "A", 10), ("S", "B", 10), ("A", "T", 5), ("B", "T", 10), ("A", "B", 5)],
        )
        .unwrap();
        MaxFlowProblem::with_labels(graph, "S", "T").unwrap()
    }

    #[test]
    fn test_shortest_path_prefers_fewest_arcs() {
        let engine = EdmondsKarp::new(diamond());
        let path = engine.shortest_path().unwrap().unwrap();

        assert_eq!(path.arcs, vec![ResArcId(0), ResArcId(4)]);
        assert_eq!(path.value, 5);
        assert_eq!(path.to_string(), "5 | r0 - r4");
    }

    #[test]
    fn test_augmentations() {
        let mut engine = EdmondsKarp::with_observer(diamond(), ExecutionTracer::new());
        assert_eq!(engine.run().unwrap(), 15);
        assert_eq!(engine.metrics().augmentations, 2);
        assert_eq!(engine.metrics().steps, 3);
        assert!(engine.shortest_path().unwrap().is_none());

        let values: Vec<Flow> = engine
            .observer()
            .events()
            .filter_map(|e| match e {
                FlowEvent::Augment { path } => Some(path.value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![5, 10]);
    }

    #[test]
    fn test_second_path_undoes_flow() {
        let graph = FlowGraph::from_arcs(
            &["S", "A", "B", "C", "D", "T"],
            &[
                ("S", "A", 1),
                ("A", "B", 1),
                ("B", "T", 1),
                ("S", "C", 1),
                ("C", "B", 1),
                ("A", "D", 1),
                ("D", "T", 1),
            ],
        )
        .unwrap();
        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();
        let config = SolverConfig::default().with_invariant_checks();
        let mut engine = EdmondsKarp::with_config(problem, config, ExecutionTracer::new());

        assert_eq!(engine.run().unwrap(), 2);
        // A -> B is cancelled by the second path
        assert_eq!(engine.graph().arcs()[1].flow, 0);
        assert_eq!(engine.graph().inflow(NodeId(5)), 2);

        let second = engine
            .observer()
            .events()
            .filter_map(|e| match e {
                FlowEvent::Augment { path } => Some(path.clone()),
                _ => None,
            })
            .nth(1)
            .unwrap();
        assert_eq!(second.len(), 5);
        assert!(second.arcs.contains(&ResArcId::backward_of(ArcId(1))));
    }

    #[test]
    fn test_unreachable_target() {
        let graph = FlowGraph::from_arcs(&["S", "T"], &[("T", "S", 3)]).unwrap();
        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();
        let mut engine = EdmondsKarp::new(problem);

        assert_eq!(engine.run_step().unwrap(), FlowEvent::Finished { value: 0 });
        assert!(engine.is_finished());
    }

    #[test]
    fn test_reset() {
        let mut engine = EdmondsKarp::new(diamond());
        engine.run().unwrap();
        engine.reset();
        assert_eq!(engine.base().state(), EngineState::Uninitialized);
        assert_eq!(engine.flow_value(), 0);
        assert_eq!(engine.run().unwrap(), 15);
    }
}
