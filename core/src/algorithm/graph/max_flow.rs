//! Maximum flow solver family
//!
//! This module holds what every maximum flow variant shares: ownership of the
//! problem and its residual graph, flow read-back onto the original arcs,
//! augmenting-path application, step accounting and event emission. The
//! variants themselves ([`PushRelabel`] and [`EdmondsKarp`]) compose a
//! [`FlowBase`] and are unified behind [`MaxFlowAlgorithm`] by the tagged
//! [`MaxFlowSolver`] enum.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithm::config::SolverConfig;
use crate::algorithm::graph::edmonds_karp::EdmondsKarp;
use crate::algorithm::graph::min_cut::MinCut;
use crate::algorithm::graph::push_relabel::PushRelabel;
use crate::algorithm::state::{EngineState, FlowMetrics};
use crate::algorithm::traits::{AlgorithmComplexity, AlgorithmError, AlgorithmKind, MaxFlowAlgorithm};
use crate::data_structures::graph::{Flow, FlowGraph, MaxFlowProblem};
use crate::data_structures::residual::{FlowError, ResArcId, ResidualGraph};
use crate::execution::tracer::{FlowEvent, FlowObserver, NullObserver};
use crate::validation::correctness;

/// Flow augmenting path in the residual graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentingPath {
    /// The residual arcs that belong to this path, source first
    pub arcs: Vec<ResArcId>,
    /// Flow pushed along every arc of the path
    pub value: Flow,
}

impl AugmentingPath {
    pub fn new(arcs: Vec<ResArcId>, value: Flow) -> Self {
        Self { arcs, value }
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Smallest residual capacity along `arcs`
    pub fn bottleneck(residual: &ResidualGraph, arcs: &[ResArcId]) -> Result<Option<Flow>, FlowError> {
        let mut min = None;
        for &a in arcs {
            let capacity = residual.arc(a)?.residual;
            min = Some(min.map_or(capacity, |m: Flow| m.min(capacity)));
        }
        Ok(min)
    }
}

impl fmt::Display for AugmentingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} |", self.value)?;
        for (i, arc) in self.arcs.iter().enumerate() {
            let sep = if i == 0 { " " } else { " - " };
            write!(f, "{}{}", sep, arc)?;
        }
        Ok(())
    }
}

/// State shared by every flow engine
#[derive(Debug)]
pub struct FlowBase<O: FlowObserver> {
    pub(crate) problem: MaxFlowProblem,
    pub(crate) residual: ResidualGraph,
    pub(crate) state: EngineState,
    pub(crate) metrics: FlowMetrics,
    pub(crate) config: SolverConfig,
    pub(crate) observer: O,
}

impl<O: FlowObserver> FlowBase<O> {
    /// Takes ownership of `problem`; any flow it carries is cleared
    pub fn new(mut problem: MaxFlowProblem, config: SolverConfig, observer: O) -> Self {
        problem.graph_mut().reset_flows();
        let residual = ResidualGraph::from_graph(problem.graph());
        Self {
            problem,
            residual,
            state: EngineState::Uninitialized,
            metrics: FlowMetrics::default(),
            config,
            observer,
        }
    }

    pub fn problem(&self) -> &MaxFlowProblem {
        &self.problem
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    pub fn flow_value(&self) -> Flow {
        self.problem.graph().flow_value(self.problem.source())
    }

    /// Clears accumulated flow and rebuilds the residual graph from scratch
    pub fn reset(&mut self) {
        self.problem.graph_mut().reset_flows();
        self.residual = ResidualGraph::from_graph(self.problem.graph());
        self.state = EngineState::Uninitialized;
        self.metrics = FlowMetrics::default();
        debug!("Flow engine reset");
    }

    /// Applies `path.value` along every arc of `path`
    ///
    /// The whole path is checked before any arc is mutated.
    pub fn update_graphs(&mut self, path: &AugmentingPath) -> Result<(), FlowError> {
        if let Some(bottleneck) = AugmentingPath::bottleneck(&self.residual, &path.arcs)? {
            if bottleneck < path.value {
                let arc = path
                    .arcs
                    .iter()
                    .copied()
                    .find(|a| self.residual.arcs()[a.0].residual < path.value)
                    .unwrap_or(path.arcs[0]);
                return Err(FlowError::InsufficientCapacity {
                    arc,
                    requested: path.value,
                    available: bottleneck,
                });
            }
        }
        for &arc in &path.arcs {
            self.residual.add_flow(arc, path.value)?;
            self.sync_arc(arc)?;
        }
        Ok(())
    }

    /// Reads the flow of `arc`'s original arc back onto the graph
    pub fn sync_arc(&mut self, arc: ResArcId) -> Result<(), FlowError> {
        let original = self.residual.arc(arc)?.original;
        self.residual.write_back_arc(self.problem.graph_mut(), original);
        Ok(())
    }

    pub(crate) fn check_step_limit(&self) -> Result<(), AlgorithmError> {
        match self.config.step_limit {
            Some(limit) if self.metrics.steps >= limit => Err(AlgorithmError::ResourceExhausted(format!(
                "step limit {} reached before termination",
                limit
            ))),
            _ => Ok(()),
        }
    }

    /// Bookkeeping after a transition: count, verify, notify
    pub(crate) fn complete_step(&mut self, event: &FlowEvent) -> Result<(), AlgorithmError> {
        self.metrics.record_step();
        if self.config.verify_invariants {
            match self.state {
                EngineState::Finished => correctness::verify_flow(&self.problem, &self.residual)?,
                _ => correctness::verify_step(&self.problem, &self.residual)?,
            }
        }
        if self.observer.is_listening() {
            self.observer.on_event(event);
        }
        Ok(())
    }

    pub(crate) fn finish(&mut self, name: &str) -> FlowEvent {
        self.residual.write_back(self.problem.graph_mut());
        self.state = EngineState::Finished;
        let value = self.flow_value();
        info!(
            "{} finished: flow value {} ({} pushes, {} relabels, {} augmentations)",
            name,
            value,
            self.metrics.push_operations,
            self.metrics.relabel_operations,
            self.metrics.augmentations
        );
        FlowEvent::Finished { value }
    }
}

/// Drives a step function until it reports completion
pub(crate) fn drive<F>(mut step: F) -> Result<Flow, AlgorithmError>
where
    F: FnMut() -> Result<FlowEvent, AlgorithmError>,
{
    loop {
        if let FlowEvent::Finished { value } = step()? {
            return Ok(value);
        }
    }
}

/// Maximum flow result with detailed flow information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxFlowResult {
    pub algorithm: AlgorithmKind,
    /// Maximum flow value
    pub max_flow: Flow,
    /// Final flow on every original arc, by arc index
    pub arc_flows: Vec<Flow>,
    /// Minimum cut certifying optimality
    pub min_cut: MinCut,
    /// Algorithm performance metrics
    pub metrics: FlowMetrics,
}

/// Tagged dispatch over the maximum flow variants
#[derive(Debug)]
pub enum MaxFlowSolver<O: FlowObserver = NullObserver> {
    PushRelabel(PushRelabel<O>),
    EdmondsKarp(EdmondsKarp<O>),
}

macro_rules! dispatch {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            MaxFlowSolver::PushRelabel($engine) => $body,
            MaxFlowSolver::EdmondsKarp($engine) => $body,
        }
    };
}

impl MaxFlowSolver<NullObserver> {
    /// Builds the variant named by `config.algorithm` without an observer
    pub fn from_config(problem: MaxFlowProblem, config: SolverConfig) -> Self {
        Self::new(problem, config, NullObserver)
    }
}

impl<O: FlowObserver> MaxFlowSolver<O> {
    pub fn new(problem: MaxFlowProblem, config: SolverConfig, observer: O) -> Self {
        match config.algorithm {
            AlgorithmKind::PushRelabel => Self::PushRelabel(PushRelabel::with_config(problem, config, observer)),
            AlgorithmKind::EdmondsKarp => Self::EdmondsKarp(EdmondsKarp::with_config(problem, config, observer)),
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::PushRelabel(_) => AlgorithmKind::PushRelabel,
            Self::EdmondsKarp(_) => AlgorithmKind::EdmondsKarp,
        }
    }

    pub fn base(&self) -> &FlowBase<O> {
        dispatch!(self, engine => engine.base())
    }

    pub fn observer(&self) -> &O {
        self.base().observer()
    }

    pub fn into_observer(self) -> O {
        dispatch!(self, engine => engine.into_observer())
    }

    /// Summarizes a finished run
    pub fn result(&self) -> Result<MaxFlowResult, AlgorithmError> {
        if !self.is_finished() {
            return Err(AlgorithmError::NotFinished(self.name()));
        }
        let base = self.base();
        let graph = base.problem().graph();
        Ok(MaxFlowResult {
            algorithm: self.kind(),
            max_flow: base.flow_value(),
            arc_flows: graph.arcs().iter().map(|a| a.flow).collect(),
            min_cut: MinCut::from_residual(graph, &base.residual, base.problem().source()),
            metrics: base.metrics.clone(),
        })
    }
}

impl<O: FlowObserver> MaxFlowAlgorithm for MaxFlowSolver<O> {
    fn name(&self) -> &'static str {
        dispatch!(self, engine => engine.name())
    }

    fn complexity(&self) -> AlgorithmComplexity {
        dispatch!(self, engine => engine.complexity())
    }

    fn run(&mut self) -> Result<Flow, AlgorithmError> {
        dispatch!(self, engine => engine.run())
    }

    fn run_step(&mut self) -> Result<FlowEvent, AlgorithmError> {
        dispatch!(self, engine => engine.run_step())
    }

    fn is_finished(&self) -> bool {
        dispatch!(self, engine => engine.is_finished())
    }

    fn reset(&mut self) {
        dispatch!(self, engine => engine.reset())
    }

    fn graph(&self) -> &FlowGraph {
        dispatch!(self, engine => engine.graph())
    }

    fn residual_graph(&self) -> &ResidualGraph {
        dispatch!(self, engine => engine.residual_graph())
    }

    fn metrics(&self) -> &FlowMetrics {
        dispatch!(self, engine => engine.metrics())
    }

    fn flow_value(&self) -> Flow {
        dispatch!(self, engine => engine.flow_value())
    }
}

/// Solves `problem` with the variant named in `config`
pub fn solve(problem: MaxFlowProblem, config: &SolverConfig) -> Result<MaxFlowResult, AlgorithmError> {
    let mut solver = MaxFlowSolver::from_config(problem, config.clone());
    solver.run()?;
    solver.result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::NodeId;
    use crate::data_structures::graph::ArcId;
    use crate::data_structures::priority_queue::SelectionRule;
    use crate::execution::tracer::ExecutionTracer;
    use proptest::prelude::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn diamond() -> MaxFlowProblem {
        let graph = FlowGraph::from_arcs(
            &["S", "A", "B", "T"],
            &[("S", "A", 10), ("S", "B", 10), ("A", "T", 5), ("B", "T", 10), ("A", "B", 5)],
        )
        .unwrap();
        MaxFlowProblem::with_labels(graph, "S", "T").unwrap()
    }

    fn all_configs() -> Vec<SolverConfig> {
        vec![
            SolverConfig::default(),
            SolverConfig::default().with_selection(SelectionRule::Fifo),
            SolverConfig::default().with_algorithm(AlgorithmKind::EdmondsKarp),
        ]
    }

    /// Capacity of the cheapest source/target cut, by enumerating every vertex subset
    fn brute_force_min_cut(problem: &MaxFlowProblem) -> Flow {
        let graph = problem.graph();
        let n = graph.vertex_count();
        let (s, t) = (problem.source().0, problem.target().0);
        (0u32..(1 << n))
            .filter(|mask| mask & (1 << s) != 0 && mask & (1 << t) == 0)
            .map(|mask| {
                graph
                    .arcs()
                    .iter()
                    .filter(|a| mask & (1 << a.start.0) != 0 && mask & (1 << a.end.0) == 0)
                    .map(|a| a.capacity)
                    .sum::<Flow>()
            })
            .min()
            .unwrap_or(0)
    }

    #[test]
    fn test_augmenting_path_display() {
        let path = AugmentingPath::new(vec![ResArcId(0), ResArcId(3)], 4);
        assert_eq!(path.to_string(), "4 | r0 - r3");
        assert_eq!(path.len(), 2);
        assert!(!path.is_empty());
    }

    #[test]
    fn test_update_graphs_applies_path() {
        init_logger();
        let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 2)]).unwrap();
        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();
        let mut base = FlowBase::new(problem, SolverConfig::default(), NullObserver);

        let path = AugmentingPath::new(vec![ResArcId::forward_of(ArcId(0)), ResArcId::forward_of(ArcId(1))], 2);
        base.update_graphs(&path).unwrap();

        assert_eq!(base.flow_value(), 2);
        assert_eq!(base.problem().graph().arcs()[0].flow, 2);
        assert_eq!(base.residual.excess(NodeId(1)), 0);
        assert_eq!(base.residual.excess(NodeId(2)), 2);
    }

    #[test]
    fn test_update_graphs_rejects_oversized_path_atomically() {
        let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 1)]).unwrap();
        let problem = MaxFlowProblem::with_labels(graph, "S", "T").unwrap();
        let mut base = FlowBase::new(problem, SolverConfig::default(), NullObserver);

        let path = AugmentingPath::new(vec![ResArcId(0), ResArcId(2)], 2);
        let err = base.update_graphs(&path).unwrap_err();

        assert_eq!(
            err,
            FlowError::InsufficientCapacity { arc: ResArcId(2), requested: 2, available: 1 }
        );
        assert_eq!(base.residual.arcs()[0].residual, 3);
        assert_eq!(base.flow_value(), 0);
    }

    #[test]
    fn test_diamond_all_variants() {
        init_logger();
        for config in all_configs() {
            let result = solve(diamond(), &config).unwrap();
            assert_eq!(result.max_flow, 15, "{:?}", config);
            assert_eq!(result.min_cut.capacity, 15);
            assert!(!result.min_cut.contains(NodeId(3)));
            assert_eq!(result.arc_flows[2], 5);
            assert_eq!(result.arc_flows[3], 10);
        }
    }

    #[test]
    fn test_solver_dispatch() {
        let mut solver = MaxFlowSolver::from_config(diamond(), SolverConfig::default());
        assert_eq!(solver.kind(), AlgorithmKind::PushRelabel);
        assert_eq!(solver.name(), "Push-Relabel (highest label)");
        assert!(matches!(solver.result(), Err(AlgorithmError::NotFinished(_))));

        assert_eq!(solver.run().unwrap(), 15);
        assert!(solver.is_finished());
        assert_eq!(solver.flow_value(), 15);
        assert!(solver.metrics().steps > 0);

        solver.reset();
        assert!(!solver.is_finished());
        assert_eq!(solver.flow_value(), 0);
        assert!(solver.graph().arcs().iter().all(|a| a.flow == 0));
    }

    #[test]
    fn test_solver_with_tracer() {
        let config = SolverConfig::default().with_algorithm(AlgorithmKind::EdmondsKarp);
        let mut solver = MaxFlowSolver::new(diamond(), config, ExecutionTracer::new());
        solver.run().unwrap();

        let tracer = solver.into_observer();
        let augmentations = tracer
            .events()
            .filter(|e| matches!(e, FlowEvent::Augment { .. }))
            .count();
        assert_eq!(augmentations, 2);
        assert!(tracer.events().last().unwrap().is_finished());
    }

    #[test]
    fn test_result_serializes() {
        let result = solve(diamond(), &SolverConfig::default()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: MaxFlowResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    prop_compose! {
        fn arb_problem()(n in 2usize..7)
            (arcs in prop::collection::vec((0..n, 0..n, 0i64..12), 0..18), n in Just(n))
            -> MaxFlowProblem
        {
            let mut graph = FlowGraph::new();
            for i in 0..n {
                graph.add_vertex(format!("v{}", i)).unwrap();
            }
            for (u, v, c) in arcs {
                graph.add_arc(NodeId(u), NodeId(v), c).unwrap();
            }
            MaxFlowProblem::new(graph, NodeId(0), NodeId(n - 1)).unwrap()
        }
    }

    proptest! {
        #[test]
        fn test_max_flow_equals_min_cut(problem in arb_problem()) {
            let expected = brute_force_min_cut(&problem);
            for config in all_configs() {
                let result = solve(problem.clone(), &config.with_invariant_checks()).unwrap();
                prop_assert_eq!(result.max_flow, expected);
                prop_assert_eq!(result.min_cut.capacity, expected);
            }
        }

        #[test]
        fn test_step_mode_matches_batch_mode(problem in arb_problem()) {
            for config in all_configs() {
                let mut batch = MaxFlowSolver::from_config(problem.clone(), config.clone());
                batch.run().unwrap();

                let mut stepped = MaxFlowSolver::from_config(problem.clone(), config);
                while !stepped.is_finished() {
                    stepped.run_step().unwrap();
                }
                prop_assert_eq!(batch.graph().arcs(), stepped.graph().arcs());
                prop_assert_eq!(batch.metrics().steps, stepped.metrics().steps);
            }
        }

        #[test]
        fn test_reset_then_run_is_idempotent(problem in arb_problem()) {
            let mut solver = MaxFlowSolver::from_config(problem, SolverConfig::default());
            let first = solver.run().unwrap();
            let flows: Vec<Flow> = solver.graph().arcs().iter().map(|a| a.flow).collect();

            solver.reset();
            prop_assert_eq!(solver.run().unwrap(), first);
            let again: Vec<Flow> = solver.graph().arcs().iter().map(|a| a.flow).collect();
            prop_assert_eq!(again, flows);
        }
    }
}
