//! Highest-label push-relabel (Goldberg-Tarjan preflow-push)
//!
//! # Theoretical Foundation
//!
//! A *preflow* relaxes flow conservation: inner vertices may hold positive
//! excess. Together with a *valid labeling* `h` (for every residual arc
//! `(u, v)` with positive capacity, `h(u) <= h(v) + 1`, with `h(s) = |V|` and
//! `h(t) = 0`) the preflow certifies that no augmenting path exists, so once
//! every excess has been discharged the preflow is a maximum flow.
//!
//! Two local operations maintain both properties:
//! - **push** moves `min(excess(u), residual(u, v))` along an admissible arc
//!   (`h(u) == h(v) + 1`)
//! - **relabel** lifts `u` to `1 + min h(v)` over its open residual arcs once
//!   no admissible arc remains
//!
//! Every active vertex keeps a residual path back to the source, which bounds
//! every non-source height by `2|V| - 1` and the number of relabels by
//! `2|V|²`. Processing a vertex of maximum height first gives the
//! `O(|V|²√|A|)` bound of the highest-label rule.
//!
//! # Execution model
//!
//! The engine is a step machine: one call to [`MaxFlowAlgorithm::run_step`]
//! performs exactly one initialization, push, relabel or finish transition.
//! Each vertex keeps a current-arc cursor so a discharge resumes where it
//! left off instead of rescanning its incident list.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::time::Instant;

use log::{debug, trace};

use crate::algorithm::config::SolverConfig;
use crate::algorithm::graph::max_flow::{drive, FlowBase};
use crate::algorithm::state::{EngineState, FlowMetrics};
use crate::algorithm::traits::{AlgorithmComplexity, AlgorithmError, MaxFlowAlgorithm, NodeId};
use crate::data_structures::graph::{Flow, FlowGraph, MaxFlowProblem};
use crate::data_structures::priority_queue::{ActiveVertexQueue, SelectionRule};
use crate::data_structures::residual::{ResArcId, ResidualGraph};
use crate::execution::tracer::{FlowEvent, FlowObserver, NullObserver};

/// Push-relabel maximum flow engine
#[derive(Debug)]
pub struct PushRelabel<O: FlowObserver = NullObserver> {
    base: FlowBase<O>,
    active: ActiveVertexQueue,
}

impl PushRelabel<NullObserver> {
    /// Engine with the default configuration and no observer
    pub fn new(problem: MaxFlowProblem) -> Self {
        Self::with_config(problem, SolverConfig::default(), NullObserver)
    }
}

impl<O: FlowObserver> PushRelabel<O> {
    pub fn with_observer(problem: MaxFlowProblem, observer: O) -> Self {
        Self::with_config(problem, SolverConfig::default(), observer)
    }

    pub fn with_config(problem: MaxFlowProblem, config: SolverConfig, observer: O) -> Self {
        let active = ActiveVertexQueue::new(config.selection, problem.graph().vertex_count());
        Self {
            base: FlowBase::new(problem, config, observer),
            active,
        }
    }

    pub fn base(&self) -> &FlowBase<O> {
        &self.base
    }

    pub fn state(&self) -> EngineState {
        self.base.state()
    }

    pub fn selection(&self) -> SelectionRule {
        self.active.rule()
    }

    /// Vertex the next step will discharge, if any
    pub fn active_head(&self) -> Option<NodeId> {
        self.active.head()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn observer(&self) -> &O {
        self.base.observer()
    }

    pub fn into_observer(self) -> O {
        self.base.into_observer()
    }

    /// Lifts the source to `|V|` and saturates every arc leaving it
    fn initialize(&mut self) -> Result<FlowEvent, AlgorithmError> {
        let source = self.base.problem.source();
        let source_height = self.base.residual.vertex_count();
        self.base.residual.set_height(source, source_height)?;

        let incident = self.base.residual.vertex(source)?.incident.clone();
        let mut saturated = Vec::new();
        let mut activated = Vec::new();

        for arc in incident {
            let (end, residual) = {
                let a = self.base.residual.arc(arc)?;
                (a.end, a.residual)
            };
            if residual <= 0 || end == source {
                continue;
            }
            self.base.residual.add_flow(arc, residual)?;
            self.base.sync_arc(arc)?;
            saturated.push(arc);

            if !self.base.problem.is_terminal(end)
                && self.base.residual.excess(end) > 0
                && self.active.insert(end, self.base.residual.height(end))
            {
                activated.push(end);
            }
        }

        self.base.state = EngineState::Active;
        debug!(
            "Preflow initialized: source height {}, {} arcs saturated, {} vertices active",
            source_height,
            saturated.len(),
            activated.len()
        );

        Ok(FlowEvent::Initialized {
            source_height,
            saturated,
            activated,
        })
    }

    /// One push or relabel on the head of the active set
    fn discharge_step(&mut self, vertex: NodeId) -> Result<FlowEvent, AlgorithmError> {
        while let Some(arc) = self.base.residual.current_res_arc(vertex)? {
            if self.base.residual.is_admissible(arc) {
                return self.push(vertex, arc);
            }
        }
        self.relabel(vertex)
    }

    fn push(&mut self, vertex: NodeId, arc: ResArcId) -> Result<FlowEvent, AlgorithmError> {
        let (to, original) = {
            let a = self.base.residual.arc(arc)?;
            (a.end, a.original)
        };

        if !self.base.problem.is_terminal(to) && self.base.residual.excess(to) == 0 {
            self.active.insert(to, self.base.residual.height(to));
        }

        let amount = self.base.residual.push_flow(arc)?;
        let saturating = self.base.residual.arc(arc)?.is_saturated();
        if !saturating {
            self.base.residual.retain_current_res_arc(vertex)?;
        }
        self.base.sync_arc(arc)?;

        if self.base.residual.excess(vertex) == 0 {
            let popped = self.active.pop_head();
            debug_assert_eq!(popped, Some(vertex), "discharged vertex must be the queue head");
        }

        self.base.metrics.record_push(saturating);
        trace!(
            "push {} along {} ({} -> {}){}",
            amount,
            arc,
            vertex,
            to,
            if saturating { " saturating" } else { "" }
        );

        Ok(FlowEvent::Push {
            arc,
            original,
            from: vertex,
            to,
            amount,
            saturating,
        })
    }

    fn relabel(&mut self, vertex: NodeId) -> Result<FlowEvent, AlgorithmError> {
        let old_height = self.base.residual.height(vertex);
        let height = self.base.residual.min_incident_res_arc_height(vertex)? + 1;
        debug_assert!(height > old_height, "relabel of {} must raise its height", vertex);

        self.base.residual.set_height(vertex, height)?;
        self.base.residual.reset_current_res_arc(vertex)?;
        self.active.relabel_head(height);

        self.base.metrics.record_relabel();
        trace!("relabel {}: {} -> {}", vertex, old_height, height);

        Ok(FlowEvent::Relabel {
            vertex,
            old_height,
            height,
        })
    }
}

impl<O: FlowObserver> MaxFlowAlgorithm for PushRelabel<O> {
    fn name(&self) -> &'static str {
        match self.active.rule() {
            SelectionRule::HighestLabel => "Push-Relabel (highest label)",
            SelectionRule::Fifo => "Push-Relabel (FIFO)",
        }
    }

    fn complexity(&self) -> AlgorithmComplexity {
        let time_complexity = match self.active.rule() {
            SelectionRule::HighestLabel => "O(V²√E)",
            SelectionRule::Fifo => "O(V³)",
        };
        AlgorithmComplexity {
            time_complexity: time_complexity.to_string(),
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
        let event = match self.base.state {
            EngineState::Finished => {
                return Ok(FlowEvent::Finished {
                    value: self.base.flow_value(),
                })
            }
            EngineState::Uninitialized => {
                self.base.check_step_limit()?;
                self.initialize()?
            }
            EngineState::Active => {
                self.base.check_step_limit()?;
                match self.active.head() {
                    Some(vertex) => self.discharge_step(vertex)?,
                    None => {
                        let name = self.name();
                        self.base.finish(name)
                    }
                }
            }
        };
        self.base.complete_step(&event)?;
        Ok(event)
    }

    fn is_finished(&self) -> bool {
        self.base.state == EngineState::Finished
    }

    fn reset(&mut self) {
        self.base.reset();
        self.active.clear();
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
