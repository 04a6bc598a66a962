//! Execution tracing for step-wise flow algorithms
//!
//! Engines report every state transition as a [`FlowEvent`] to a
//! [`FlowObserver`]. The observer is the only coupling point to consumers
//! such as visualization drivers: events are plain data and carry residual
//! arc, original arc and vertex identities, never rendering concerns.
//!
//! The default [`NullObserver`] reports `is_listening() == false`, so engines
//! skip notification entirely; with monomorphization the check folds away.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::AugmentingPath;
use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::{ArcId, Flow};
use crate::data_structures::residual::{DistanceLabel, ResArcId};

/// State transition emitted by a flow engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowEvent {
    /// Source arcs saturated and initial active vertices selected
    Initialized {
        source_height: DistanceLabel,
        saturated: Vec<ResArcId>,
        activated: Vec<NodeId>,
    },
    /// Flow pushed along one admissible residual arc
    Push {
        arc: ResArcId,
        original: ArcId,
        from: NodeId,
        to: NodeId,
        amount: Flow,
        saturating: bool,
    },
    /// Vertex height raised after its incident arcs were exhausted
    Relabel {
        vertex: NodeId,
        old_height: DistanceLabel,
        height: DistanceLabel,
    },
    /// Flow applied along a whole augmenting path
    Augment { path: AugmentingPath },
    /// No further mutation will happen
    Finished { value: Flow },
}

impl FlowEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, FlowEvent::Finished { .. })
    }
}

/// Receiver of engine events
pub trait FlowObserver: fmt::Debug {
    fn on_event(&mut self, event: &FlowEvent);

    /// Engines still build and return events but skip `on_event` when this returns `false`
    fn is_listening(&self) -> bool {
        true
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl FlowObserver for NullObserver {
    #[inline]
    fn on_event(&mut self, _event: &FlowEvent) {}

    #[inline]
    fn is_listening(&self) -> bool {
        false
    }
}

impl<O: FlowObserver + ?Sized> FlowObserver for &mut O {
    fn on_event(&mut self, event: &FlowEvent) {
        (**self).on_event(event)
    }

    fn is_listening(&self) -> bool {
        (**self).is_listening()
    }
}

impl FlowObserver for Box<dyn FlowObserver> {
    fn on_event(&mut self, event: &FlowEvent) {
        (**self).on_event(event)
    }

    fn is_listening(&self) -> bool {
        (**self).is_listening()
    }
}

/// Adapter turning a closure into an observer
pub struct FnObserver<F>(pub F);

impl<F> fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnObserver")
    }
}

impl<F: FnMut(&FlowEvent)> FlowObserver for FnObserver<F> {
    fn on_event(&mut self, event: &FlowEvent) {
        (self.0)(event)
    }
}

/// Numbered event in a recorded trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePoint {
    pub step: usize,
    pub event: FlowEvent,
}

/// Observer recording the full event sequence of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTracer {
    trace: Vec<TracePoint>,
}

impl ExecutionTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace(&self) -> &[TracePoint] {
        &self.trace
    }

    pub fn events(&self) -> impl Iterator<Item = &FlowEvent> {
        self.trace.iter().map(|p| &p.event)
    }

    pub fn push_count(&self) -> usize {
        self.events().filter(|e| matches!(e, FlowEvent::Push { .. })).count()
    }

    pub fn relabel_count(&self) -> usize {
        self.events().filter(|e| matches!(e, FlowEvent::Relabel { .. })).count()
    }

    /// Heights assigned to `vertex` by relabels, in order
    pub fn height_history(&self, vertex: NodeId) -> Vec<DistanceLabel> {
        self.events()
            .filter_map(|e| match e {
                FlowEvent::Relabel { vertex: v, height, .. } if *v == vertex => Some(*height),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.trace.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.trace)
    }
}

impl FlowObserver for ExecutionTracer {
    fn on_event(&mut self, event: &FlowEvent) {
        self.trace.push(TracePoint {
            step: self.trace.len(),
            event: event.clone(),
        });
    }
}
