//! Event emission and trace recording for algorithm execution

pub mod tracer;

pub use self::tracer::{ExecutionTracer, FlowEvent, FlowObserver, FnObserver, NullObserver, TracePoint};
