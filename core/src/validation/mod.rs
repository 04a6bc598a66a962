//! Invariant verification for flow engines

pub mod correctness;

pub use self::correctness::{verify_flow, verify_step, InvariantViolation};
