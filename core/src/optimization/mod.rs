//! Parallel execution over independent flow problems

pub mod parallel;

pub use self::parallel::solve_batch;
