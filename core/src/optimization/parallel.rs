//! Parallel batch solving
//!
//! Engines are single-threaded and exclusively own their residual graph, so
//! independent problems parallelize without any shared state: rayon's
//! work-stealing pool hands each problem to one engine and results are
//! collected in input order.

use log::debug;
use rayon::prelude::*;

use crate::algorithm::config::SolverConfig;
use crate::algorithm::graph::max_flow::{solve, MaxFlowResult};
use crate::algorithm::traits::AlgorithmError;
use crate::data_structures::graph::MaxFlowProblem;

/// Solves every problem with `config`, one engine per problem
///
/// The output has one entry per input problem, in the same order; a failure
/// on one problem does not affect the others.
pub fn solve_batch(
    problems: Vec<MaxFlowProblem>,
    config: &SolverConfig,
) -> Vec<Result<MaxFlowResult, AlgorithmError>> {
    debug!("Solving batch of {} flow problems", problems.len());
    problems
        .into_par_iter()
        .map(|problem| solve(problem, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::AlgorithmKind;
    use crate::data_structures::graph::FlowGraph;

    fn single_arc(capacity: i64) -> MaxFlowProblem {
        let graph = FlowGraph::from_arcs(&["S", "T"], &[("S", "T", capacity)]).unwrap();
        MaxFlowProblem::with_labels(graph, "S", "T").unwrap()
    }

    #[test]
    fn test_batch_preserves_order() {
        let problems: Vec<_> = (0..32).map(single_arc).collect();
        let results = solve_batch(problems, &SolverConfig::default());

        assert_eq!(results.len(), 32);
        for (capacity, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().max_flow, capacity as i64);
        }
    }

    #[test]
    fn test_batch_reports_failures_individually() {
        let chain = {
            let graph = FlowGraph::from_arcs(&["S", "A", "T"], &[("S", "A", 3), ("A", "T", 1)]).unwrap();
            MaxFlowProblem::with_labels(graph, "S", "T").unwrap()
        };
        let config = SolverConfig::default().with_step_limit(3);
        let results = solve_batch(vec![single_arc(4), chain], &config);

        assert_eq!(results[0].as_ref().unwrap().max_flow, 4);
        assert!(matches!(results[1], Err(AlgorithmError::ResourceExhausted(_))));
    }

    #[test]
    fn test_batch_with_edmonds_karp() {
        let config = SolverConfig::default().with_algorithm(AlgorithmKind::EdmondsKarp);
        let results = solve_batch(vec![single_arc(5), single_arc(0)], &config);
        let flows: Vec<_> = results.into_iter().map(|r| r.unwrap().max_flow).collect();
        assert_eq!(flows, vec![5, 0]);
    }
}
