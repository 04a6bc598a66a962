//! Maximum flow algorithms over residual graphs
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod edmonds_karp;
pub mod max_flow;
pub mod min_cut;
pub mod push_relabel;

pub use self::edmonds_karp::EdmondsKarp;
pub use self::max_flow::{solve, AugmentingPath, FlowBase, MaxFlowResult, MaxFlowSolver};
pub use self::min_cut::MinCut;
pub use self::push_relabel::PushRelabel;
