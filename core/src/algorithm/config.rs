//! Solver configuration
//!
//! `SolverConfig` is plain serde data with defaults for every field, so a
//! partial JSON document is a valid configuration. The string-keyed
//! parameter accessors validate values before applying them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, AlgorithmKind};
use crate::data_structures::priority_queue::SelectionRule;

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Boolean,
    Enum(Vec<String>),
}

/// Description of one configurable parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
}

/// Configuration shared by all solver variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Variant constructed by [`MaxFlowSolver::new`](crate::algorithm::MaxFlowSolver::new)
    pub algorithm: AlgorithmKind,
    /// Active-vertex selection for push-relabel
    pub selection: SelectionRule,
    /// Abort with `ResourceExhausted` after this many steps
    pub step_limit: Option<usize>,
    /// Check flow invariants after every step
    pub verify_invariants: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::PushRelabel,
            selection: SelectionRule::HighestLabel,
            step_limit: None,
            verify_invariants: false,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, AlgorithmError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AlgorithmError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_selection(mut self, selection: SelectionRule) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_invariant_checks(mut self) -> Self {
        self.verify_invariants = true;
        self
    }

    /// Sets a parameter from its string form
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        let invalid = |reason: &str| AlgorithmError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match name {
            "algorithm" => {
                self.algorithm = match value {
                    "push_relabel" => AlgorithmKind::PushRelabel,
                    "edmonds_karp" => AlgorithmKind::EdmondsKarp,
                    _ => return Err(invalid("expected push_relabel or edmonds_karp")),
                };
            }
            "selection" => {
                self.selection = match value {
                    "highest_label" => SelectionRule::HighestLabel,
                    "fifo" => SelectionRule::Fifo,
                    _ => return Err(invalid("expected highest_label or fifo")),
                };
            }
            "step_limit" => {
                self.step_limit = match value {
                    "none" => None,
                    _ => {
                        let limit = value
                            .parse::<usize>()
                            .map_err(|_| invalid("step_limit must be a positive integer or none"))?;
                        if limit == 0 {
                            return Err(invalid("step_limit must be > 0"));
                        }
                        Some(limit)
                    }
                };
            }
            "verify_invariants" => {
                self.verify_invariants = value
                    .parse::<bool>()
                    .map_err(|_| invalid("verify_invariants must be true or false"))?;
            }
            _ => return Err(invalid("unknown parameter")),
        }
        Ok(())
    }

    pub fn get_parameter(&self, name: &str) -> Option<String> {
        let value = match name {
            "algorithm" => match self.algorithm {
                AlgorithmKind::PushRelabel => "push_relabel".to_string(),
                AlgorithmKind::EdmondsKarp => "edmonds_karp".to_string(),
            },
            "selection" => match self.selection {
                SelectionRule::HighestLabel => "highest_label".to_string(),
                SelectionRule::Fifo => "fifo".to_string(),
            },
            "step_limit" => self.step_limit.map_or_else(|| "none".to_string(), |l| l.to_string()),
            "verify_invariants" => self.verify_invariants.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Supported parameters with type information
    pub fn parameters(&self) -> Vec<AlgorithmParameter> {
        let describe = |name: &str, value_type: ParameterType| AlgorithmParameter {
            name: name.to_string(),
            value: self.get_parameter(name).unwrap_or_default(),
            value_type,
        };
        vec![
            describe(
                "algorithm",
                ParameterType::Enum(vec!["push_relabel".into(), "edmonds_karp".into()]),
            ),
            describe(
                "selection",
                ParameterType::Enum(vec!["highest_label".into(), "fifo".into()]),
            ),
            describe("step_limit", ParameterType::Integer),
            describe("verify_invariants", ParameterType::Boolean),
        ]
    }

    pub fn parameter_map(&self) -> HashMap<String, String> {
        self.parameters().into_iter().map(|p| (p.name, p.value)).collect()
    }
}
