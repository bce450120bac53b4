use crate::syn_tree::NodeId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which of the two compared trees a node id belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("mapping references node {node} absent from the {side} tree")]
    InconsistentMapping { side: Side, node: NodeId },

    #[error("{what} budget exceeded (limit {limit})")]
    BudgetExceeded { what: &'static str, limit: u64 },

    #[error("action #{index} cannot be applied: {reason}")]
    InapplicableAction { index: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, DiffError>;
