// Licensed under the Apache-2.0 license

use crate::node::Slot;
use thiserror::Error;

/// Structural misuse of the tree. These indicate a defect in the code
/// building or rewriting the tree and are never recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("{0} is already linked into a tree")]
    AlreadyLinked(String),
    #[error("{0} is not linked into a tree")]
    NotLinked(String),
    #[error("{0} is already followed by another node")]
    HasSuccessor(String),
    #[error("linking {0} would create a cycle")]
    Cycle(String),
    #[error("{node} has no {slot:?} slot")]
    InvalidSlot { node: String, slot: Slot },
    #[error("{slot:?} slot of {node} is already occupied")]
    SlotOccupied { node: String, slot: Slot },
    #[error("{0} is not a variable declaration")]
    NotADeclaration(String),
    #[error("{0} is not an expression")]
    NotAnExpression(String),
    #[error("operator `{op}` cannot be applied to {operand} of type `{ty}`")]
    InvalidOperand {
        op: &'static str,
        operand: String,
        ty: String,
    },
    #[error("node {0} does not exist")]
    UnknownNode(usize),
    #[error("cannot emit an unfilled hole inside {0}")]
    UnfilledHole(String),
}

pub type AstResult<T> = Result<T, AstError>;
