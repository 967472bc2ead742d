// Licensed under the Apache-2.0 license

//! Removes operations that have no effect: `x | 0`, `x ^ 0`, `x & ~0`, shifts
//! by zero and additions of zero. `x & 0` collapses to the zero literal.

use crate::ast::Ast;
use crate::error::AstResult;
use crate::node::{BinOp, NodeId, Slot};
use crate::visit::{walk_children, Visitor};

pub struct NullElimination;

impl NullElimination {
    fn operand(ast: &Ast, id: NodeId, slot: Slot) -> AstResult<Option<NodeId>> {
        ast.slot(id, slot)
    }

    /// All-ones literal for the width of `other`.
    fn is_all_ones(ast: &Ast, literal: u64, other: NodeId) -> bool {
        ast.expr_type(other)
            .and_then(|ty| ty.all_ones())
            .is_some_and(|mask| mask == literal)
    }

    /// The operand that the whole operation reduces to, if any.
    fn survivor(ast: &Ast, op: BinOp, lhs: NodeId, rhs: NodeId) -> Option<NodeId> {
        let left = ast.int_value(lhs);
        let right = ast.int_value(rhs);
        match op {
            BinOp::Or | BinOp::Xor => match (left, right) {
                (Some(0), _) => Some(rhs),
                (_, Some(0)) => Some(lhs),
                _ => None,
            },
            BinOp::And => match (left, right) {
                (Some(0), _) => Some(lhs),
                (_, Some(0)) => Some(rhs),
                (Some(l), _) if Self::is_all_ones(ast, l, rhs) => Some(rhs),
                (_, Some(r)) if Self::is_all_ones(ast, r, lhs) => Some(lhs),
                _ => None,
            },
            BinOp::Shl | BinOp::Shr | BinOp::UShr => (right == Some(0)).then_some(lhs),
            BinOp::Add => match (left, right) {
                (Some(0), _) => Some(rhs),
                (_, Some(0)) => Some(lhs),
                _ => None,
            },
            // `0 - x` is a negation and stays.
            BinOp::Sub => (right == Some(0)).then_some(lhs),
            _ => None,
        }
    }
}

impl Visitor for NullElimination {
    fn visit_binary(&mut self, ast: &mut Ast, id: NodeId, op: BinOp) -> AstResult<()> {
        walk_children(self, ast, id)?;
        let (Some(lhs), Some(rhs)) = (
            Self::operand(ast, id, Slot::Lhs)?,
            Self::operand(ast, id, Slot::Rhs)?,
        ) else {
            return Ok(());
        };
        if let Some(survivor) = Self::survivor(ast, op, lhs, rhs) {
            ast.detach(survivor)?;
            ast.replace(id, survivor)?;
        }
        Ok(())
    }
}
