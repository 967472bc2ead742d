// Licensed under the Apache-2.0 license

//! Inserts the parentheses required by C# operator precedence.

use crate::ast::Ast;
use crate::error::AstResult;
use crate::node::{BinOp, NodeId, NodeKind, Slot};
use crate::visit::{walk_children, Visitor};

/// Tier of anything that is not an operator. Atoms are never wrapped.
const ATOM: u8 = 18;

/// Binding strength of an expression; higher binds tighter.
pub fn precedence(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Binary { op, .. } => match op {
            BinOp::Mul | BinOp::Div => 13,
            BinOp::Add | BinOp::Sub => 12,
            BinOp::Shl | BinOp::Shr | BinOp::UShr => 11,
            BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => 10,
            BinOp::Eq | BinOp::Neq => 9,
            BinOp::And => 8,
            BinOp::Xor => 7,
            BinOp::Or => 6,
            BinOp::LAnd => 5,
            BinOp::LOr => 4,
        },
        NodeKind::Cond { .. } => 2,
        _ => ATOM,
    }
}

pub struct OrderOperators;

impl OrderOperators {
    fn parenthesize(ast: &mut Ast, expr: NodeId) -> AstResult<()> {
        let hole = ast.hole();
        ast.replace(expr, hole)?;
        let paren = ast.paren(expr)?;
        ast.replace(hole, paren)
    }

    /// Wraps every operator operand binding looser than `id` itself.
    fn order_operands(ast: &mut Ast, id: NodeId) -> AstResult<()> {
        let tier = precedence(ast.kind(id));
        for child in ast.children(id) {
            let kind = ast.kind(child);
            if kind.is_operator() && precedence(kind) < tier {
                Self::parenthesize(ast, child)?;
            }
        }
        Ok(())
    }

    /// Wraps an operand of the same tier sitting where the grammar would
    /// regroup it: the right operand of a left-associative operator, or the
    /// condition of a conditional.
    fn order_same_tier(ast: &mut Ast, id: NodeId, slot: Slot) -> AstResult<()> {
        let Some(operand) = ast.slot(id, slot)? else {
            return Ok(());
        };
        let outer = ast.kind(id);
        let inner = ast.kind(operand);
        if !inner.is_operator() || precedence(inner) != precedence(outer) {
            return Ok(());
        }
        if let (NodeKind::Binary { op: a, .. }, NodeKind::Binary { op: b, .. }) = (outer, inner) {
            if a == b && is_associative(*a) {
                return Ok(());
            }
        }
        Self::parenthesize(ast, operand)
    }
}

/// `a op (b op c)` equals `(a op b) op c`.
fn is_associative(op: BinOp) -> bool {
    matches!(
        op,
        BinOp::Add
            | BinOp::Mul
            | BinOp::And
            | BinOp::Xor
            | BinOp::Or
            | BinOp::LAnd
            | BinOp::LOr
    )
}

impl Visitor for OrderOperators {
    fn visit_binary(&mut self, ast: &mut Ast, id: NodeId, _op: BinOp) -> AstResult<()> {
        walk_children(self, ast, id)?;
        Self::order_operands(ast, id)?;
        Self::order_same_tier(ast, id, Slot::Rhs)
    }

    fn visit_cond(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        walk_children(self, ast, id)?;
        Self::order_operands(ast, id)?;
        Self::order_same_tier(ast, id, Slot::Condition)
    }

    fn visit_cast(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        walk_children(self, ast, id)?;
        if let Some(expr) = ast.slot(id, Slot::Expr)? {
            if ast.kind(expr).is_operator() {
                Self::parenthesize(ast, expr)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{CodeGenerator, EmitOptions};
    use crate::types::Type;
    use crate::visit::visit;

    fn var(ast: &mut Ast, name: &str) -> NodeId {
        ast.hard_expr(name, Type::INT)
    }

    fn order(ast: &mut Ast, expr: NodeId) -> (NodeId, String) {
        let stmt = ast.ret(Some(expr)).unwrap();
        visit(&mut OrderOperators, ast, stmt).unwrap();
        let text = CodeGenerator::emit(ast, stmt, EmitOptions::default()).unwrap();
        (stmt, text)
    }

    #[test]
    fn test_lower_tier_operand_is_wrapped() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let add = ast.binary(BinOp::Add, a, b).unwrap();
        let mul = ast.binary(BinOp::Mul, add, c).unwrap();
        assert_eq!(order(&mut ast, mul).1, "return (a + b) * c;\n");
    }

    #[test]
    fn test_higher_tier_operand_is_left_alone() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let mul = ast.binary(BinOp::Mul, a, b).unwrap();
        let add = ast.binary(BinOp::Add, mul, c).unwrap();
        assert_eq!(order(&mut ast, add).1, "return a * b + c;\n");
    }

    #[test]
    fn test_cast_always_wraps_operators() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let mul = ast.binary(BinOp::Mul, a, b).unwrap();
        let cast = ast.cast(Type::BYTE, mul).unwrap();
        assert_eq!(order(&mut ast, cast).1, "return (byte)(a * b);\n");

        let c = ast.bool_lit(true);
        let t = ast.uint_hex(1);
        let e = ast.uint_hex(0);
        let cond = ast.cond(c, t, e).unwrap();
        let five = ast.int(5);
        let shl = ast.binary(BinOp::Shl, cond, five).unwrap();
        assert_eq!(order(&mut ast, shl).1, "return (true ? 0x1U : 0x0U) << 5;\n");
    }

    #[test]
    fn test_logical_mix() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let or = ast.binary(BinOp::Or, a, b).unwrap();
        let mask = ast.int(3);
        let and = ast.binary(BinOp::And, or, mask).unwrap();
        let zero = ast.int(0);
        let neq = ast.binary(BinOp::Neq, and, zero).unwrap();
        assert_eq!(order(&mut ast, neq).1, "return ((a | b) & 3) != 0;\n");
    }

    #[test]
    fn test_right_nested_same_tier() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let inner = ast.binary(BinOp::Sub, b, c).unwrap();
        let outer = ast.binary(BinOp::Sub, a, inner).unwrap();
        assert_eq!(order(&mut ast, outer).1, "return a - (b - c);\n");

        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let inner = ast.binary(BinOp::Add, b, c).unwrap();
        let outer = ast.binary(BinOp::Sub, a, inner).unwrap();
        assert_eq!(order(&mut ast, outer).1, "return a - (b + c);\n");

        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let inner = ast.binary(BinOp::Or, b, c).unwrap();
        let outer = ast.binary(BinOp::Or, a, inner).unwrap();
        assert_eq!(order(&mut ast, outer).1, "return a | b | c;\n");

        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let inner = ast.binary(BinOp::Sub, a, b).unwrap();
        let outer = ast.binary(BinOp::Sub, inner, c).unwrap();
        assert_eq!(order(&mut ast, outer).1, "return a - b - c;\n");
    }

    #[test]
    fn test_xor_sits_between_and_and_or() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let or = ast.binary(BinOp::Or, a, b).unwrap();
        let xor = ast.binary(BinOp::Xor, or, c).unwrap();
        assert_eq!(order(&mut ast, xor).1, "return (a | b) ^ c;\n");

        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let and = ast.binary(BinOp::And, a, b).unwrap();
        let xor = ast.binary(BinOp::Xor, and, c).unwrap();
        assert_eq!(order(&mut ast, xor).1, "return a & b ^ c;\n");
    }

    #[test]
    fn test_conditional_as_condition() {
        let mut ast = Ast::new();
        let flag = ast.bool_lit(true);
        let yes = ast.bool_lit(false);
        let no = ast.bool_lit(true);
        let test = ast.cond(flag, yes, no).unwrap();
        let one = ast.int(1);
        let two = ast.int(2);
        let outer = ast.cond(test, one, two).unwrap();
        assert_eq!(
            order(&mut ast, outer).1,
            "return (true ? false : true) ? 1 : 2;\n"
        );

        let flag = ast.bool_lit(true);
        let one = ast.int(1);
        let other = ast.bool_lit(false);
        let two = ast.int(2);
        let three = ast.int(3);
        let nested = ast.cond(other, two, three).unwrap();
        let outer = ast.cond(flag, one, nested).unwrap();
        assert_eq!(
            order(&mut ast, outer).1,
            "return true ? 1 : false ? 2 : 3;\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let mut ast = Ast::new();
        let a = var(&mut ast, "a");
        let b = var(&mut ast, "b");
        let c = var(&mut ast, "c");
        let add = ast.binary(BinOp::Add, a, b).unwrap();
        let mul = ast.binary(BinOp::Mul, add, c).unwrap();
        let cast = ast.cast(Type::UINT, mul).unwrap();
        let (stmt, once) = order(&mut ast, cast);
        visit(&mut OrderOperators, &mut ast, stmt).unwrap();
        let twice = CodeGenerator::emit(&ast, stmt, EmitOptions::default()).unwrap();
        assert_eq!(once, "return (uint)((a + b) * c);\n");
        assert_eq!(once, twice);
    }
}
