// Licensed under the Apache-2.0 license

//! Kind-aware dispatch over the tree.
//!
//! [`visit`] matches the node kind exhaustively and calls the most specific
//! [`Visitor`] method. Each default method forwards to its more general
//! category, so a visitor only overrides the categories it cares about:
//!
//! ```text
//! visit_binary ─┐
//! visit_cond  ──┼─> visit_expr ─────┐
//! visit_cast  ──┘                   │
//! visit_variable_decl -> visit_stmt ┼─> visit_node (recurses into children)
//! visit_method   ─┐                 │
//! visit_property ─┴─> visit_invokable
//! visit_class, visit_namespace ─────┘
//! ```

use crate::ast::Ast;
use crate::error::AstResult;
use crate::node::{BinOp, NodeId, NodeKind};

pub trait Visitor {
    fn visit_node(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        walk_children(self, ast, id)
    }

    fn visit_expr(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_node(ast, id)
    }

    fn visit_binary(&mut self, ast: &mut Ast, id: NodeId, _op: BinOp) -> AstResult<()> {
        self.visit_expr(ast, id)
    }

    fn visit_cond(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_expr(ast, id)
    }

    fn visit_cast(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_expr(ast, id)
    }

    fn visit_stmt(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_node(ast, id)
    }

    /// Field declarations, locals and parameters.
    fn visit_variable_decl(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_stmt(ast, id)
    }

    /// Methods and properties.
    fn visit_invokable(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_node(ast, id)
    }

    fn visit_method(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_invokable(ast, id)
    }

    fn visit_property(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_invokable(ast, id)
    }

    fn visit_class(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_node(ast, id)
    }

    fn visit_namespace(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        self.visit_node(ast, id)
    }
}

/// Dispatches `id` to the visitor method for its kind.
pub fn visit<V: Visitor + ?Sized>(visitor: &mut V, ast: &mut Ast, id: NodeId) -> AstResult<()> {
    match ast.kind(id) {
        NodeKind::Binary { op, .. } => {
            let op = *op;
            visitor.visit_binary(ast, id, op)
        }
        NodeKind::Cond { .. } => visitor.visit_cond(ast, id),
        NodeKind::Cast { .. } => visitor.visit_cast(ast, id),
        NodeKind::HardExpr { .. }
        | NodeKind::IntLit { .. }
        | NodeKind::BoolLit { .. }
        | NodeKind::StringLit { .. }
        | NodeKind::VarRef { .. }
        | NodeKind::This
        | NodeKind::Paren { .. }
        | NodeKind::Assign { .. }
        | NodeKind::Index { .. }
        | NodeKind::Member { .. }
        | NodeKind::Call { .. }
        | NodeKind::New { .. }
        | NodeKind::NewArray { .. } => visitor.visit_expr(ast, id),
        NodeKind::VariableDecl { .. } | NodeKind::ArgDecl { .. } => {
            visitor.visit_variable_decl(ast, id)
        }
        NodeKind::StmtExpr { .. }
        | NodeKind::Return { .. }
        | NodeKind::Throw { .. }
        | NodeKind::If { .. } => visitor.visit_stmt(ast, id),
        NodeKind::Method { .. } => visitor.visit_method(ast, id),
        NodeKind::Property { .. } => visitor.visit_property(ast, id),
        NodeKind::Class { .. } => visitor.visit_class(ast, id),
        NodeKind::Namespace { .. } => visitor.visit_namespace(ast, id),
        NodeKind::Hole | NodeKind::HardCode { .. } | NodeKind::Arg { .. } => {
            visitor.visit_node(ast, id)
        }
    }
}

/// Visits every child of `id`. The child list is captured up front, so a
/// visit may replace the child it was given.
pub fn walk_children<V: Visitor + ?Sized>(
    visitor: &mut V,
    ast: &mut Ast,
    id: NodeId,
) -> AstResult<()> {
    for child in ast.children(id) {
        visit(visitor, ast, child)?;
    }
    Ok(())
}
