// Licensed under the Apache-2.0 license

use crate::ast::Ast;
use crate::error::AstResult;
use crate::node::{NodeId, NodeKind};
use crate::types::Access;
use crate::visit::{walk_children, Visitor};

/// Makes every declaration of a class public.
///
/// Explicit interface implementations (`IFoo.Bar`) and partial methods keep
/// their implicit accessibility, and method bodies are not entered.
pub struct MakeAllPublic;

impl Visitor for MakeAllPublic {
    fn visit_variable_decl(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        if let NodeKind::VariableDecl { access, .. } = ast.kind_mut(id) {
            *access = Some(Access::Public);
        }
        Ok(())
    }

    fn visit_invokable(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        let explicit = ast.name(id).contains('.');
        match ast.kind_mut(id) {
            NodeKind::Method {
                access, modifiers, ..
            } if !explicit && !modifiers.partial => *access = Some(Access::Public),
            NodeKind::Property { access, .. } => *access = Some(Access::Public),
            _ => {}
        }
        Ok(())
    }

    fn visit_class(&mut self, ast: &mut Ast, id: NodeId) -> AstResult<()> {
        if let NodeKind::Class { access, .. } = ast.kind_mut(id) {
            *access = Some(Access::Public);
        }
        walk_children(self, ast, id)
    }
}
