// Licensed under the Apache-2.0 license

//! Rewrite passes run over a finished tree before emission.
//!
//! - [`null::NullElimination`]: drops operations with an identity operand
//! - [`order::OrderOperators`]: parenthesizes by operator precedence
//! - [`visibility::MakeAllPublic`]: optional, forces public accessibility

pub mod null;
pub mod order;
pub mod visibility;

use log::debug;

use crate::ast::Ast;
use crate::error::AstResult;
use crate::node::NodeId;
use crate::visit::visit;

pub use null::NullElimination;
pub use order::OrderOperators;
pub use visibility::MakeAllPublic;

/// Runs the passes in order: null elimination, operator ordering and, if
/// requested, the visibility pass.
pub fn process_ast(ast: &mut Ast, root: NodeId, make_all_public: bool) -> AstResult<()> {
    debug!("Eliminating null operations under {}", ast.describe(root));
    visit(&mut NullElimination, ast, root)?;
    debug!("Ordering operators under {}", ast.describe(root));
    visit(&mut OrderOperators, ast, root)?;
    if make_all_public {
        debug!("Making all declarations public under {}", ast.describe(root));
        visit(&mut MakeAllPublic, ast, root)?;
    }
    Ok(())
}
