// Licensed under the Apache-2.0 license

//! In-memory C# source tree and emitter.
//!
//! This crate models the subset of C# needed to describe peripheral register
//! accessors: expressions, statements, methods, properties, classes and
//! namespaces. Trees are built bottom-up in an [`Ast`] arena, rewritten in
//! place by the passes and finally rendered to text by a [`CodeGenerator`].
//!
//! ## Usage
//!
//! ```
//! use registers_csharp::{Ast, BinOp, CodeGenerator, EmitOptions, Type};
//!
//! let mut ast = Ast::new();
//! let a = ast.hard_expr("a", Type::INT);
//! let b = ast.hard_expr("b", Type::INT);
//! let c = ast.hard_expr("c", Type::INT);
//! let sum = ast.binary(BinOp::Add, a, b).unwrap();
//! let product = ast.binary(BinOp::Mul, sum, c).unwrap();
//! let stmt = ast.ret(Some(product)).unwrap();
//! registers_csharp::process_ast(&mut ast, stmt, false).unwrap();
//! let text = CodeGenerator::emit(&ast, stmt, EmitOptions::default()).unwrap();
//! assert_eq!(text, "return (a + b) * c;\n");
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: C# types, accessibility and modifiers
//! - [`node`]: node kinds, slots and locations
//! - [`ast`]: the arena, link operations and node constructors
//! - [`codegen`]: token stream and text rendering
//! - [`visit`]: kind-aware dispatch
//! - [`passes`]: null elimination, operator ordering and visibility

pub mod ast;
pub mod codegen;
pub mod error;
pub mod node;
pub mod passes;
pub mod types;
pub mod visit;

pub use ast::{AccessorDef, Ast, ClassDef, MethodDef, PropertyDef, Siblings};
pub use codegen::{CodeGenerator, EmitOptions, Token};
pub use error::{AstError, AstResult};
pub use node::{Accessor, BinOp, Link, Location, Meta, NodeId, NodeKind, Slot};
pub use passes::process_ast;
pub use types::{Access, Modifiers, Primitive, Type};
pub use visit::{visit, walk_children, Visitor};
