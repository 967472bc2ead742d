// Licensed under the Apache-2.0 license

//! Token-based text emission.
//!
//! [`Ast::tokenize`] turns a subtree into a stream of [`Token`]s: text
//! fragments interleaved with indentation, comment, doc and namespace
//! markers. A [`CodeGenerator`] consumes the stream in a single top-down pass
//! and renders the final text.

use std::borrow::Cow;

use crate::ast::Ast;
use crate::error::{AstError, AstResult};
use crate::node::{Accessor, Link, NodeId, NodeKind};
use crate::types::{Access, Type};

const INDENT: &str = "    ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    Text(Cow<'a, str>),
    /// Increase indentation if the originating node indents.
    Nest(NodeId),
    Unnest(NodeId),
    CommentBegin,
    CommentEnd,
    /// Render comments as `/* ... */` until the matching restore.
    InlineComments,
    RestoreComments,
    DocBegin,
    DocEnd,
    /// Dotted name of a namespace relative to the enclosing one.
    QualifiedName(NodeId),
    EnterNamespace(NodeId),
    ExitNamespace,
}

impl Ast {
    /// Streams the tokens of `id`, without its trailing siblings, into `sink`.
    pub fn tokenize<'a>(&'a self, id: NodeId, sink: &mut dyn FnMut(Token<'a>)) -> AstResult<()> {
        Tokenizer { ast: self, sink }.node(id)
    }
}

struct Tokenizer<'a, 's> {
    ast: &'a Ast,
    sink: &'s mut dyn FnMut(Token<'a>),
}

fn access_prefix(access: Option<Access>) -> String {
    access.map(|a| format!("{} ", a.keyword())).unwrap_or_default()
}

/// Renders an integer literal with the C# suffix of its type.
pub fn int_literal(value: u64, ty: &Type, hex: bool) -> String {
    let digits = if hex {
        format!("{value:#x}")
    } else {
        value.to_string()
    };
    let suffix = match (ty.is_unsigned(), ty.is_long()) {
        (true, true) => "UL",
        (true, false) => "U",
        (false, true) => "L",
        (false, false) => "",
    };
    format!("{digits}{suffix}")
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl<'a> Tokenizer<'a, '_> {
    fn emit(&mut self, token: Token<'a>) {
        (self.sink)(token)
    }

    fn text(&mut self, text: impl Into<Cow<'a, str>>) {
        self.emit(Token::Text(text.into()))
    }

    /// Every node of a chain, separated by `sep`.
    fn chain(&mut self, head: Link, sep: &'static str) -> AstResult<()> {
        for (i, id) in self.ast.chain(head).into_iter().enumerate() {
            if i > 0 {
                self.text(sep);
            }
            self.node(id)?;
        }
        Ok(())
    }

    fn block(&mut self, owner: NodeId, body: Link) -> AstResult<()> {
        self.text("\n{\n");
        self.emit(Token::Nest(owner));
        self.chain(body, "")?;
        self.emit(Token::Unnest(owner));
        self.text("}\n");
        Ok(())
    }

    fn annotations(&mut self, id: NodeId, inline: bool) {
        let ast = self.ast;
        let meta = ast.meta(id);
        if let Some(doc) = &meta.doc {
            self.emit(Token::DocBegin);
            self.text(doc.as_str());
            self.emit(Token::DocEnd);
        }
        if let Some(comment) = &meta.comment {
            if inline {
                self.emit(Token::InlineComments);
            }
            self.emit(Token::CommentBegin);
            self.text(comment.as_str());
            self.emit(Token::CommentEnd);
            if inline {
                self.emit(Token::RestoreComments);
            }
        }
    }

    fn node(&mut self, id: NodeId) -> AstResult<()> {
        let ast = self.ast;
        let kind = ast.kind(id);
        let is_expr = kind.expr_type().is_some() || matches!(kind, NodeKind::This);
        self.annotations(id, is_expr);
        match kind {
            NodeKind::Hole => {
                let owner = ast.parent(id).map(|(owner, _)| owner).unwrap_or(id);
                return Err(AstError::UnfilledHole(ast.describe(owner)));
            }
            NodeKind::HardCode { code } | NodeKind::HardExpr { code, .. } => {
                self.text(code.as_str())
            }
            NodeKind::IntLit { value, ty, hex } => self.text(int_literal(*value, ty, *hex)),
            NodeKind::BoolLit { value } => self.text(if *value { "true" } else { "false" }),
            NodeKind::StringLit { value } => self.text(format!("\"{}\"", escape(value))),
            NodeKind::VarRef { decl, .. } => self.text(ast.name(*decl)),
            NodeKind::This => self.text("this"),
            NodeKind::Binary { op, lhs, rhs, .. } => {
                self.chain(*lhs, "")?;
                self.text(format!(" {} ", op.symbol()));
                self.chain(*rhs, "")?;
            }
            NodeKind::Cond {
                condition,
                then,
                otherwise,
                ..
            } => {
                self.chain(*condition, "")?;
                self.text(" ? ");
                self.chain(*then, "")?;
                self.text(" : ");
                self.chain(*otherwise, "")?;
            }
            NodeKind::Cast { expr, ty } => {
                self.text(format!("({ty})"));
                self.chain(*expr, "")?;
            }
            NodeKind::Paren { expr, .. } => {
                self.text("(");
                self.chain(*expr, "")?;
                self.text(")");
            }
            NodeKind::Assign { lhs, rhs, .. } => {
                self.chain(*lhs, "")?;
                self.text(" = ");
                self.chain(*rhs, "")?;
            }
            NodeKind::Index { object, index, .. } => {
                self.chain(*object, "")?;
                self.text("[");
                self.chain(*index, "")?;
                self.text("]");
            }
            NodeKind::Member { object, member, .. } => {
                self.chain(*object, "")?;
                self.text(".");
                self.text(member.as_str());
            }
            NodeKind::Call {
                method,
                receiver,
                args,
                ..
            } => {
                if receiver.is_some() {
                    self.chain(*receiver, "")?;
                    self.text(".");
                }
                self.text(method.as_str());
                self.text("(");
                self.chain(*args, ", ")?;
                self.text(")");
            }
            NodeKind::New { ty, args } => {
                self.text(format!("new {ty}("));
                self.chain(*args, ", ")?;
                self.text(")");
            }
            NodeKind::NewArray { elem, count } => {
                self.text(format!("new {elem}["));
                self.chain(*count, "")?;
                self.text("]");
            }
            NodeKind::Arg { value, name, out } => {
                if let Some(name) = name {
                    self.text(format!("{name}: "));
                }
                if *out {
                    self.text("out ");
                }
                self.chain(*value, "")?;
            }
            NodeKind::VariableDecl { ty, init, access } => {
                self.text(format!("{}{ty} {}", access_prefix(*access), ast.name(id)));
                if init.is_some() {
                    self.text(" = ");
                    self.chain(*init, "")?;
                }
                self.text(";\n");
            }
            NodeKind::ArgDecl { ty, init, out } => {
                if *out {
                    self.text("out ");
                }
                self.text(format!("{ty} {}", ast.name(id)));
                if init.is_some() {
                    self.text(" = ");
                    self.chain(*init, "")?;
                }
            }
            NodeKind::StmtExpr { expr } => {
                self.chain(*expr, "")?;
                self.text(";\n");
            }
            NodeKind::Return { expr } => {
                if expr.is_some() {
                    self.text("return ");
                    self.chain(*expr, "")?;
                    self.text(";\n");
                } else {
                    self.text("return;\n");
                }
            }
            NodeKind::Throw { expr } => {
                self.text("throw ");
                self.chain(*expr, "")?;
                self.text(";\n");
            }
            NodeKind::If {
                condition,
                then,
                otherwise,
            } => {
                self.text("if(");
                self.chain(*condition, "")?;
                self.text(")");
                self.block(id, *then)?;
                if otherwise.is_some() {
                    self.text("else");
                    self.block(id, *otherwise)?;
                }
            }
            NodeKind::Method {
                params,
                body,
                bodied,
                ctor,
                ret,
                access,
                modifiers,
            } => {
                let ret = match (ctor, ret) {
                    (true, _) => String::new(),
                    (false, Some(ty)) => format!("{ty} "),
                    (false, None) => "void ".to_string(),
                };
                self.text(format!(
                    "{}{}{ret}{}(",
                    access_prefix(*access),
                    modifiers.prefix(),
                    ast.name(id)
                ));
                self.chain(*params, ", ")?;
                self.text(")");
                if *bodied {
                    self.block(id, *body)?;
                } else {
                    self.text(";\n");
                }
            }
            NodeKind::Property {
                ty,
                get,
                set,
                get_body,
                set_body,
                access,
                modifiers,
            } => {
                let multiline = *get == Accessor::Body || *set == Accessor::Body;
                self.text(format!(
                    "{}{}{ty} {} {{",
                    access_prefix(*access),
                    modifiers.prefix(),
                    ast.name(id)
                ));
                if multiline {
                    self.text("\n");
                    self.emit(Token::Nest(id));
                }
                for (accessor, keyword, body) in [(get, "get", get_body), (set, "set", set_body)] {
                    match (accessor, multiline) {
                        (Accessor::Absent, _) => {}
                        (Accessor::Auto, true) => self.text(format!("{keyword};\n")),
                        (Accessor::Auto, false) => self.text(format!(" {keyword};")),
                        (Accessor::Body, _) => {
                            self.text(keyword);
                            self.block(id, *body)?;
                        }
                    }
                }
                if multiline {
                    self.emit(Token::Unnest(id));
                    self.text("}\n");
                } else {
                    self.text(" }\n");
                }
            }
            NodeKind::Class {
                fields,
                properties,
                methods,
                classes,
                derives,
                access,
                modifiers,
                is_struct,
            } => {
                let mut header = format!(
                    "{}{}{} {}",
                    access_prefix(*access),
                    modifiers.prefix(),
                    if *is_struct { "struct" } else { "class" },
                    ast.name(id)
                );
                if !derives.is_empty() {
                    let bases: Vec<String> = derives
                        .iter()
                        .map(|(access, ty)| format!("{}{ty}", access_prefix(*access)))
                        .collect();
                    header.push_str(" : ");
                    header.push_str(&bases.join(", "));
                }
                self.text(header);
                self.text("\n{\n");
                self.emit(Token::Nest(id));
                let mut previous = false;
                for (section, sep) in [
                    (fields, ""),
                    (properties, "\n"),
                    (methods, "\n"),
                    (classes, "\n"),
                ] {
                    if section.is_none() {
                        continue;
                    }
                    if previous {
                        self.text("\n");
                    }
                    self.chain(*section, sep)?;
                    previous = true;
                }
                self.emit(Token::Unnest(id));
                self.text("}\n");
            }
            NodeKind::Namespace {
                classes,
                namespaces,
            } => {
                self.text("namespace ");
                self.emit(Token::QualifiedName(id));
                self.text("\n{\n");
                self.emit(Token::EnterNamespace(id));
                self.emit(Token::Nest(id));
                self.chain(*classes, "\n")?;
                if classes.is_some() && namespaces.is_some() {
                    self.text("\n");
                }
                self.chain(*namespaces, "\n")?;
                self.emit(Token::Unnest(id));
                self.emit(Token::ExitNamespace);
                self.text("}\n");
            }
        }
        Ok(())
    }
}

/// Rendering switches.
#[derive(Clone, Copy, Debug)]
pub struct EmitOptions {
    /// Emit `//` and `/* */` comments attached to nodes.
    pub comments: bool,
    /// Emit `/// <summary>` doc comments.
    pub docs: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            comments: false,
            docs: true,
        }
    }
}

/// Consumer of a token stream.
pub struct CodeGenerator<'a> {
    ast: &'a Ast,
    options: EmitOptions,
    out: String,
    indent: usize,
    namespaces: Vec<NodeId>,
    inline: Vec<bool>,
    suppressed: usize,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(ast: &'a Ast, options: EmitOptions) -> Self {
        Self {
            ast,
            options,
            out: String::new(),
            indent: 0,
            namespaces: vec![],
            inline: vec![],
            suppressed: 0,
        }
    }

    /// Renders the subtree rooted at `root`.
    pub fn emit(ast: &'a Ast, root: NodeId, options: EmitOptions) -> AstResult<String> {
        let mut generator = CodeGenerator::new(ast, options);
        ast.tokenize(root, &mut |token| generator.consume(token))?;
        Ok(generator.finish())
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn write(&mut self, text: &str) {
        for line in text.split_inclusive('\n') {
            if self.out.ends_with('\n') && line != "\n" {
                for _ in 0..self.indent {
                    self.out.push_str(INDENT);
                }
            }
            self.out.push_str(line);
        }
    }

    fn inline_comments(&self) -> bool {
        self.inline.last().copied().unwrap_or(false)
    }

    fn qualified_path(&self, id: NodeId) -> Vec<&'a str> {
        let mut path = vec![self.ast.name(id)];
        let mut current = id;
        while let Some((owner, _)) = self.ast.parent(current) {
            if matches!(self.ast.kind(owner), NodeKind::Namespace { .. }) {
                path.push(self.ast.name(owner));
            }
            current = owner;
        }
        path.reverse();
        path
    }

    fn qualified_name(&self, id: NodeId) -> String {
        let path = self.qualified_path(id);
        if let Some(&context) = self.namespaces.last() {
            let context = self.qualified_path(context);
            if path.len() > context.len() && path.starts_with(&context) {
                return path[context.len()..].join(".");
            }
        }
        path.join(".")
    }

    pub fn consume(&mut self, token: Token<'a>) {
        match token {
            Token::Text(text) => {
                if self.suppressed == 0 {
                    self.write(&text);
                }
            }
            Token::Nest(origin) => {
                if self.ast.meta(origin).indents {
                    self.indent += 1;
                }
            }
            Token::Unnest(origin) => {
                if self.ast.meta(origin).indents {
                    self.indent = self.indent.saturating_sub(1);
                }
            }
            Token::InlineComments => self.inline.push(true),
            Token::RestoreComments => {
                self.inline.pop();
            }
            Token::CommentBegin if self.options.comments => {
                let open = if self.inline_comments() { "/* " } else { "// " };
                self.write(open);
            }
            Token::CommentEnd if self.options.comments => {
                let close = if self.inline_comments() { " */ " } else { "\n" };
                self.write(close);
            }
            Token::DocBegin if self.options.docs => self.write("/// <summary> "),
            Token::DocEnd if self.options.docs => self.write(" </summary>\n"),
            Token::CommentBegin | Token::DocBegin => self.suppressed += 1,
            Token::CommentEnd | Token::DocEnd => {
                self.suppressed = self.suppressed.saturating_sub(1)
            }
            Token::QualifiedName(id) => {
                let name = self.qualified_name(id);
                self.write(&name);
            }
            Token::EnterNamespace(id) => self.namespaces.push(id),
            Token::ExitNamespace => {
                self.namespaces.pop();
            }
        }
    }
}
