// Licensed under the Apache-2.0 license

//! Node arena and the link operations that splice subtrees in place.
//!
//! Nodes are built bottom-up: a constructor claims the chains passed to it as
//! its children. A node is linked in at most one place, either as the head of
//! a slot chain (`ChildOf`) or after a sibling (`After`). Every operation
//! validates the locations it touches before it mutates anything.

use std::collections::HashSet;

use crate::error::{AstError, AstResult};
use crate::node::{Accessor, Link, Location, Meta, NodeId, NodeKind, Slot};
use crate::types::{Access, Modifiers, Type};

#[derive(Clone, Debug)]
struct Entry {
    kind: NodeKind,
    meta: Meta,
    location: Location,
    next: Link,
}

/// Arena owning every node of one generated compilation unit.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    entries: Vec<Entry>,
}

/// One-shot cursor over a sibling chain.
///
/// The successor is captured before the current node is handed out, so the
/// caller may replace or detach the node it was given.
#[derive(Clone, Debug)]
pub struct Siblings {
    next: Link,
}

impl Siblings {
    pub fn next(&mut self, ast: &Ast) -> Option<NodeId> {
        let current = self.next?;
        self.next = ast.next(current);
        Some(current)
    }
}

/// Method declaration, passed to [`Ast::method`].
#[derive(Clone, Debug, Default)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<NodeId>,
    /// `None` renders a declaration without body.
    pub body: Option<Vec<NodeId>>,
    pub ctor: bool,
    pub ret: Option<Type>,
    pub access: Option<Access>,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, Default)]
pub enum AccessorDef {
    #[default]
    Absent,
    Auto,
    Body(Vec<NodeId>),
}

/// Property declaration, passed to [`Ast::property`].
#[derive(Clone, Debug)]
pub struct PropertyDef {
    pub name: String,
    pub ty: Type,
    pub get: AccessorDef,
    pub set: AccessorDef,
    pub access: Option<Access>,
    pub modifiers: Modifiers,
}

/// Class or struct declaration, passed to [`Ast::class`].
#[derive(Clone, Debug, Default)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<NodeId>,
    pub properties: Vec<NodeId>,
    pub methods: Vec<NodeId>,
    pub classes: Vec<NodeId>,
    pub derives: Vec<(Option<Access>, Type)>,
    pub access: Option<Access>,
    pub modifiers: Modifiers,
    pub is_struct: bool,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    //=========================================================================
    // Queries
    //=========================================================================

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.entries[id.0].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.entries[id.0].kind
    }

    pub fn meta(&self, id: NodeId) -> &Meta {
        &self.entries[id.0].meta
    }

    pub fn meta_mut(&mut self, id: NodeId) -> &mut Meta {
        &mut self.entries[id.0].meta
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.meta(id).name.as_deref().unwrap_or("")
    }

    pub fn location(&self, id: NodeId) -> Location {
        self.entries[id.0].location
    }

    pub fn next(&self, id: NodeId) -> Link {
        self.entries[id.0].next
    }

    pub fn previous(&self, id: NodeId) -> Link {
        match self.location(id) {
            Location::After(prev) => Some(prev),
            _ => None,
        }
    }

    /// Head of the chain `id` belongs to.
    pub fn first(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(prev) = self.previous(current) {
            current = prev;
        }
        current
    }

    /// Tail of the chain starting at `id`.
    pub fn last(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(next) = self.next(current) {
            current = next;
        }
        current
    }

    /// Owner and slot of the chain `id` belongs to.
    pub fn parent(&self, id: NodeId) -> Option<(NodeId, Slot)> {
        match self.location(self.first(id)) {
            Location::ChildOf(owner, slot) => Some((owner, slot)),
            _ => None,
        }
    }

    pub fn slot(&self, id: NodeId, slot: Slot) -> AstResult<Link> {
        self.kind(id)
            .slot(slot)
            .ok_or_else(|| AstError::InvalidSlot {
                node: self.describe(id),
                slot,
            })
    }

    /// Snapshot of the chain starting at `head`.
    pub fn chain(&self, head: Link) -> Vec<NodeId> {
        let mut nodes = vec![];
        let mut cursor = self.iterate(head);
        while let Some(id) = cursor.next(self) {
            nodes.push(id);
        }
        nodes
    }

    /// All direct children in slot order, following each slot's chain.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id)
            .slots()
            .into_iter()
            .flat_map(|(_, head)| self.chain(head))
            .collect()
    }

    pub fn iterate(&self, head: Link) -> Siblings {
        Siblings { next: head }
    }

    pub fn expr_type(&self, id: NodeId) -> Option<Type> {
        self.kind(id).expr_type()
    }

    /// Value of an integer literal.
    pub fn int_value(&self, id: NodeId) -> Option<u64> {
        match self.kind(id) {
            NodeKind::IntLit { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Short human readable reference used in error messages.
    pub fn describe(&self, id: NodeId) -> String {
        let Some(entry) = self.entries.get(id.0) else {
            return format!("node #{}", id.0);
        };
        match &entry.meta.name {
            Some(name) => format!("{} `{}` (#{})", entry.kind.kind_name(), name, id.0),
            None => format!("{} #{}", entry.kind.kind_name(), id.0),
        }
    }

    //=========================================================================
    // Link operations
    //=========================================================================

    fn check_exists(&self, id: NodeId) -> AstResult<()> {
        if id.0 < self.entries.len() {
            Ok(())
        } else {
            Err(AstError::UnknownNode(id.0))
        }
    }

    fn check_unlinked(&self, id: NodeId) -> AstResult<()> {
        self.check_exists(id)?;
        match self.location(id) {
            Location::Root => Ok(()),
            _ => Err(AstError::AlreadyLinked(self.describe(id))),
        }
    }

    /// True if linking the chain headed by `head` at `anchor` would make the
    /// chain contain one of its own ancestors.
    fn would_cycle(&self, anchor: NodeId, head: NodeId) -> bool {
        let members: HashSet<NodeId> = self.chain(Some(head)).into_iter().collect();
        let mut current = anchor;
        loop {
            let first = self.first(current);
            if members.contains(&current) || members.contains(&first) {
                return true;
            }
            match self.location(first) {
                Location::ChildOf(owner, _) => current = owner,
                _ => return false,
            }
        }
    }

    fn slot_link_mut(&mut self, owner: NodeId, slot: Slot) -> AstResult<&mut Link> {
        let node = self.describe(owner);
        self.entries[owner.0]
            .kind
            .slot_mut(slot)
            .ok_or(AstError::InvalidSlot { node, slot })
    }

    /// Adds a node, claiming the chains stored in its slots as children.
    pub fn add(&mut self, kind: NodeKind) -> AstResult<NodeId> {
        let slots = kind.slots();
        let mut claimed = HashSet::new();
        for child in slots.iter().filter_map(|(_, link)| *link) {
            self.check_unlinked(child)?;
            if !claimed.insert(child) {
                return Err(AstError::AlreadyLinked(self.describe(child)));
            }
        }
        if let NodeKind::VarRef { decl, .. } = &kind {
            self.check_exists(*decl)?;
        }
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            kind,
            meta: Meta::default(),
            location: Location::Root,
            next: None,
        });
        for (slot, link) in slots {
            if let Some(child) = link {
                self.entries[child.0].location = Location::ChildOf(id, slot);
            }
        }
        Ok(id)
    }

    fn leaf(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            kind,
            meta: Meta::default(),
            location: Location::Root,
            next: None,
        });
        id
    }

    /// Removes `id` together with its trailing siblings from wherever it is
    /// linked.
    pub fn detach(&mut self, id: NodeId) -> AstResult<NodeId> {
        self.check_exists(id)?;
        match self.location(id) {
            Location::Root => return Err(AstError::NotLinked(self.describe(id))),
            Location::ChildOf(owner, slot) => *self.slot_link_mut(owner, slot)? = None,
            Location::After(prev) => self.entries[prev.0].next = None,
        }
        self.entries[id.0].location = Location::Root;
        Ok(id)
    }

    /// Removes `id` alone from its chain; its successor takes its place.
    pub fn cut(&mut self, id: NodeId) -> AstResult<NodeId> {
        self.check_exists(id)?;
        let Some(tail) = self.next(id) else {
            return self.detach(id);
        };
        self.entries[id.0].next = None;
        self.entries[tail.0].location = Location::Root;
        if self.location(id) != Location::Root {
            self.replace(id, tail)?;
        }
        Ok(id)
    }

    /// Puts the unlinked chain `other` where `id` is. The siblings that
    /// followed `id` now follow the tail of `other`; `id` ends up unlinked.
    pub fn replace(&mut self, id: NodeId, other: NodeId) -> AstResult<()> {
        self.check_exists(id)?;
        let location = self.location(id);
        if location == Location::Root {
            return Err(AstError::NotLinked(self.describe(id)));
        }
        self.check_unlinked(other)?;
        if self.would_cycle(id, other) {
            return Err(AstError::Cycle(self.describe(other)));
        }
        match location {
            Location::ChildOf(owner, slot) => *self.slot_link_mut(owner, slot)? = Some(other),
            Location::After(prev) => self.entries[prev.0].next = Some(other),
            Location::Root => {}
        }
        self.entries[other.0].location = location;
        self.entries[id.0].location = Location::Root;
        if let Some(tail) = self.entries[id.0].next.take() {
            let last = self.last(other);
            self.entries[last.0].next = Some(tail);
            self.entries[tail.0].location = Location::After(last);
        }
        Ok(())
    }

    /// Links the unlinked chain `other` right after `id`.
    ///
    /// If `id` already has a successor this fails unless `insert` is set, in
    /// which case the old successor follows the tail of `other`.
    pub fn append(&mut self, id: NodeId, other: NodeId, insert: bool) -> AstResult<()> {
        self.check_exists(id)?;
        self.check_unlinked(other)?;
        if self.would_cycle(id, other) {
            return Err(AstError::Cycle(self.describe(other)));
        }
        if let Some(next) = self.next(id) {
            if !insert {
                return Err(AstError::HasSuccessor(self.describe(id)));
            }
            let last = self.last(other);
            self.entries[last.0].next = Some(next);
            self.entries[next.0].location = Location::After(last);
        }
        self.entries[id.0].next = Some(other);
        self.entries[other.0].location = Location::After(id);
        Ok(())
    }

    /// Appends `other` at the tail of the chain starting at `id`.
    pub fn then(&mut self, id: NodeId, other: NodeId) -> AstResult<NodeId> {
        let last = self.last(id);
        self.append(last, other, false)?;
        Ok(id)
    }

    /// Concatenates independent chains. Returns `None` for no input.
    pub fn join(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> AstResult<Link> {
        let mut head = None;
        let mut tail: Option<NodeId> = None;
        for node in nodes {
            match tail {
                None => head = Some(node),
                Some(tail) => self.append(tail, node, false)?,
            }
            tail = Some(self.last(node));
        }
        Ok(head)
    }

    /// Installs the unlinked chain `node` into an empty slot.
    pub fn set_slot(&mut self, owner: NodeId, slot: Slot, node: NodeId) -> AstResult<()> {
        self.check_exists(owner)?;
        self.check_unlinked(node)?;
        if self.slot(owner, slot)?.is_some() {
            return Err(AstError::SlotOccupied {
                node: self.describe(owner),
                slot,
            });
        }
        if self.would_cycle(owner, node) {
            return Err(AstError::Cycle(self.describe(node)));
        }
        *self.slot_link_mut(owner, slot)? = Some(node);
        self.entries[node.0].location = Location::ChildOf(owner, slot);
        Ok(())
    }

    /// Appends `node` to the chain held by a slot, filling it if empty.
    pub fn push_slot(&mut self, owner: NodeId, slot: Slot, node: NodeId) -> AstResult<()> {
        match self.slot(owner, slot)? {
            None => self.set_slot(owner, slot, node),
            Some(head) => {
                let last = self.last(head);
                self.append(last, node, false)
            }
        }
    }

    pub fn with_doc(&mut self, id: NodeId, doc: impl Into<String>) -> NodeId {
        self.meta_mut(id).doc = Some(doc.into());
        id
    }

    pub fn with_comment(&mut self, id: NodeId, comment: impl Into<String>) -> NodeId {
        self.meta_mut(id).comment = Some(comment.into());
        id
    }

    fn named(&mut self, id: NodeId, name: impl Into<String>) -> NodeId {
        self.meta_mut(id).name = Some(name.into());
        id
    }

    //=========================================================================
    // Expressions
    //=========================================================================

    /// Integer literal typed `int`, `long`, `uint` or `ulong`.
    pub fn int_lit(&mut self, value: u64, unsigned: bool, long: bool, hex: bool) -> NodeId {
        let ty = match (unsigned, long) {
            (false, false) => Type::INT,
            (false, true) => Type::LONG,
            (true, false) => Type::UINT,
            (true, true) => Type::ULONG,
        };
        self.leaf(NodeKind::IntLit { value, ty, hex })
    }

    pub fn int(&mut self, value: u64) -> NodeId {
        self.int_lit(value, false, value > i32::MAX as u64, false)
    }

    pub fn long(&mut self, value: u64) -> NodeId {
        self.int_lit(value, false, true, false)
    }

    /// Unsigned hexadecimal literal, `ulong` when it does not fit a `uint`.
    pub fn uint_hex(&mut self, value: u64) -> NodeId {
        self.int_lit(value, true, value > u32::MAX as u64, true)
    }

    pub fn bool_lit(&mut self, value: bool) -> NodeId {
        self.leaf(NodeKind::BoolLit { value })
    }

    pub fn string_lit(&mut self, value: impl Into<String>) -> NodeId {
        self.leaf(NodeKind::StringLit {
            value: value.into(),
        })
    }

    pub fn hard_code(&mut self, code: impl Into<String>) -> NodeId {
        self.leaf(NodeKind::HardCode { code: code.into() })
    }

    pub fn hard_expr(&mut self, code: impl Into<String>, ty: Type) -> NodeId {
        self.leaf(NodeKind::HardExpr {
            code: code.into(),
            ty,
        })
    }

    pub fn this(&mut self) -> NodeId {
        self.leaf(NodeKind::This)
    }

    /// Placeholder to be replaced before emission.
    pub fn hole(&mut self) -> NodeId {
        self.leaf(NodeKind::Hole)
    }

    /// Reference to a variable or parameter declaration.
    pub fn var_ref(&mut self, decl: NodeId) -> AstResult<NodeId> {
        self.check_exists(decl)?;
        let ty = match self.kind(decl) {
            NodeKind::VariableDecl { ty, .. } | NodeKind::ArgDecl { ty, .. } => ty.clone(),
            _ => return Err(AstError::NotADeclaration(self.describe(decl))),
        };
        self.add(NodeKind::VarRef { decl, ty })
    }

    fn operand_type(&self, id: NodeId) -> AstResult<Type> {
        self.check_exists(id)?;
        self.expr_type(id)
            .ok_or_else(|| AstError::NotAnExpression(self.describe(id)))
    }

    pub fn binary(&mut self, op: crate::BinOp, lhs: NodeId, rhs: NodeId) -> AstResult<NodeId> {
        let lhs_ty = self.operand_type(lhs)?;
        self.operand_type(rhs)?;
        let ty = if op.is_predicate() {
            Type::BOOL
        } else if op.is_shift() {
            match lhs_ty.width() {
                None => {
                    return Err(AstError::InvalidOperand {
                        op: op.symbol(),
                        operand: self.describe(lhs),
                        ty: lhs_ty.to_string(),
                    })
                }
                Some(width) if width < 32 => Type::INT,
                Some(_) => lhs_ty,
            }
        } else {
            lhs_ty
        };
        self.add(NodeKind::Binary {
            op,
            lhs: Some(lhs),
            rhs: Some(rhs),
            ty,
        })
    }

    pub fn cond(&mut self, condition: NodeId, then: NodeId, otherwise: NodeId) -> AstResult<NodeId> {
        self.operand_type(condition)?;
        let ty = self.operand_type(then)?;
        self.operand_type(otherwise)?;
        self.add(NodeKind::Cond {
            condition: Some(condition),
            then: Some(then),
            otherwise: Some(otherwise),
            ty,
        })
    }

    pub fn cast(&mut self, ty: Type, expr: NodeId) -> AstResult<NodeId> {
        self.operand_type(expr)?;
        self.add(NodeKind::Cast {
            expr: Some(expr),
            ty,
        })
    }

    pub fn paren(&mut self, expr: NodeId) -> AstResult<NodeId> {
        let ty = self.operand_type(expr)?;
        self.add(NodeKind::Paren {
            expr: Some(expr),
            ty,
        })
    }

    pub fn assign(&mut self, lhs: NodeId, rhs: NodeId) -> AstResult<NodeId> {
        let ty = self.operand_type(lhs)?;
        self.add(NodeKind::Assign {
            lhs: Some(lhs),
            rhs: Some(rhs),
            ty,
        })
    }

    /// `object[index]` yielding an element of type `ty`.
    pub fn index(&mut self, object: NodeId, index: NodeId, ty: Type) -> AstResult<NodeId> {
        self.add(NodeKind::Index {
            object: Some(object),
            index: Some(index),
            ty,
        })
    }

    pub fn member(&mut self, object: NodeId, member: impl Into<String>, ty: Type) -> AstResult<NodeId> {
        self.add(NodeKind::Member {
            object: Some(object),
            member: member.into(),
            ty,
        })
    }

    /// Call argument, optionally named (`name: value`) or passed as `out`.
    pub fn arg(&mut self, value: NodeId, name: Option<&str>, out: bool) -> AstResult<NodeId> {
        self.add(NodeKind::Arg {
            value: Some(value),
            name: name.map(str::to_string),
            out,
        })
    }

    fn args(&mut self, values: Vec<NodeId>) -> AstResult<Link> {
        let mut args = Vec::with_capacity(values.len());
        for value in values {
            let arg = match self.kind(value) {
                NodeKind::Arg { .. } => value,
                _ => self.arg(value, None, false)?,
            };
            args.push(arg);
        }
        self.join(args)
    }

    /// Method call; plain expressions in `args` become positional arguments.
    pub fn call(
        &mut self,
        method: impl Into<String>,
        receiver: Option<NodeId>,
        args: Vec<NodeId>,
        ty: Option<Type>,
    ) -> AstResult<NodeId> {
        let args = self.args(args)?;
        self.add(NodeKind::Call {
            method: method.into(),
            receiver,
            args,
            ty,
        })
    }

    pub fn new_object(&mut self, ty: Type, args: Vec<NodeId>) -> AstResult<NodeId> {
        let args = self.args(args)?;
        self.add(NodeKind::New { ty, args })
    }

    pub fn new_array(&mut self, elem: Type, count: NodeId) -> AstResult<NodeId> {
        self.add(NodeKind::NewArray {
            elem,
            count: Some(count),
        })
    }

    //=========================================================================
    // Statements
    //=========================================================================

    pub fn variable(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        init: Option<NodeId>,
        access: Option<Access>,
    ) -> AstResult<NodeId> {
        let id = self.add(NodeKind::VariableDecl { ty, init, access })?;
        Ok(self.named(id, name))
    }

    /// Method parameter.
    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> NodeId {
        let id = self.leaf(NodeKind::ArgDecl {
            ty,
            init: None,
            out: false,
        });
        self.named(id, name)
    }

    pub fn stmt(&mut self, expr: NodeId) -> AstResult<NodeId> {
        self.add(NodeKind::StmtExpr { expr: Some(expr) })
    }

    pub fn ret(&mut self, expr: Option<NodeId>) -> AstResult<NodeId> {
        self.add(NodeKind::Return { expr })
    }

    pub fn throw(&mut self, expr: NodeId) -> AstResult<NodeId> {
        self.add(NodeKind::Throw { expr: Some(expr) })
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeId,
        then: Vec<NodeId>,
        otherwise: Vec<NodeId>,
    ) -> AstResult<NodeId> {
        let then = self.join(then)?;
        let otherwise = self.join(otherwise)?;
        self.add(NodeKind::If {
            condition: Some(condition),
            then,
            otherwise,
        })
    }

    //=========================================================================
    // Declarations
    //=========================================================================

    pub fn method(&mut self, def: MethodDef) -> AstResult<NodeId> {
        let params = self.join(def.params)?;
        let bodied = def.body.is_some();
        let body = self.join(def.body.unwrap_or_default())?;
        let id = self.add(NodeKind::Method {
            params,
            body,
            bodied,
            ctor: def.ctor,
            ret: def.ret,
            access: def.access,
            modifiers: def.modifiers,
        })?;
        Ok(self.named(id, def.name))
    }

    pub fn property(&mut self, def: PropertyDef) -> AstResult<NodeId> {
        let (get, get_body) = self.accessor(def.get)?;
        let (set, set_body) = self.accessor(def.set)?;
        let id = self.add(NodeKind::Property {
            ty: def.ty,
            get,
            set,
            get_body,
            set_body,
            access: def.access,
            modifiers: def.modifiers,
        })?;
        Ok(self.named(id, def.name))
    }

    fn accessor(&mut self, def: AccessorDef) -> AstResult<(Accessor, Link)> {
        Ok(match def {
            AccessorDef::Absent => (Accessor::Absent, None),
            AccessorDef::Auto => (Accessor::Auto, None),
            AccessorDef::Body(stmts) => (Accessor::Body, self.join(stmts)?),
        })
    }

    pub fn class(&mut self, def: ClassDef) -> AstResult<NodeId> {
        let fields = self.join(def.fields)?;
        let properties = self.join(def.properties)?;
        let methods = self.join(def.methods)?;
        let classes = self.join(def.classes)?;
        let id = self.add(NodeKind::Class {
            fields,
            properties,
            methods,
            classes,
            derives: def.derives,
            access: def.access,
            modifiers: def.modifiers,
            is_struct: def.is_struct,
        })?;
        Ok(self.named(id, def.name))
    }

    pub fn namespace(
        &mut self,
        name: impl Into<String>,
        classes: Vec<NodeId>,
        namespaces: Vec<NodeId>,
    ) -> AstResult<NodeId> {
        let classes = self.join(classes)?;
        let namespaces = self.join(namespaces)?;
        let id = self.add(NodeKind::Namespace {
            classes,
            namespaces,
        })?;
        Ok(self.named(id, name))
    }
}
