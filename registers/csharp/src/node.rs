// Licensed under the Apache-2.0 license

//! Node kinds of the C# tree.
//!
//! Every node lives in the [`Ast`](crate::Ast) arena and is addressed by a
//! [`NodeId`]. Child positions are named [`Slot`]s holding an optional chain
//! head; an empty slot is `None`.

use crate::types::{Access, Modifiers, Type};

/// Handle of a node in the arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Head of a sibling chain stored in a slot, `None` when the slot is empty.
pub type Link = Option<NodeId>;

/// Named child positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Slot {
    Lhs,
    Rhs,
    Expr,
    Condition,
    Then,
    Else,
    Object,
    Index,
    Receiver,
    Args,
    Count,
    Value,
    Init,
    Params,
    Body,
    Get,
    Set,
    Fields,
    Properties,
    Methods,
    Classes,
    Namespaces,
}

/// Where a node is attached. Only the head of a chain is attached to a slot;
/// every later sibling is attached after its predecessor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Location {
    Root,
    ChildOf(NodeId, Slot),
    After(NodeId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
    And,
    Xor,
    Or,
    LAnd,
    LOr,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::UShr => ">>>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Lte => "<=",
            BinOp::Gte => ">=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::And => "&",
            BinOp::Xor => "^",
            BinOp::Or => "|",
            BinOp::LAnd => "&&",
            BinOp::LOr => "||",
        }
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr | BinOp::UShr)
    }

    /// Comparisons and logical connectives produce `bool`.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            BinOp::Lt
                | BinOp::Gt
                | BinOp::Lte
                | BinOp::Gte
                | BinOp::Eq
                | BinOp::Neq
                | BinOp::LAnd
                | BinOp::LOr
        )
    }
}

/// Shape of one property accessor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Accessor {
    #[default]
    Absent,
    /// `get;`
    Auto,
    /// `get { ... }`
    Body,
}

/// Attributes shared by every node.
#[derive(Clone, Debug)]
pub struct Meta {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub doc: Option<String>,
    pub indents: bool,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            name: None,
            comment: None,
            doc: None,
            indents: true,
        }
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Placeholder occupying a position while a subtree is being moved.
    Hole,
    HardCode {
        code: String,
    },
    HardExpr {
        code: String,
        ty: Type,
    },
    IntLit {
        value: u64,
        ty: Type,
        hex: bool,
    },
    BoolLit {
        value: bool,
    },
    StringLit {
        value: String,
    },
    /// Use of a variable or parameter; renders the declaration's name.
    VarRef {
        decl: NodeId,
        ty: Type,
    },
    This,
    Binary {
        op: BinOp,
        lhs: Link,
        rhs: Link,
        ty: Type,
    },
    Cond {
        condition: Link,
        then: Link,
        otherwise: Link,
        ty: Type,
    },
    Cast {
        expr: Link,
        ty: Type,
    },
    Paren {
        expr: Link,
        ty: Type,
    },
    Assign {
        lhs: Link,
        rhs: Link,
        ty: Type,
    },
    Index {
        object: Link,
        index: Link,
        ty: Type,
    },
    Member {
        object: Link,
        member: String,
        ty: Type,
    },
    Call {
        method: String,
        receiver: Link,
        args: Link,
        ty: Option<Type>,
    },
    New {
        ty: Type,
        args: Link,
    },
    NewArray {
        elem: Type,
        count: Link,
    },
    Arg {
        value: Link,
        name: Option<String>,
        out: bool,
    },
    VariableDecl {
        ty: Type,
        init: Link,
        access: Option<Access>,
    },
    ArgDecl {
        ty: Type,
        init: Link,
        out: bool,
    },
    StmtExpr {
        expr: Link,
    },
    Return {
        expr: Link,
    },
    Throw {
        expr: Link,
    },
    If {
        condition: Link,
        then: Link,
        otherwise: Link,
    },
    Method {
        params: Link,
        body: Link,
        /// Without a body the method renders as a declaration ending in `;`.
        bodied: bool,
        ctor: bool,
        ret: Option<Type>,
        access: Option<Access>,
        modifiers: Modifiers,
    },
    Property {
        ty: Type,
        get: Accessor,
        set: Accessor,
        get_body: Link,
        set_body: Link,
        access: Option<Access>,
        modifiers: Modifiers,
    },
    Class {
        fields: Link,
        properties: Link,
        methods: Link,
        classes: Link,
        derives: Vec<(Option<Access>, Type)>,
        access: Option<Access>,
        modifiers: Modifiers,
        is_struct: bool,
    },
    Namespace {
        classes: Link,
        namespaces: Link,
    },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Hole => "Hole",
            NodeKind::HardCode { .. } => "HardCode",
            NodeKind::HardExpr { .. } => "HardExpr",
            NodeKind::IntLit { .. } => "IntLit",
            NodeKind::BoolLit { .. } => "BoolLit",
            NodeKind::StringLit { .. } => "StringLit",
            NodeKind::VarRef { .. } => "VarRef",
            NodeKind::This => "This",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Cond { .. } => "Cond",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Paren { .. } => "Paren",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::Index { .. } => "Index",
            NodeKind::Member { .. } => "Member",
            NodeKind::Call { .. } => "Call",
            NodeKind::New { .. } => "New",
            NodeKind::NewArray { .. } => "NewArray",
            NodeKind::Arg { .. } => "Arg",
            NodeKind::VariableDecl { .. } => "VariableDecl",
            NodeKind::ArgDecl { .. } => "ArgDecl",
            NodeKind::StmtExpr { .. } => "StmtExpr",
            NodeKind::Return { .. } => "Return",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::If { .. } => "If",
            NodeKind::Method { .. } => "Method",
            NodeKind::Property { .. } => "Property",
            NodeKind::Class { .. } => "Class",
            NodeKind::Namespace { .. } => "Namespace",
        }
    }

    /// Result type of expression kinds, `None` for everything else.
    pub fn expr_type(&self) -> Option<Type> {
        match self {
            NodeKind::HardExpr { ty, .. }
            | NodeKind::IntLit { ty, .. }
            | NodeKind::VarRef { ty, .. }
            | NodeKind::Binary { ty, .. }
            | NodeKind::Cond { ty, .. }
            | NodeKind::Cast { ty, .. }
            | NodeKind::Paren { ty, .. }
            | NodeKind::Assign { ty, .. }
            | NodeKind::Index { ty, .. }
            | NodeKind::Member { ty, .. }
            | NodeKind::New { ty, .. } => Some(ty.clone()),
            NodeKind::BoolLit { .. } => Some(Type::BOOL),
            NodeKind::StringLit { .. } => Some(Type::STRING),
            NodeKind::Call { ty, .. } => ty.clone(),
            NodeKind::NewArray { elem, .. } => Some(elem.array()),
            _ => None,
        }
    }

    /// Binary and ternary operator nodes.
    pub fn is_operator(&self) -> bool {
        matches!(self, NodeKind::Binary { .. } | NodeKind::Cond { .. })
    }

    /// Slots in child order.
    pub fn slots(&self) -> Vec<(Slot, Link)> {
        match self {
            NodeKind::Hole
            | NodeKind::HardCode { .. }
            | NodeKind::HardExpr { .. }
            | NodeKind::IntLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::VarRef { .. }
            | NodeKind::This => vec![],
            NodeKind::Binary { lhs, rhs, .. } | NodeKind::Assign { lhs, rhs, .. } => {
                vec![(Slot::Lhs, *lhs), (Slot::Rhs, *rhs)]
            }
            NodeKind::Cond {
                condition,
                then,
                otherwise,
                ..
            }
            | NodeKind::If {
                condition,
                then,
                otherwise,
            } => vec![
                (Slot::Condition, *condition),
                (Slot::Then, *then),
                (Slot::Else, *otherwise),
            ],
            NodeKind::Cast { expr, .. }
            | NodeKind::Paren { expr, .. }
            | NodeKind::StmtExpr { expr }
            | NodeKind::Return { expr }
            | NodeKind::Throw { expr } => vec![(Slot::Expr, *expr)],
            NodeKind::Index { object, index, .. } => {
                vec![(Slot::Object, *object), (Slot::Index, *index)]
            }
            NodeKind::Member { object, .. } => vec![(Slot::Object, *object)],
            NodeKind::Call { receiver, args, .. } => {
                vec![(Slot::Receiver, *receiver), (Slot::Args, *args)]
            }
            NodeKind::New { args, .. } => vec![(Slot::Args, *args)],
            NodeKind::NewArray { count, .. } => vec![(Slot::Count, *count)],
            NodeKind::Arg { value, .. } => vec![(Slot::Value, *value)],
            NodeKind::VariableDecl { init, .. } | NodeKind::ArgDecl { init, .. } => {
                vec![(Slot::Init, *init)]
            }
            NodeKind::Method { params, body, .. } => {
                vec![(Slot::Params, *params), (Slot::Body, *body)]
            }
            NodeKind::Property {
                get_body, set_body, ..
            } => vec![(Slot::Get, *get_body), (Slot::Set, *set_body)],
            NodeKind::Class {
                fields,
                properties,
                methods,
                classes,
                ..
            } => vec![
                (Slot::Fields, *fields),
                (Slot::Properties, *properties),
                (Slot::Methods, *methods),
                (Slot::Classes, *classes),
            ],
            NodeKind::Namespace {
                classes,
                namespaces,
            } => vec![(Slot::Classes, *classes), (Slot::Namespaces, *namespaces)],
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<Link> {
        self.slots()
            .into_iter()
            .find_map(|(s, link)| (s == slot).then_some(link))
    }

    pub fn slot_mut(&mut self, slot: Slot) -> Option<&mut Link> {
        match (self, slot) {
            (NodeKind::Binary { lhs, .. } | NodeKind::Assign { lhs, .. }, Slot::Lhs) => Some(lhs),
            (NodeKind::Binary { rhs, .. } | NodeKind::Assign { rhs, .. }, Slot::Rhs) => Some(rhs),
            (
                NodeKind::Cond { condition, .. } | NodeKind::If { condition, .. },
                Slot::Condition,
            ) => Some(condition),
            (NodeKind::Cond { then, .. } | NodeKind::If { then, .. }, Slot::Then) => Some(then),
            (NodeKind::Cond { otherwise, .. } | NodeKind::If { otherwise, .. }, Slot::Else) => {
                Some(otherwise)
            }
            (
                NodeKind::Cast { expr, .. }
                | NodeKind::Paren { expr, .. }
                | NodeKind::StmtExpr { expr }
                | NodeKind::Return { expr }
                | NodeKind::Throw { expr },
                Slot::Expr,
            ) => Some(expr),
            (NodeKind::Index { object, .. } | NodeKind::Member { object, .. }, Slot::Object) => {
                Some(object)
            }
            (NodeKind::Index { index, .. }, Slot::Index) => Some(index),
            (NodeKind::Call { receiver, .. }, Slot::Receiver) => Some(receiver),
            (NodeKind::Call { args, .. } | NodeKind::New { args, .. }, Slot::Args) => Some(args),
            (NodeKind::NewArray { count, .. }, Slot::Count) => Some(count),
            (NodeKind::Arg { value, .. }, Slot::Value) => Some(value),
            (
                NodeKind::VariableDecl { init, .. } | NodeKind::ArgDecl { init, .. },
                Slot::Init,
            ) => Some(init),
            (NodeKind::Method { params, .. }, Slot::Params) => Some(params),
            (NodeKind::Method { body, .. }, Slot::Body) => Some(body),
            (NodeKind::Property { get_body, .. }, Slot::Get) => Some(get_body),
            (NodeKind::Property { set_body, .. }, Slot::Set) => Some(set_body),
            (NodeKind::Class { fields, .. }, Slot::Fields) => Some(fields),
            (NodeKind::Class { properties, .. }, Slot::Properties) => Some(properties),
            (NodeKind::Class { methods, .. }, Slot::Methods) => Some(methods),
            (
                NodeKind::Class { classes, .. } | NodeKind::Namespace { classes, .. },
                Slot::Classes,
            ) => Some(classes),
            (NodeKind::Namespace { namespaces, .. }, Slot::Namespaces) => Some(namespaces),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lookup() {
        let kind = NodeKind::Binary {
            op: BinOp::Add,
            lhs: Some(NodeId(1)),
            rhs: None,
            ty: Type::INT,
        };
        assert_eq!(kind.slot(Slot::Lhs), Some(Some(NodeId(1))));
        assert_eq!(kind.slot(Slot::Rhs), Some(None));
        assert_eq!(kind.slot(Slot::Body), None);
    }

    #[test]
    fn test_slot_mut_matches_slots() {
        let mut kind = NodeKind::Class {
            fields: None,
            properties: None,
            methods: None,
            classes: None,
            derives: vec![],
            access: None,
            modifiers: Modifiers::NONE,
            is_struct: false,
        };
        for (slot, _) in kind.clone().slots() {
            assert!(kind.slot_mut(slot).is_some(), "{slot:?}");
        }
        assert!(kind.slot_mut(Slot::Lhs).is_none());
    }
}
