// Licensed under the Apache-2.0 license

//! Value types of the C# model: primitive and named types, accessibility
//! and declaration modifiers.

use std::fmt;

/// Built-in C# primitive types.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Primitive {
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Bool,
    String,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::SByte => "sbyte",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::Bool => "bool",
            Primitive::String => "string",
        }
    }

    /// Width in bits. `bool` reports its storage width.
    pub fn width(self) -> Option<u32> {
        match self {
            Primitive::SByte | Primitive::Byte | Primitive::Bool => Some(8),
            Primitive::Short | Primitive::UShort => Some(16),
            Primitive::Int | Primitive::UInt => Some(32),
            Primitive::Long | Primitive::ULong => Some(64),
            Primitive::String => None,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::UShort | Primitive::UInt | Primitive::ULong
        )
    }
}

/// A C# type reference.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Named(String),
    Array(Box<Type>),
}

impl Type {
    pub const SBYTE: Type = Type::Primitive(Primitive::SByte);
    pub const BYTE: Type = Type::Primitive(Primitive::Byte);
    pub const SHORT: Type = Type::Primitive(Primitive::Short);
    pub const USHORT: Type = Type::Primitive(Primitive::UShort);
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const UINT: Type = Type::Primitive(Primitive::UInt);
    pub const LONG: Type = Type::Primitive(Primitive::Long);
    pub const ULONG: Type = Type::Primitive(Primitive::ULong);
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const STRING: Type = Type::Primitive(Primitive::String);

    pub fn named(name: impl Into<String>) -> Type {
        Type::Named(name.into())
    }

    /// Array-of-`self` type.
    pub fn array(&self) -> Type {
        Type::Array(Box::new(self.clone()))
    }

    pub fn width(&self) -> Option<u32> {
        match self {
            Type::Primitive(p) => p.width(),
            _ => None,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_unsigned())
    }

    pub fn is_long(&self) -> bool {
        self.width().is_some_and(|w| w > 32)
    }

    /// Value with every bit of the type's width set.
    pub fn all_ones(&self) -> Option<u64> {
        self.width()
            .map(|w| if w >= 64 { u64::MAX } else { (1u64 << w) - 1 })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Named(name) => f.write_str(name),
            Type::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Access {
    Public,
    Internal,
    Protected,
    Private,
}

impl Access {
    pub fn keyword(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Internal => "internal",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

/// Declaration modifiers rendered before the return/declared type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub partial: bool,
    pub is_static: bool,
    pub is_override: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        partial: false,
        is_static: false,
        is_override: false,
        is_virtual: false,
        is_abstract: false,
    };

    pub const PARTIAL: Modifiers = Modifiers {
        partial: true,
        ..Modifiers::NONE
    };

    /// Keywords in C# declaration order, each followed by a space.
    pub fn prefix(&self) -> String {
        let mut prefix = String::new();
        for (set, keyword) in [
            (self.partial, "partial "),
            (self.is_static, "static "),
            (self.is_override, "override "),
            (self.is_virtual, "virtual "),
            (self.is_abstract, "abstract "),
        ] {
            if set {
                prefix.push_str(keyword);
            }
        }
        prefix
    }
}
