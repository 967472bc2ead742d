// Licensed under the Apache-2.0 license

//! Register model collected from a description.
//!
//! - [`Field`]: bit range of a register with access tags and reset value
//! - [`Reg`]: a register at one absolute address
//! - [`RegArray`]: a register repeated with a fixed stride
//! - [`ScannedState`]: everything one peripheral is generated from

use std::collections::HashMap;

use crate::rdl::{FieldNode, OnRead, OnWrite};
use crate::util::{hex_address, pascal_case, pascal_path};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Lowest bit, inclusive.
    pub low: u32,
    /// Highest bit, inclusive.
    pub high: u32,
    pub sw_readable: bool,
    pub sw_writable: bool,
    pub reset: u64,
    pub onread: Option<OnRead>,
    pub onwrite: Option<OnWrite>,
}

impl Field {
    pub fn new(name: impl Into<String>, low: u32, high: u32) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            sw_readable: true,
            sw_writable: true,
            reset: 0,
            onread: None,
            onwrite: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }

    /// Mask of `width` ones, not shifted.
    pub fn value_mask(&self) -> u128 {
        1u128
            .checked_shl(self.width())
            .map_or(u128::MAX, |bit| bit - 1)
    }

    /// Mask of the field's bits within its register.
    pub fn register_mask(&self) -> u128 {
        self.value_mask().checked_shl(self.low).unwrap_or(0)
    }

    /// The field's reset value placed at its position in the register.
    pub fn reset_contribution(&self) -> u128 {
        (u128::from(self.reset) & self.value_mask())
            .checked_shl(self.low)
            .unwrap_or(0)
    }

    /// Side effect of a software read, `None` for a plain or no read.
    pub fn read_effect(&self) -> Option<OnRead> {
        self.onread
            .filter(|effect| self.sw_readable && *effect != OnRead::Ruser)
    }

    /// Side effect of a software write, `None` for a plain or no write.
    pub fn write_effect(&self) -> Option<OnWrite> {
        self.onwrite
            .filter(|effect| self.sw_writable && *effect != OnWrite::Wuser)
    }

    pub fn is_plain_writable(&self) -> bool {
        self.sw_writable && self.write_effect().is_none()
    }

    pub fn overlaps(&self, other: &Field) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    /// Name of the generated property.
    pub fn property_name(&self) -> String {
        self.name.to_uppercase()
    }
}

impl From<&FieldNode> for Field {
    fn from(node: &FieldNode) -> Self {
        Self {
            name: node.name.clone(),
            low: node.low(),
            high: node.high(),
            sw_readable: node.is_sw_readable(),
            sw_writable: node.is_sw_writable(),
            reset: node.reset,
            onread: node.onread,
            onwrite: node.onwrite,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reg {
    pub name: String,
    /// Names of the enclosing register groups, outermost first.
    pub groups: Vec<String>,
    pub address: u64,
    /// Width in bits.
    pub width: u32,
    pub fields: Vec<Field>,
}

impl Reg {
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            groups: vec![],
            address,
            width: 32,
            fields: vec![],
        }
    }

    /// Name of the peripheral member holding this register.
    pub fn variable_name(&self) -> String {
        pascal_path(&self.groups, &self.name)
    }

    pub fn type_name(&self) -> String {
        format!("{}Type", self.variable_name())
    }

    /// Dotted path used in doc comments.
    pub fn doc_name(&self) -> String {
        self.groups
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Size of the register's backing buffer in bytes. At least one double
    /// word so that whole-word accesses stay in bounds.
    pub fn size(&self) -> u64 {
        u64::from(self.width).div_ceil(8).max(4)
    }

    pub fn reset_value(&self) -> u128 {
        self.fields
            .iter()
            .fold(0, |acc, f| acc | f.reset_contribution())
    }

    fn access_mask(&self, include: impl Fn(&Field) -> bool) -> u128 {
        self.fields
            .iter()
            .filter(|f| include(f))
            .fold(0, |acc, f| acc | f.register_mask())
    }

    pub fn readable_mask(&self) -> u128 {
        self.access_mask(|f| f.sw_readable)
    }

    /// Bits taking the written value as is.
    pub fn writable_mask(&self) -> u128 {
        self.access_mask(Field::is_plain_writable)
    }

    /// Bits reacting to a write with `effect`.
    pub fn write_effect_mask(&self, effect: OnWrite) -> u128 {
        self.access_mask(|f| f.write_effect() == Some(effect))
    }

    /// Bits reacting to a read with `effect`.
    pub fn read_effect_mask(&self, effect: OnRead) -> u128 {
        self.access_mask(|f| f.read_effect() == Some(effect))
    }

    pub fn doc(&self) -> String {
        format!(
            "Register \"{}\" at {}",
            self.doc_name(),
            hex_address(self.address)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegArray {
    /// Name of the array, usually the memory holding it.
    pub name: String,
    pub groups: Vec<String>,
    /// Template register; its fields describe every element.
    pub register: Reg,
    /// Absolute address of element 0.
    pub address: u64,
    pub count: u64,
    /// Distance in bytes between elements.
    pub stride: u64,
}

impl RegArray {
    pub fn variable_name(&self) -> String {
        pascal_path(&self.groups, &self.name)
    }

    /// Name of the container type.
    pub fn type_name(&self) -> String {
        format!("{}Type", self.variable_name())
    }

    /// Name of the per-element wrapper type.
    pub fn wrapper_name(&self) -> String {
        format!(
            "{}_{}Wrapper",
            pascal_case(&self.name),
            pascal_case(&self.register.name)
        )
    }

    /// Total size in bytes.
    pub fn size(&self) -> u64 {
        self.count * self.stride
    }

    pub fn end(&self) -> u64 {
        self.address + self.size()
    }

    /// Size of the backing buffer in bytes. A double word access may start
    /// at any byte of the array, so three bytes of slack follow it.
    pub fn buffer_size(&self) -> u64 {
        self.size() + 3
    }

    /// Nonzero bytes of the template's reset value as `(offset, byte)`
    /// pairs, for every element.
    pub fn reset_bytes(&self) -> Vec<(u64, u8)> {
        let reset = self.register.reset_value();
        let width = u64::from(self.register.width).div_ceil(8);
        let template: Vec<(u64, u8)> = (0..width)
            .filter_map(|i| {
                let byte = (reset.checked_shr((i * 8) as u32).unwrap_or(0) & 0xff) as u8;
                (byte != 0).then_some((i, byte))
            })
            .collect();
        (0..self.count)
            .flat_map(|element| {
                template
                    .iter()
                    .map(move |(i, byte)| (element * self.stride + i, *byte))
            })
            .collect()
    }

    pub fn doc(&self) -> String {
        format!(
            "Memory \"{}\" at {}, {} elements of \"{}\" every {} bytes",
            self.name,
            hex_address(self.address),
            self.count,
            self.register.name,
            self.stride
        )
    }
}

/// Everything collected for one peripheral.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScannedState {
    pub name: String,
    pub registers: Vec<Reg>,
    pub register_arrays: Vec<RegArray>,
    /// Composite reset value by register type name.
    pub resets: HashMap<String, u128>,
}

impl ScannedState {
    pub fn reset_of(&self, reg: &Reg) -> u128 {
        self.resets.get(&reg.type_name()).copied().unwrap_or(0)
    }
}
