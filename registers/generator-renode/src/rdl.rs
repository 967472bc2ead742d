// Licensed under the Apache-2.0 license

//! Register description tree and the listener-based walker over it.
//!
//! The tree is the elaborated form of a register description: address maps,
//! register files and memories nest, registers carry their fields. Nodes can
//! be deserialized from TOML or JSON:
//!
//! ```toml
//! name = "uart"
//!
//! [[children]]
//! type = "reg"
//! name = "ctrl"
//! offset = 0x10
//! fields = [
//!     { name = "enable", lsb = 0, msb = 0, reset = 1 },
//!     { name = "mode", lsb = 1, msb = 2 },
//! ]
//! ```
//!
//! [`RdlWalker`] visits the tree in pre-order and reports every node to an
//! [`RdlListener`] together with its absolute address.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Software access of a field.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwAccess {
    #[default]
    Rw,
    R,
    W,
    Na,
}

/// Side effect of a software read on the field.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnRead {
    /// Cleared after the read.
    Rclr,
    /// Set after the read.
    Rset,
    /// Left to user code; read as a plain field.
    Ruser,
}

/// Side effect of a software write on the field.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnWrite {
    /// Written ones set bits.
    Woset,
    /// Written ones clear bits.
    Woclr,
    /// Written ones toggle bits.
    Wot,
    /// Written zeros set bits.
    Wzs,
    /// Written zeros clear bits.
    Wzc,
    /// Written zeros toggle bits.
    Wzt,
    /// Any write clears the field.
    Wclr,
    /// Any write sets the field.
    Wset,
    /// Left to user code; written as a plain field.
    Wuser,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FieldNode {
    pub name: String,
    pub lsb: u32,
    pub msb: u32,
    #[serde(default)]
    pub sw: SwAccess,
    #[serde(default)]
    pub reset: u64,
    #[serde(default)]
    pub onread: Option<OnRead>,
    #[serde(default)]
    pub onwrite: Option<OnWrite>,
}

impl FieldNode {
    pub fn low(&self) -> u32 {
        self.lsb.min(self.msb)
    }

    pub fn high(&self) -> u32 {
        self.lsb.max(self.msb)
    }

    pub fn is_sw_readable(&self) -> bool {
        matches!(self.sw, SwAccess::Rw | SwAccess::R)
    }

    pub fn is_sw_writable(&self) -> bool {
        matches!(self.sw, SwAccess::Rw | SwAccess::W)
    }
}

fn default_reg_width() -> u32 {
    32
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegNode {
    pub name: String,
    #[serde(default)]
    pub offset: u64,
    /// Register width in bits.
    #[serde(default = "default_reg_width")]
    pub width: u32,
    /// Array dimensions, empty for a single register.
    #[serde(default)]
    pub array: Vec<u64>,
    /// Distance in bytes between array elements.
    #[serde(default)]
    pub stride: Option<u64>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl RegNode {
    /// Size in bytes.
    pub fn size(&self) -> u64 {
        u64::from(self.width).div_ceil(8)
    }

    pub fn stride(&self) -> u64 {
        self.stride.unwrap_or_else(|| self.size())
    }
}

/// Address map, register file or memory.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GroupNode {
    pub name: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub children: Vec<Component>,
}

/// Top level node of a description.
pub type AddrMapNode = GroupNode;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Reg(RegNode),
    RegFile(GroupNode),
    Mem(GroupNode),
    AddrMap(GroupNode),
}

impl GroupNode {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a description, choosing the format by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&text),
            Some("json") => Self::from_json(&text),
            _ => bail!(
                "Unsupported description format: {} (expected .toml or .json)",
                path.display()
            ),
        }
        .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkerAction {
    Continue,
    SkipDescendants,
}

/// Callbacks invoked by [`RdlWalker`]. Every method defaults to a no-op.
pub trait RdlListener {
    fn enter_addrmap(&mut self, _node: &GroupNode, _address: u64) -> Result<WalkerAction> {
        Ok(WalkerAction::Continue)
    }

    fn exit_addrmap(&mut self, _node: &GroupNode) -> Result<()> {
        Ok(())
    }

    fn enter_regfile(&mut self, _node: &GroupNode, _address: u64) -> Result<WalkerAction> {
        Ok(WalkerAction::Continue)
    }

    fn exit_regfile(&mut self, _node: &GroupNode) -> Result<()> {
        Ok(())
    }

    fn enter_mem(&mut self, _node: &GroupNode, _address: u64) -> Result<WalkerAction> {
        Ok(WalkerAction::Continue)
    }

    fn exit_mem(&mut self, _node: &GroupNode) -> Result<()> {
        Ok(())
    }

    fn enter_reg(&mut self, _node: &RegNode, _address: u64) -> Result<WalkerAction> {
        Ok(WalkerAction::Continue)
    }

    fn exit_reg(&mut self, _node: &RegNode) -> Result<()> {
        Ok(())
    }

    fn enter_field(&mut self, _node: &FieldNode) -> Result<()> {
        Ok(())
    }

    fn exit_field(&mut self, _node: &FieldNode) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum GroupKind {
    AddrMap,
    RegFile,
    Mem,
}

/// Pre-order walker over a description tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct RdlWalker;

impl RdlWalker {
    /// Walks `top`, whose offset is its absolute base address.
    pub fn walk(&self, top: &AddrMapNode, listener: &mut dyn RdlListener) -> Result<()> {
        self.walk_group(GroupKind::AddrMap, top, top.offset, listener)
    }

    fn walk_group(
        &self,
        kind: GroupKind,
        node: &GroupNode,
        address: u64,
        listener: &mut dyn RdlListener,
    ) -> Result<()> {
        let action = match kind {
            GroupKind::AddrMap => listener.enter_addrmap(node, address)?,
            GroupKind::RegFile => listener.enter_regfile(node, address)?,
            GroupKind::Mem => listener.enter_mem(node, address)?,
        };
        if action == WalkerAction::Continue {
            for child in &node.children {
                match child {
                    Component::Reg(reg) => self.walk_reg(reg, address + reg.offset, listener)?,
                    Component::RegFile(group) => {
                        self.walk_group(GroupKind::RegFile, group, address + group.offset, listener)?
                    }
                    Component::Mem(group) => {
                        self.walk_group(GroupKind::Mem, group, address + group.offset, listener)?
                    }
                    Component::AddrMap(group) => {
                        self.walk_group(GroupKind::AddrMap, group, address + group.offset, listener)?
                    }
                }
            }
        }
        match kind {
            GroupKind::AddrMap => listener.exit_addrmap(node),
            GroupKind::RegFile => listener.exit_regfile(node),
            GroupKind::Mem => listener.exit_mem(node),
        }
    }

    fn walk_reg(&self, reg: &RegNode, address: u64, listener: &mut dyn RdlListener) -> Result<()> {
        if listener.enter_reg(reg, address)? == WalkerAction::Continue {
            for field in &reg.fields {
                listener.enter_field(field)?;
                listener.exit_field(field)?;
            }
        }
        listener.exit_reg(reg)
    }
}
