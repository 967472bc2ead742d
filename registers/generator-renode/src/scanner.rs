// Licensed under the Apache-2.0 license

//! Collects registers, register arrays and reset values from a description.

use anyhow::{bail, Result};
use log::{debug, info};

use crate::model::{Field, Reg, RegArray, ScannedState};
use crate::rdl::{AddrMapNode, FieldNode, GroupNode, RdlListener, RdlWalker, RegNode, WalkerAction};

/// What the fields currently being reported belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Current {
    Register,
    Array,
}

/// Listener building a [`ScannedState`].
///
/// Register files and nested address maps prefix the names of everything
/// they contain. Inside a memory every register becomes a [`RegArray`];
/// outside one only registers declared with an array dimension do.
pub struct RdlDesignScanner {
    state: ScannedState,
    groups: Vec<String>,
    addrmap_depth: usize,
    /// Name and address of the memory being walked.
    memory: Option<(String, u64)>,
    arrays_in_memory: usize,
    current: Option<Current>,
}

impl RdlDesignScanner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: ScannedState {
                name: name.into(),
                ..Default::default()
            },
            groups: vec![],
            addrmap_depth: 0,
            memory: None,
            arrays_in_memory: 0,
            current: None,
        }
    }

    /// Walks `top` and returns what was collected.
    pub fn scan(top: &AddrMapNode) -> Result<ScannedState> {
        let mut scanner = Self::new(top.name.clone());
        RdlWalker.walk(top, &mut scanner)?;
        let state = scanner.state;
        info!(
            "Scanned `{}`: {} registers, {} register arrays",
            state.name,
            state.registers.len(),
            state.register_arrays.len()
        );
        Ok(state)
    }

    fn array_name(&mut self, reg: &RegNode) -> String {
        match &self.memory {
            Some((memory, _)) => {
                self.arrays_in_memory += 1;
                if self.arrays_in_memory == 1 {
                    memory.clone()
                } else {
                    format!("{memory}_{}", reg.name)
                }
            }
            None => reg.name.clone(),
        }
    }
}

impl RdlListener for RdlDesignScanner {
    fn enter_addrmap(&mut self, node: &GroupNode, _address: u64) -> Result<WalkerAction> {
        if self.addrmap_depth > 0 {
            self.groups.push(node.name.clone());
        }
        self.addrmap_depth += 1;
        Ok(WalkerAction::Continue)
    }

    fn exit_addrmap(&mut self, _node: &GroupNode) -> Result<()> {
        self.addrmap_depth = self.addrmap_depth.saturating_sub(1);
        if self.addrmap_depth > 0 {
            self.groups.pop();
        }
        Ok(())
    }

    fn enter_regfile(&mut self, node: &GroupNode, _address: u64) -> Result<WalkerAction> {
        self.groups.push(node.name.clone());
        Ok(WalkerAction::Continue)
    }

    fn exit_regfile(&mut self, _node: &GroupNode) -> Result<()> {
        self.groups.pop();
        Ok(())
    }

    fn enter_mem(&mut self, node: &GroupNode, address: u64) -> Result<WalkerAction> {
        if let Some((outer, _)) = &self.memory {
            bail!(
                "Encountered a nested memory `{}` inside memory `{}`",
                node.name,
                outer
            );
        }
        debug!("Entering memory `{}` at {address:#x}", node.name);
        self.memory = Some((node.name.clone(), address));
        self.arrays_in_memory = 0;
        Ok(WalkerAction::Continue)
    }

    fn exit_mem(&mut self, _node: &GroupNode) -> Result<()> {
        self.memory = None;
        Ok(())
    }

    fn enter_reg(&mut self, node: &RegNode, address: u64) -> Result<WalkerAction> {
        if node.array.len() > 1 {
            bail!(
                "Register `{}` has {} array dimensions; only one is supported",
                node.name,
                node.array.len()
            );
        }
        let register = Reg {
            name: node.name.clone(),
            groups: self.groups.clone(),
            address,
            width: node.width,
            fields: vec![],
        };
        if self.memory.is_none() && node.array.is_empty() {
            debug!("Register `{}` at {address:#x}", register.doc_name());
            self.state.resets.insert(register.type_name(), 0);
            self.state.registers.push(register);
            self.current = Some(Current::Register);
        } else {
            let array = RegArray {
                name: self.array_name(node),
                groups: self.groups.clone(),
                register,
                address,
                count: node.array.first().copied().unwrap_or(1),
                stride: node.stride(),
            };
            debug!(
                "Register array `{}` at {address:#x}: {} x {} bytes",
                array.name, array.count, array.stride
            );
            self.state.register_arrays.push(array);
            self.current = Some(Current::Array);
        }
        Ok(WalkerAction::Continue)
    }

    fn exit_reg(&mut self, _node: &RegNode) -> Result<()> {
        self.current = None;
        Ok(())
    }

    fn enter_field(&mut self, node: &FieldNode) -> Result<()> {
        let field = Field::from(node);
        match self.current {
            Some(Current::Register) => {
                let Some(reg) = self.state.registers.last_mut() else {
                    bail!("Field `{}` has no enclosing register", field.name);
                };
                if field.reset != 0 {
                    *self.state.resets.entry(reg.type_name()).or_default() |=
                        field.reset_contribution();
                }
                reg.fields.push(field);
            }
            Some(Current::Array) => {
                let Some(array) = self.state.register_arrays.last_mut() else {
                    bail!("Field `{}` has no enclosing register array", field.name);
                };
                if field.reset != 0 {
                    debug!(
                        "Field `{}` resets every element of `{}` to {:#x}",
                        field.name, array.name, field.reset
                    );
                }
                array.register.fields.push(field);
            }
            None => bail!("Field `{}` has no enclosing register", field.name),
        }
        Ok(())
    }
}
