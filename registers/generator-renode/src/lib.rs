// Licensed under the Apache-2.0 license

//! Register description to Renode C# peripheral generator.
//!
//! This crate turns an elaborated register description into the source of a
//! Renode peripheral: a partial C# class implementing `IPeripheral` and
//! `IDoubleWordPeripheral`, with one value holder per register, one container
//! per register array and typed properties for every field.
//!
//! ## Usage
//!
//! ```
//! use registers_generator_renode::{generate_csharp, AddrMapNode, ExportConfig};
//!
//! let top = AddrMapNode::from_toml(
//!     r#"
//! name = "timer"
//!
//! [[children]]
//! type = "reg"
//! name = "ctrl"
//! offset = 0x10
//! fields = [{ name = "enable", lsb = 0, msb = 0, reset = 1 }]
//! "#,
//! )
//! .unwrap();
//! let config = ExportConfig::default().with_namespace("Timers");
//! let code = generate_csharp(&top, &config).unwrap();
//! assert!(code.contains("namespace Antmicro.Renode.Peripherals.Timers"));
//! assert!(code.contains("public partial class Timer : IPeripheral, IDoubleWordPeripheral"));
//! ```
//!
//! ## Module Organization
//!
//! - [`rdl`]: Description tree, deserialization and walker
//! - [`model`]: Registers, fields and register arrays as the generator sees them
//! - [`scanner`]: Collection of the model from a description
//! - [`merge`]: Merging of registers sharing an address
//! - [`accessor`]: Field properties over a byte buffer
//! - [`register`]: Value holder classes of registers
//! - [`regarray`]: Containers of register arrays and their dispatch logic
//! - [`exporter`]: Peripheral class assembly and final rendering
//! - [`config`]: Export options ([`ExportConfig`])
//! - [`util`]: Name conversion helpers

pub mod accessor;
pub mod config;
pub mod exporter;
pub mod merge;
pub mod model;
pub mod rdl;
pub mod regarray;
pub mod register;
pub mod scanner;
pub mod util;

#[cfg(test)]
mod tests;

use anyhow::Result;

pub use config::ExportConfig;
pub use exporter::{CSharpGenerator, GeneratedTree};
pub use model::ScannedState;
pub use rdl::{AddrMapNode, Component, FieldNode, GroupNode, RegNode};
pub use scanner::RdlDesignScanner;

/// Scans `top` and merges registers sharing an address.
pub fn scan_design(top: &AddrMapNode) -> Result<ScannedState> {
    let mut state = RdlDesignScanner::scan(top)?;
    merge::merge_registers(&mut state)?;
    Ok(state)
}

/// Generates the C# peripheral source for `top`.
pub fn generate_csharp(top: &AddrMapNode, config: &ExportConfig) -> Result<String> {
    let state = scan_design(top)?;
    CSharpGenerator::new(&state, config).generate_code()
}
