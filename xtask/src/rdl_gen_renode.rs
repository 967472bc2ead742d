// Licensed under the Apache-2.0 license

//! Command generating a Renode peripheral from a register description.

use anyhow::{Context, Result};
use log::info;
use registers_generator_renode::{generate_csharp, AddrMapNode, ExportConfig};
use std::path::Path;

pub struct Options {
    pub name: Option<String>,
    pub namespace: String,
    pub root_namespace: String,
    pub all_public: bool,
}

impl Options {
    fn config(&self) -> ExportConfig {
        let config = ExportConfig::default()
            .with_namespace(&self.namespace)
            .with_root_namespace(&self.root_namespace)
            .all_public(self.all_public);
        match &self.name {
            Some(name) => config.with_name(name),
            None => config,
        }
    }
}

/// Generates the peripheral for `input` into `output`.
///
/// Nothing is written unless generation succeeds.
pub fn generate(input: &Path, output: &Path, options: &Options) -> Result<()> {
    info!("Generating Renode peripheral from {}", input.display());
    let top = AddrMapNode::load(input)?;
    let code = generate_csharp(&top, &options.config())
        .with_context(|| format!("Failed to generate a peripheral from {}", input.display()))?;
    std::fs::write(output, code)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Output written to: {}", output.display());
    Ok(())
}
