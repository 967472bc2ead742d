// Licensed under the Apache-2.0 license

//! Configuration of the generated peripheral: class name, namespace and
//! accessibility.

use crate::util::pascal_case;

/// Namespace every Renode peripheral lives under unless configured otherwise.
pub const DEFAULT_ROOT_NAMESPACE: [&str; 3] = ["Antmicro", "Renode", "Peripherals"];

/// Export options of the C# generator.
///
/// # Example
///
/// ```
/// use registers_generator_renode::config::ExportConfig;
///
/// let config = ExportConfig::default()
///     .with_name("Uart")
///     .with_namespace("Mocks.Serial");
/// assert_eq!(config.class_name("uart_top"), "Uart");
/// assert_eq!(
///     config.namespace_path(),
///     ["Antmicro", "Renode", "Peripherals", "Mocks", "Serial"]
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportConfig {
    /// Name of the peripheral class. Derived from the address map if unset.
    pub name: Option<String>,
    /// Dotted namespace below `root_namespace`; may be empty.
    pub namespace: String,
    pub root_namespace: Vec<String>,
    /// Make every generated declaration public.
    pub all_public: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            name: None,
            namespace: String::new(),
            root_namespace: DEFAULT_ROOT_NAMESPACE.iter().map(|s| s.to_string()).collect(),
            all_public: false,
        }
    }
}

impl ExportConfig {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Replace the root namespace, given in dotted form.
    pub fn with_root_namespace(mut self, root: &str) -> Self {
        self.root_namespace = split_namespace(root);
        self
    }

    pub fn all_public(mut self, all_public: bool) -> Self {
        self.all_public = all_public;
        self
    }

    /// Peripheral class name for an address map called `addrmap`.
    pub fn class_name(&self, addrmap: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => pascal_case(addrmap),
        }
    }

    /// Full namespace of the peripheral, outermost first.
    pub fn namespace_path(&self) -> Vec<String> {
        self.root_namespace
            .iter()
            .cloned()
            .chain(split_namespace(&self.namespace))
            .collect()
    }
}

fn split_namespace(namespace: &str) -> Vec<String> {
    namespace
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
