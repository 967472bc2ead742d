// Licensed under the Apache-2.0 license

//! Name conversion utilities for generated C# identifiers.

/// Converts a name to PascalCase.
///
/// Words are split on whitespace and punctuation; each word keeps its first
/// character uppercased and the rest lowercased. A leading digit gets an
/// underscore prefix so the result is a valid identifier.
///
/// # Examples
/// ```
/// use registers_generator_renode::util::pascal_case;
/// assert_eq!(pascal_case("ctrl"), "Ctrl");
/// assert_eq!(pascal_case("rx_fifo_status"), "RxFifoStatus");
/// assert_eq!(pascal_case("DMA-CFG"), "DmaCfg");
/// ```
pub fn pascal_case(name: &str) -> String {
    let mut result = String::new();
    let mut upper_next = true;
    for c in name.chars() {
        if c.is_ascii_whitespace() || c.is_ascii_punctuation() {
            upper_next = true;
            continue;
        }
        result.push(if upper_next {
            c.to_ascii_uppercase()
        } else {
            c.to_ascii_lowercase()
        });
        upper_next = false;
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Joins the PascalCase form of each path segment with `_`.
///
/// # Examples
/// ```
/// use registers_generator_renode::util::pascal_path;
/// assert_eq!(pascal_path(&["dma", "ch0"], "ctrl"), "Dma_Ch0_Ctrl");
/// ```
pub fn pascal_path<S: AsRef<str>>(groups: &[S], name: &str) -> String {
    groups
        .iter()
        .map(|g| pascal_case(g.as_ref()))
        .chain(std::iter::once(pascal_case(name)))
        .collect::<Vec<_>>()
        .join("_")
}

/// Formats an address the way the generated doc comments show it.
///
/// # Examples
/// ```
/// use registers_generator_renode::util::hex_address;
/// assert_eq!(hex_address(0x10), "0x10");
/// assert_eq!(hex_address(0), "0x0");
/// ```
pub fn hex_address(value: u64) -> String {
    format!("{value:#x}")
}
