// Licensed under the Apache-2.0 license

//! Folding of registers that share an address.
//!
//! The generated peripheral dispatches accesses by address, so two registers
//! at one address have to become a single register before code generation.

use anyhow::{bail, Result};
use log::debug;

use crate::model::{Field, Reg, ScannedState};

/// Merges every group of registers sharing an address into one register.
///
/// Registers keep the order in which their address first appeared. The reset
/// map is updated for every merged register.
pub fn merge_registers(state: &mut ScannedState) -> Result<()> {
    let mut groups: Vec<(u64, Vec<Reg>)> = vec![];
    for reg in std::mem::take(&mut state.registers) {
        match groups.iter_mut().find(|(address, _)| *address == reg.address) {
            Some((_, regs)) => regs.push(reg),
            None => groups.push((reg.address, vec![reg])),
        }
    }

    let mut registers = Vec::with_capacity(groups.len());
    for (_, regs) in groups {
        let mut regs = regs.into_iter();
        let Some(mut merged) = regs.next() else {
            continue;
        };
        for reg in regs {
            merged = try_merge(state, merged, reg)?;
        }
        registers.push(merged);
    }
    state.registers = registers;
    Ok(())
}

fn is_read_only(field: &Field) -> bool {
    field.sw_readable && !field.sw_writable
}

fn is_write_only(field: &Field) -> bool {
    field.sw_writable && !field.sw_readable
}

/// Combines a read-only and a write-only field covering the same bits.
fn merge_fields(a: &Field, b: &Field) -> Option<Field> {
    if a.low != b.low || a.high != b.high {
        return None;
    }
    let (readable, writable) = match (a, b) {
        (a, b) if is_read_only(a) && is_write_only(b) => (a, b),
        (a, b) if is_write_only(a) && is_read_only(b) => (b, a),
        _ => return None,
    };
    Some(Field {
        name: format!("{}_{}", a.name, b.name),
        low: a.low,
        high: a.high,
        sw_readable: true,
        sw_writable: true,
        reset: readable.reset,
        onread: readable.onread,
        onwrite: writable.onwrite,
    })
}

fn try_merge(state: &mut ScannedState, a: Reg, b: Reg) -> Result<Reg> {
    let mut fields = a.fields.clone();
    for field in &b.fields {
        let overlapping: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.overlaps(field))
            .map(|(i, _)| i)
            .collect();
        match overlapping.as_slice() {
            [] => fields.push(field.clone()),
            [i] => match merge_fields(&fields[*i], field) {
                Some(merged) => fields[*i] = merged,
                None => bail!(
                    "Registers `{}` and `{}` at {:#x} cannot be merged: fields `{}` and `{}` overlap",
                    a.doc_name(),
                    b.doc_name(),
                    a.address,
                    fields[*i].name,
                    field.name
                ),
            },
            _ => bail!(
                "Registers `{}` and `{}` at {:#x} cannot be merged: field `{}` overlaps {} fields",
                a.doc_name(),
                b.doc_name(),
                a.address,
                field.name,
                overlapping.len()
            ),
        }
    }
    fields.sort_by_key(|f| f.low);

    let merged = Reg {
        name: format!("{}_{}", a.name, b.name),
        groups: a.groups.clone(),
        address: a.address,
        width: a.width.max(b.width),
        fields,
    };
    state.resets.remove(&a.type_name());
    state.resets.remove(&b.type_name());
    state.resets.insert(merged.type_name(), merged.reset_value());
    debug!(
        "Merged registers `{}` and `{}` at {:#x} into `{}`",
        a.doc_name(),
        b.doc_name(),
        a.address,
        merged.name
    );
    Ok(merged)
}
