// Licensed under the Apache-2.0 license

//! Value holder classes of single registers.

use anyhow::Result;
use log::warn;
use registers_csharp::{Access, Ast, AstResult, BinOp, ClassDef, MethodDef, NodeId, Type};

use crate::accessor::{field_property, BufferRef};
use crate::model::Reg;
use crate::rdl::{OnRead, OnWrite};

const WRITE_EFFECTS: [OnWrite; 8] = [
    OnWrite::Woset,
    OnWrite::Woclr,
    OnWrite::Wot,
    OnWrite::Wzs,
    OnWrite::Wzc,
    OnWrite::Wzt,
    OnWrite::Wclr,
    OnWrite::Wset,
];

fn byte_of(mask: u128, i: u64) -> u64 {
    ((mask >> (i * 8)) & 0xff) as u64
}

/// `memory = new byte[size];`
pub(crate) fn allocate(ast: &mut Ast, memory: NodeId, size: u64) -> AstResult<NodeId> {
    let target = ast.var_ref(memory)?;
    let size = ast.int(size);
    let buffer = ast.new_array(Type::BYTE, size)?;
    let assign = ast.assign(target, buffer)?;
    ast.stmt(assign)
}

fn reset_method(ast: &mut Ast, buffer: BufferRef, reg: &Reg, reset: u128) -> AstResult<NodeId> {
    let mut body = vec![];
    for i in 0..reg.size() {
        let byte = reset.checked_shr((i * 8) as u32).unwrap_or(0) & 0xff;
        let target = buffer.byte_at(ast, i)?;
        let value = ast.int_lit(byte as u64, false, false, true);
        let assign = ast.assign(target, value)?;
        body.push(ast.stmt(assign)?);
    }
    ast.method(MethodDef {
        name: "Reset".into(),
        body: Some(body),
        access: Some(Access::Public),
        ..Default::default()
    })
}

/// Returns the readable bits of the low double word, then clears the
/// read-to-clear bits and sets the read-to-set ones.
fn read_method(ast: &mut Ast, buffer: BufferRef, reg: &Reg) -> AstResult<NodeId> {
    let value = buffer.dword(ast)?;
    let mask = ast.uint_hex((reg.readable_mask() & 0xffff_ffff) as u64);
    let masked = ast.binary(BinOp::And, value, mask)?;

    let clear = reg.read_effect_mask(OnRead::Rclr);
    let set = reg.read_effect_mask(OnRead::Rset);
    let mut body = vec![];
    let result = if ((clear | set) & 0xffff_ffff) == 0 {
        masked
    } else {
        let result = ast.variable("result", Type::UINT, Some(masked), None)?;
        body.push(result);
        for i in 0..4u64 {
            let (cleared, setting) = (byte_of(clear, i), byte_of(set, i));
            if (cleared | setting) == 0 {
                continue;
            }
            let current = buffer.byte_at(ast, i)?;
            let keep = ast.uint_hex(0xff - (cleared | setting));
            let kept = ast.binary(BinOp::And, current, keep)?;
            let setting = ast.uint_hex(setting);
            let updated = ast.binary(BinOp::Or, kept, setting)?;
            let updated = ast.cast(Type::BYTE, updated)?;
            let target = buffer.byte_at(ast, i)?;
            let assign = ast.assign(target, updated)?;
            body.push(ast.stmt(assign)?);
        }
        ast.var_ref(result)?
    };
    body.push(ast.ret(Some(result))?);
    ast.method(MethodDef {
        name: "Read".into(),
        body: Some(body),
        ret: Some(Type::UINT),
        access: Some(Access::Public),
        ..Default::default()
    })
}

/// `value >> 8i`, with its low byte inverted for the write-zero effects.
fn incoming(ast: &mut Ast, value: NodeId, i: u64, inverted: bool) -> AstResult<NodeId> {
    let incoming = ast.var_ref(value)?;
    let amount = ast.int(i * 8);
    let incoming = ast.binary(BinOp::Shr, incoming, amount)?;
    if !inverted {
        return Ok(incoming);
    }
    let ones = ast.uint_hex(0xff);
    ast.binary(BinOp::Xor, incoming, ones)
}

/// New value of the bits of byte `i` in `mask`, `None` when they all become
/// zero. A plain write is `effect == None`.
fn written_bits(
    ast: &mut Ast,
    buffer: BufferRef,
    value: NodeId,
    i: u64,
    effect: Option<OnWrite>,
    mask: u64,
) -> AstResult<Option<NodeId>> {
    let (op, inverted) = match effect {
        None | Some(OnWrite::Wuser) => {
            let bits = incoming(ast, value, i, false)?;
            let mask = ast.uint_hex(mask);
            return ast.binary(BinOp::And, bits, mask).map(Some);
        }
        Some(OnWrite::Wclr) => return Ok(None),
        Some(OnWrite::Wset) => return Ok(Some(ast.uint_hex(mask))),
        Some(OnWrite::Woset) => (BinOp::Or, false),
        Some(OnWrite::Woclr) => (BinOp::And, true),
        Some(OnWrite::Wot) => (BinOp::Xor, false),
        Some(OnWrite::Wzs) => (BinOp::Or, true),
        Some(OnWrite::Wzc) => (BinOp::And, false),
        Some(OnWrite::Wzt) => (BinOp::Xor, true),
    };
    let current = buffer.byte_at(ast, i)?;
    let bits = incoming(ast, value, i, inverted)?;
    let bits = ast.binary(op, current, bits)?;
    let mask = ast.uint_hex(mask);
    ast.binary(BinOp::And, bits, mask).map(Some)
}

/// Updates the software-writable bits of the low double word. Plain bits
/// take the written value, `memory[i] = (byte)(memory[i] & ~w | value >> 8i & w)`,
/// the others combine it with their current value according to their write
/// effect.
fn write_method(ast: &mut Ast, buffer: BufferRef, reg: &Reg) -> AstResult<NodeId> {
    let value = ast.param("value", Type::UINT);
    let groups: Vec<(Option<OnWrite>, u128)> = std::iter::once((None, reg.writable_mask()))
        .chain(
            WRITE_EFFECTS
                .iter()
                .map(|effect| (Some(*effect), reg.write_effect_mask(*effect))),
        )
        .collect();
    let mut body = vec![];
    for i in 0..4u64 {
        let affected = groups
            .iter()
            .fold(0, |acc, (_, mask)| acc | byte_of(*mask, i));
        if affected == 0 {
            continue;
        }
        let current = buffer.byte_at(ast, i)?;
        let keep = ast.uint_hex(0xff - affected);
        let mut combined = ast.binary(BinOp::And, current, keep)?;
        for (effect, mask) in &groups {
            let mask = byte_of(*mask, i);
            if mask == 0 {
                continue;
            }
            if let Some(bits) = written_bits(ast, buffer, value, i, *effect, mask)? {
                combined = ast.binary(BinOp::Or, combined, bits)?;
            }
        }
        let truncated = ast.cast(Type::BYTE, combined)?;
        let target = buffer.byte_at(ast, i)?;
        let assign = ast.assign(target, truncated)?;
        body.push(ast.stmt(assign)?);
    }
    ast.method(MethodDef {
        name: "Write".into(),
        params: vec![value],
        body: Some(body),
        access: Some(Access::Public),
        ..Default::default()
    })
}

/// Nested class holding the value of `reg`.
///
/// The class owns a little-endian byte buffer, exposes one property per field
/// and implements the software view of the register: `Read` returns the
/// readable bits and `Write` only changes writable ones.
pub fn register_class(ast: &mut Ast, reg: &Reg, reset: u128) -> Result<NodeId> {
    if reg.width > 32 {
        warn!(
            "Register `{}` is {} bits wide, only its low double word is accessible by address",
            reg.doc_name(),
            reg.width
        );
    }
    let name = reg.type_name();
    let memory = ast.variable("memory", Type::BYTE.array(), None, Some(Access::Private))?;
    let buffer = BufferRef { memory, span: None };

    let mut properties = Vec::with_capacity(reg.fields.len());
    for field in &reg.fields {
        properties.push(field_property(ast, buffer, field)?);
    }

    let allocation = allocate(ast, memory, reg.size())?;
    let reset_call = ast.call("Reset", None, vec![], None)?;
    let reset_call = ast.stmt(reset_call)?;
    let ctor = ast.method(MethodDef {
        name: name.clone(),
        body: Some(vec![allocation, reset_call]),
        ctor: true,
        access: Some(Access::Public),
        ..Default::default()
    })?;
    let methods = vec![
        ctor,
        reset_method(ast, buffer, reg, reset)?,
        read_method(ast, buffer, reg)?,
        write_method(ast, buffer, reg)?,
    ];

    let class = ast.class(ClassDef {
        name,
        fields: vec![memory],
        properties,
        methods,
        access: Some(Access::Protected),
        ..Default::default()
    })?;
    Ok(ast.with_doc(class, reg.doc()))
}
