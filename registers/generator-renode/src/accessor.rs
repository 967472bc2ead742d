// Licensed under the Apache-2.0 license

//! Field accessor synthesis.
//!
//! A field is stored in a byte buffer at an arbitrary bit position. Its
//! generated property reads the bytes the field touches, masks them and
//! shifts them into place; the setter does the reverse without disturbing the
//! neighbouring bits of each byte.
//!
//! For a field at bits `[5, 12]` the getter assembles
//!
//! ```text
//! byte 0: (memory[0] & 0xe0) >> 5   -> value bits 0..=2
//! byte 1: (memory[1] & 0x1f) << 3   -> value bits 3..=7
//! ```

use anyhow::{bail, Result};
use registers_csharp::{Access, AccessorDef, Ast, AstResult, BinOp, Modifiers, NodeId, PropertyDef, Type};

use crate::model::Field;

/// C# type used to expose a field of the given width.
pub fn storage_type(field: &Field) -> Result<Type> {
    Ok(match field.width() {
        1 => Type::BOOL,
        2..=8 => Type::BYTE,
        9..=16 => Type::USHORT,
        17..=32 => Type::UINT,
        33..=64 => Type::ULONG,
        width => bail!(
            "Field `{}` is {width} bits wide, at most 64 bits are supported",
            field.name
        ),
    })
}

/// Position of a field relative to the bytes of its buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub width: u32,
    /// Index of the byte holding the lowest bit.
    pub first_byte: u64,
    /// Bit position of the lowest bit within the first byte.
    pub shift: u32,
    /// Number of bytes the field touches.
    pub bytes: u64,
}

impl FieldLayout {
    pub fn new(field: &Field) -> Self {
        let width = field.width();
        let shift = field.low % 8;
        Self {
            width,
            first_byte: u64::from(field.low / 8),
            shift,
            bytes: u64::from(shift + width).div_ceil(8),
        }
    }

    /// Mask of `width` ones.
    pub fn value_mask(&self) -> u64 {
        match self.width {
            64.. => u64::MAX,
            width => (1 << width) - 1,
        }
    }

    /// Bits of byte `i` (counted from the first byte) that belong to the field.
    pub fn byte_mask(&self, i: u64) -> u64 {
        let mask = u128::from(self.value_mask()) << self.shift;
        ((mask >> (i * 8)) & 0xff) as u64
    }

    /// Distance the bits of byte `i` move between the buffer and the value:
    /// to the right for the first byte, to the left for every other byte.
    pub fn byte_shift(&self, i: u64) -> u64 {
        match i {
            0 => u64::from(self.shift),
            i => (i - 1) * 8 + u64::from(8 - self.shift),
        }
    }
}

/// Byte buffer the generated accessors operate on.
///
/// With `span` set every access is relative to the variable it declares,
/// `memory[span + i]`; otherwise offsets are absolute, `memory[i]`.
#[derive(Clone, Copy, Debug)]
pub struct BufferRef {
    pub memory: NodeId,
    pub span: Option<NodeId>,
}

impl BufferRef {
    pub fn byte_at(&self, ast: &mut Ast, offset: u64) -> AstResult<NodeId> {
        let memory = ast.var_ref(self.memory)?;
        let index = match self.span {
            Some(span) => {
                let base = ast.var_ref(span)?;
                let offset = ast.int(offset);
                ast.binary(BinOp::Add, base, offset)?
            }
            None => ast.int(offset),
        };
        ast.index(memory, index, Type::BYTE)
    }

    fn dword_byte(&self, ast: &mut Ast, i: u64) -> AstResult<NodeId> {
        let byte = self.byte_at(ast, i)?;
        let byte = ast.cast(Type::UINT, byte)?;
        let amount = ast.int(i * 8);
        ast.binary(BinOp::Shl, byte, amount)
    }

    /// `(uint)memory[0] | (uint)memory[1] << 8 | ...` over four bytes.
    pub fn dword(&self, ast: &mut Ast) -> AstResult<NodeId> {
        let mut value = self.dword_byte(ast, 0)?;
        for i in 1..4 {
            let byte = self.dword_byte(ast, i)?;
            value = ast.binary(BinOp::Or, value, byte)?;
        }
        Ok(value)
    }
}

fn getter(ast: &mut Ast, buffer: BufferRef, layout: FieldLayout, ty: &Type) -> AstResult<Vec<NodeId>> {
    if *ty == Type::BOOL {
        let byte = buffer.byte_at(ast, layout.first_byte)?;
        let mask = ast.uint_hex(layout.byte_mask(0));
        let masked = ast.binary(BinOp::And, byte, mask)?;
        let zero = ast.int_lit(0, true, false, false);
        let test = ast.binary(BinOp::Neq, masked, zero)?;
        return Ok(vec![ast.ret(Some(test))?]);
    }

    let zero = ast.int(0);
    let temp = ast.variable("temp", ty.clone(), Some(zero), None)?;
    let mut body = vec![temp];
    for i in 0..layout.bytes {
        let byte = buffer.byte_at(ast, layout.first_byte + i)?;
        let mask = ast.uint_hex(layout.byte_mask(i));
        let masked = ast.binary(BinOp::And, byte, mask)?;
        let widened = ast.cast(ty.clone(), masked)?;
        let amount = ast.int(layout.byte_shift(i));
        let op = if i == 0 { BinOp::Shr } else { BinOp::Shl };
        let placed = ast.binary(op, widened, amount)?;
        let current = ast.var_ref(temp)?;
        let merged = ast.binary(BinOp::Or, current, placed)?;
        let merged = ast.cast(ty.clone(), merged)?;
        let target = ast.var_ref(temp)?;
        let assign = ast.assign(target, merged)?;
        body.push(ast.stmt(assign)?);
    }
    let result = ast.var_ref(temp)?;
    body.push(ast.ret(Some(result))?);
    Ok(body)
}

/// The new field value, restricted to the field's width.
fn masked_value(ast: &mut Ast, value: NodeId, layout: FieldLayout, ty: &Type) -> AstResult<NodeId> {
    let value = ast.var_ref(value)?;
    if *ty == Type::BOOL {
        let one = ast.int_lit(1, true, false, false);
        let zero = ast.int_lit(0, true, false, false);
        return ast.cond(value, one, zero);
    }
    let mask = ast.uint_hex(layout.value_mask());
    ast.binary(BinOp::And, value, mask)
}

fn setter(ast: &mut Ast, buffer: BufferRef, layout: FieldLayout, ty: &Type) -> AstResult<Vec<NodeId>> {
    // implicit argument of a C# setter
    let value = ast.param("value", ty.clone());
    let mut body = vec![];
    for i in 0..layout.bytes {
        let offset = layout.first_byte + i;
        let current = buffer.byte_at(ast, offset)?;
        let keep = ast.uint_hex(0xff - layout.byte_mask(i));
        let kept = ast.binary(BinOp::And, current, keep)?;
        let field_value = masked_value(ast, value, layout, ty)?;
        let amount = ast.int(layout.byte_shift(i));
        let placed = if i == 0 {
            // `byte << n` and `ushort << n` would be computed as `int`
            let widened = if layout.shift > 0 && (*ty == Type::BYTE || *ty == Type::USHORT) {
                ast.cast(Type::UINT, field_value)?
            } else {
                field_value
            };
            ast.binary(BinOp::Shl, widened, amount)?
        } else {
            ast.binary(BinOp::Shr, field_value, amount)?
        };
        let combined = ast.binary(BinOp::Or, kept, placed)?;
        let truncated = ast.cast(Type::BYTE, combined)?;
        let target = buffer.byte_at(ast, offset)?;
        let assign = ast.assign(target, truncated)?;
        body.push(ast.stmt(assign)?);
    }
    Ok(body)
}

/// Public property reading and writing `field` in `buffer`.
pub fn field_property(ast: &mut Ast, buffer: BufferRef, field: &Field) -> Result<NodeId> {
    let ty = storage_type(field)?;
    let layout = FieldLayout::new(field);
    let get = getter(ast, buffer, layout, &ty)?;
    let set = setter(ast, buffer, layout, &ty)?;
    let property = ast.property(PropertyDef {
        name: field.property_name(),
        ty,
        get: AccessorDef::Body(get),
        set: AccessorDef::Body(set),
        access: Some(Access::Public),
        modifiers: Modifiers::NONE,
    })?;
    Ok(ast.with_doc(
        property,
        format!("Offset: {:#x}, Width: {} bits", field.low, layout.width),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use registers_csharp::{process_ast, CodeGenerator, EmitOptions};

    #[test]
    fn test_storage_types() {
        let widths = [(0, 0, Type::BOOL), (0, 7, Type::BYTE), (3, 18, Type::USHORT)];
        for (low, high, ty) in widths {
            assert_eq!(storage_type(&Field::new("f", low, high)).unwrap(), ty);
        }
        assert_eq!(storage_type(&Field::new("f", 0, 31)).unwrap(), Type::UINT);
        assert_eq!(storage_type(&Field::new("f", 8, 71)).unwrap(), Type::ULONG);
        let err = storage_type(&Field::new("huge", 0, 64)).unwrap_err();
        assert!(err.to_string().contains("65 bits"), "{err}");
    }

    #[test]
    fn test_layout() {
        let layout = FieldLayout::new(&Field::new("f", 5, 12));
        assert_eq!(layout.first_byte, 0);
        assert_eq!(layout.shift, 5);
        assert_eq!(layout.bytes, 2);
        assert_eq!(layout.byte_mask(0), 0xe0);
        assert_eq!(layout.byte_mask(1), 0x1f);
        assert_eq!(layout.byte_shift(0), 5);
        assert_eq!(layout.byte_shift(1), 3);

        let layout = FieldLayout::new(&Field::new("f", 8, 71));
        assert_eq!(layout.first_byte, 1);
        assert_eq!(layout.bytes, 8);
        assert_eq!(layout.value_mask(), u64::MAX);
        assert_eq!(layout.byte_mask(7), 0xff);
        assert_eq!(layout.byte_shift(7), 56);

        let layout = FieldLayout::new(&Field::new("f", 7, 70));
        assert_eq!(layout.bytes, 9);
        assert_eq!(layout.byte_mask(0), 0x80);
        assert_eq!(layout.byte_mask(8), 0x7f);
    }

    fn render(field: &Field, span: bool) -> String {
        let mut ast = Ast::new();
        let memory = ast
            .variable("memory", Type::BYTE.array(), None, Some(Access::Private))
            .unwrap();
        let span = span.then(|| {
            ast.variable("spanBegin", Type::LONG, None, Some(Access::Private))
                .unwrap()
        });
        let property = field_property(&mut ast, BufferRef { memory, span }, field).unwrap();
        process_ast(&mut ast, property, false).unwrap();
        CodeGenerator::emit(&ast, property, EmitOptions::default()).unwrap()
    }

    #[test]
    fn test_bool_property() {
        assert_eq!(
            render(&Field::new("enable", 9, 9), false),
            "/// <summary> Offset: 0x9, Width: 1 bits </summary>
public bool ENABLE {
    get
    {
        return (memory[1] & 0x2U) != 0U;
    }
    set
    {
        memory[1] = (byte)(memory[1] & 0xfdU | (value ? 1U : 0U) << 1);
    }
}
"
        );
    }

    #[test]
    fn test_unaligned_byte_property() {
        assert_eq!(
            render(&Field::new("mode", 5, 12), true),
            "/// <summary> Offset: 0x5, Width: 8 bits </summary>
public byte MODE {
    get
    {
        byte temp = 0;
        temp = (byte)(temp | (byte)(memory[spanBegin] & 0xe0U) >> 5);
        temp = (byte)(temp | (byte)(memory[spanBegin + 1] & 0x1fU) << 3);
        return temp;
    }
    set
    {
        memory[spanBegin] = (byte)(memory[spanBegin] & 0x1fU | (uint)value << 5);
        memory[spanBegin + 1] = (byte)(memory[spanBegin + 1] & 0xe0U | value >> 3);
    }
}
"
        );
    }

    #[test]
    fn test_aligned_word_property() {
        assert_eq!(
            render(&Field::new("count", 16, 31), false),
            "/// <summary> Offset: 0x10, Width: 16 bits </summary>
public ushort COUNT {
    get
    {
        ushort temp = 0;
        temp = (ushort)(temp | (ushort)memory[2]);
        temp = (ushort)(temp | (ushort)memory[3] << 8);
        return temp;
    }
    set
    {
        memory[2] = (byte)value;
        memory[3] = (byte)(value >> 8);
    }
}
"
        );
    }
}
