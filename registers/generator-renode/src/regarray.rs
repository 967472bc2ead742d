// Licensed under the Apache-2.0 license

//! Register arrays: a container owning the memory of every element and a
//! wrapper viewing one element through the template register's fields.

use anyhow::Result;
use registers_csharp::{
    Access, AccessorDef, Ast, AstResult, BinOp, ClassDef, MethodDef, Modifiers, NodeId,
    PropertyDef, Type,
};

use crate::accessor::{field_property, BufferRef};
use crate::model::RegArray;
use crate::register::allocate;

const INDEX_OUT_OF_RANGE: &str = "System.IndexOutOfRangeException";

/// `this.<name> = <name>;`
fn assign_member(ast: &mut Ast, param: NodeId, ty: Type) -> AstResult<NodeId> {
    let this = ast.this();
    let name = ast.name(param).to_string();
    let target = ast.member(this, name, ty)?;
    let source = ast.var_ref(param)?;
    let assign = ast.assign(target, source)?;
    ast.stmt(assign)
}

/// Class viewing element `spanBegin / stride` of the container's memory.
pub fn wrapper_class(ast: &mut Ast, array: &RegArray) -> Result<NodeId> {
    let name = array.wrapper_name();
    let span = ast.variable("spanBegin", Type::LONG, None, Some(Access::Private))?;
    let memory = ast.variable("memory", Type::BYTE.array(), None, Some(Access::Private))?;
    let buffer = BufferRef {
        memory,
        span: Some(span),
    };

    let mut properties = Vec::with_capacity(array.register.fields.len());
    for field in &array.register.fields {
        properties.push(field_property(ast, buffer, field)?);
    }

    let memory_param = ast.param("memory", Type::BYTE.array());
    let span_param = ast.param("spanBegin", Type::LONG);
    let body = vec![
        assign_member(ast, memory_param, Type::BYTE.array())?,
        assign_member(ast, span_param, Type::LONG)?,
    ];
    let ctor = ast.method(MethodDef {
        name: name.clone(),
        params: vec![memory_param, span_param],
        body: Some(body),
        ctor: true,
        access: Some(Access::Public),
        ..Default::default()
    })?;

    Ok(ast.class(ClassDef {
        name,
        fields: vec![span, memory],
        properties,
        methods: vec![ctor],
        access: Some(Access::Public),
        ..Default::default()
    })?)
}

fn size_property(ast: &mut Ast, array: &RegArray) -> AstResult<NodeId> {
    let size = ast.long(array.size());
    let ret = ast.ret(Some(size))?;
    ast.property(PropertyDef {
        name: "Size".into(),
        ty: Type::LONG,
        get: AccessorDef::Body(vec![ret]),
        set: AccessorDef::Absent,
        access: Some(Access::Public),
        modifiers: Modifiers::NONE,
    })
}

/// `this[long index]` returning a wrapper over element `index`.
fn indexer(ast: &mut Ast, array: &RegArray, memory: NodeId) -> AstResult<NodeId> {
    let wrapper = Type::named(array.wrapper_name());
    let index = ast.param("index", Type::LONG);

    let below = ast.var_ref(index)?;
    let zero = ast.int(0);
    let below = ast.binary(BinOp::Lt, below, zero)?;
    let above = ast.var_ref(index)?;
    let count = ast.long(array.count);
    let above = ast.binary(BinOp::Gte, above, count)?;
    let out_of_range = ast.binary(BinOp::LOr, below, above)?;
    let exception = ast.new_object(Type::named(INDEX_OUT_OF_RANGE), vec![])?;
    let throw = ast.throw(exception)?;
    let guard = ast.if_stmt(out_of_range, vec![throw], vec![])?;

    let memory = ast.var_ref(memory)?;
    let element = ast.var_ref(index)?;
    let stride = ast.long(array.stride);
    let span = ast.binary(BinOp::Mul, element, stride)?;
    let view = ast.new_object(wrapper.clone(), vec![memory, span])?;
    let ret = ast.ret(Some(view))?;

    ast.property(PropertyDef {
        name: "this[long index]".into(),
        ty: wrapper,
        get: AccessorDef::Body(vec![guard, ret]),
        set: AccessorDef::Absent,
        access: Some(Access::Public),
        modifiers: Modifiers::NONE,
    })
}

/// Little-endian double word access relative to the start of the memory.
fn read_dword(ast: &mut Ast, memory: NodeId) -> AstResult<NodeId> {
    let offset = ast.param("offset", Type::LONG);
    let buffer = BufferRef {
        memory,
        span: Some(offset),
    };
    let value = buffer.dword(ast)?;
    let ret = ast.ret(Some(value))?;
    ast.method(MethodDef {
        name: "ReadDoubleWord".into(),
        params: vec![offset],
        body: Some(vec![ret]),
        ret: Some(Type::UINT),
        access: Some(Access::Public),
        ..Default::default()
    })
}

fn write_dword(ast: &mut Ast, memory: NodeId) -> AstResult<NodeId> {
    let offset = ast.param("offset", Type::LONG);
    let value = ast.param("value", Type::UINT);
    let buffer = BufferRef {
        memory,
        span: Some(offset),
    };
    let mut body = vec![];
    for i in 0..4 {
        let target = buffer.byte_at(ast, i)?;
        let source = ast.var_ref(value)?;
        let amount = ast.int(i * 8);
        let source = ast.binary(BinOp::Shr, source, amount)?;
        let source = ast.cast(Type::BYTE, source)?;
        let assign = ast.assign(target, source)?;
        body.push(ast.stmt(assign)?);
    }
    ast.method(MethodDef {
        name: "WriteDoubleWord".into(),
        params: vec![offset, value],
        body: Some(body),
        access: Some(Access::Public),
        ..Default::default()
    })
}

/// `System.Array.Clear(memory, 0, memory.Length);` followed by the template
/// register's reset value stored into every element.
fn reset_method(ast: &mut Ast, array: &RegArray, memory: NodeId) -> AstResult<NodeId> {
    let target = ast.var_ref(memory)?;
    let start = ast.int(0);
    let length = ast.var_ref(memory)?;
    let length = ast.member(length, "Length", Type::INT)?;
    let clear = ast.call("System.Array.Clear", None, vec![target, start, length], None)?;
    let mut body = vec![ast.stmt(clear)?];
    let buffer = BufferRef { memory, span: None };
    for (offset, byte) in array.reset_bytes() {
        let target = buffer.byte_at(ast, offset)?;
        let value = ast.int_lit(u64::from(byte), false, false, true);
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

/// Container class owning the `count * stride` bytes of the array, with the
/// wrapper class nested inside.
pub fn container_class(ast: &mut Ast, array: &RegArray) -> Result<NodeId> {
    let name = array.type_name();
    let wrapper = wrapper_class(ast, array)?;
    let memory = ast.variable("memory", Type::BYTE.array(), None, Some(Access::Private))?;

    let properties = vec![size_property(ast, array)?, indexer(ast, array, memory)?];

    let allocation = allocate(ast, memory, array.buffer_size())?;
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
        read_dword(ast, memory)?,
        write_dword(ast, memory)?,
        reset_method(ast, array, memory)?,
    ];

    let class = ast.class(ClassDef {
        name,
        fields: vec![memory],
        properties,
        methods,
        classes: vec![wrapper],
        access: Some(Access::Protected),
        ..Default::default()
    })?;
    Ok(ast.with_doc(class, array.doc()))
}

/// `if(offset >= base && offset < base + array.Size) { <hole> }`
///
/// Returns the statement and the hole to fill with the access itself.
fn region_guard(
    ast: &mut Ast,
    array: &RegArray,
    field: NodeId,
    offset: NodeId,
) -> AstResult<(NodeId, NodeId)> {
    let start = ast.var_ref(offset)?;
    let base = ast.int_lit(array.address, false, true, true);
    let start = ast.binary(BinOp::Gte, start, base)?;
    let end = ast.var_ref(offset)?;
    let base = ast.int_lit(array.address, false, true, true);
    let container = ast.var_ref(field)?;
    let size = ast.member(container, "Size", Type::LONG)?;
    let limit = ast.binary(BinOp::Add, base, size)?;
    let end = ast.binary(BinOp::Lt, end, limit)?;
    let within = ast.binary(BinOp::LAnd, start, end)?;
    let hole = ast.hole();
    let guard = ast.if_stmt(within, vec![hole], vec![])?;
    Ok((guard, hole))
}

/// `offset - base`
fn relative_offset(ast: &mut Ast, array: &RegArray, offset: NodeId) -> AstResult<NodeId> {
    let offset = ast.var_ref(offset)?;
    let base = ast.int_lit(array.address, false, true, true);
    ast.binary(BinOp::Sub, offset, base)
}

/// Read dispatch into the array held by the peripheral field `field`.
pub fn dword_read_logic(
    ast: &mut Ast,
    array: &RegArray,
    field: NodeId,
    offset: NodeId,
) -> AstResult<NodeId> {
    let (guard, hole) = region_guard(ast, array, field, offset)?;
    let container = ast.var_ref(field)?;
    let relative = relative_offset(ast, array, offset)?;
    let read = ast.call("ReadDoubleWord", Some(container), vec![relative], Some(Type::UINT))?;
    let ret = ast.ret(Some(read))?;
    ast.replace(hole, ret)?;
    Ok(guard)
}

/// Write dispatch into the array held by the peripheral field `field`.
pub fn dword_write_logic(
    ast: &mut Ast,
    array: &RegArray,
    field: NodeId,
    offset: NodeId,
    value: NodeId,
) -> AstResult<NodeId> {
    let (guard, hole) = region_guard(ast, array, field, offset)?;
    let container = ast.var_ref(field)?;
    let relative = relative_offset(ast, array, offset)?;
    let value = ast.var_ref(value)?;
    let write = ast.call("WriteDoubleWord", Some(container), vec![relative, value], None)?;
    let write = ast.stmt(write)?;
    let ret = ast.ret(None)?;
    ast.then(write, ret)?;
    ast.replace(hole, write)?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Reg};
    use registers_csharp::{process_ast, CodeGenerator, EmitOptions};

    fn table() -> RegArray {
        let mut entry = Reg::new("entry", 0x400);
        entry.fields.push(Field::new("valid", 0, 0));
        entry.fields.push(Field::new("tag", 8, 19));
        RegArray {
            name: "table".into(),
            groups: vec![],
            register: entry,
            address: 0x400,
            count: 16,
            stride: 8,
        }
    }

    fn render(ast: &mut Ast, id: NodeId) -> String {
        process_ast(ast, id, false).unwrap();
        CodeGenerator::emit(
            ast,
            id,
            EmitOptions {
                comments: false,
                docs: false,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_container_members() {
        let mut ast = Ast::new();
        let class = container_class(&mut ast, &table()).unwrap();
        let text = render(&mut ast, class);
        assert!(text.starts_with("protected class TableType\n{\n    private byte[] memory;\n"));
        assert!(text.contains(
            "    public long Size {
        get
        {
            return 128L;
        }
    }
"
        ));
        assert!(text.contains(
            "    public Table_EntryWrapper this[long index] {
        get
        {
            if(index < 0 || index >= 16L)
            {
                throw new System.IndexOutOfRangeException();
            }
            return new Table_EntryWrapper(memory, index * 8L);
        }
    }
"
        ));
        assert!(text.contains(
            "        return (uint)memory[offset] | (uint)memory[offset + 1] << 8 | \
             (uint)memory[offset + 2] << 16 | (uint)memory[offset + 3] << 24;\n"
        ));
        assert!(text.contains(
            "        memory[offset] = (byte)value;
        memory[offset + 1] = (byte)(value >> 8);
        memory[offset + 2] = (byte)(value >> 16);
        memory[offset + 3] = (byte)(value >> 24);
"
        ));
        assert!(text.contains(
            "    public TableType()
    {
        memory = new byte[131];
        Reset();
    }
"
        ));
        assert!(text.contains(
            "    public void Reset()
    {
        System.Array.Clear(memory, 0, memory.Length);
    }
"
        ));
        assert!(text.contains("    public class Table_EntryWrapper\n"));
    }

    #[test]
    fn test_reset_fills_every_element() {
        let mut array = table();
        array.count = 2;
        array.register.fields[0].reset = 1;
        array.register.fields[1].reset = 0x2ff;
        let mut ast = Ast::new();
        let class = container_class(&mut ast, &array).unwrap();
        let text = render(&mut ast, class);
        assert!(
            text.contains(
                "    public void Reset()
    {
        System.Array.Clear(memory, 0, memory.Length);
        memory[0] = 0x1;
        memory[1] = 0xff;
        memory[2] = 0x2;
        memory[8] = 0x1;
        memory[9] = 0xff;
        memory[10] = 0x2;
    }
"
            ),
            "{text}"
        );
    }

    #[test]
    fn test_wrapper_is_rebased() {
        let mut ast = Ast::new();
        let class = wrapper_class(&mut ast, &table()).unwrap();
        let text = render(&mut ast, class);
        assert!(text.contains("    private long spanBegin;\n    private byte[] memory;\n"));
        assert!(text.contains("            return (memory[spanBegin] & 0x1U) != 0U;\n"));
        assert!(text.contains("(ushort)(temp | (ushort)memory[spanBegin + 1])"));
        assert!(text.contains(
            "    public Table_EntryWrapper(byte[] memory, long spanBegin)
    {
        this.memory = memory;
        this.spanBegin = spanBegin;
    }
"
        ));
    }

    #[test]
    fn test_dispatch_logic() {
        let mut ast = Ast::new();
        let array = table();
        let field = ast
            .variable("Table", Type::named("TableType"), None, Some(Access::Protected))
            .unwrap();
        let offset = ast.param("offset", Type::LONG);
        let value = ast.param("value", Type::UINT);
        let read = dword_read_logic(&mut ast, &array, field, offset).unwrap();
        let write = dword_write_logic(&mut ast, &array, field, offset, value).unwrap();
        assert_eq!(
            render(&mut ast, read),
            "if(offset >= 0x400L && offset < 0x400L + Table.Size)
{
    return Table.ReadDoubleWord(offset - 0x400L);
}
"
        );
        assert_eq!(
            render(&mut ast, write),
            "if(offset >= 0x400L && offset < 0x400L + Table.Size)
{
    Table.WriteDoubleWord(offset - 0x400L, value);
    return;
}
"
        );
    }
}
