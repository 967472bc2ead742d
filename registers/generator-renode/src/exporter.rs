// Licensed under the Apache-2.0 license

//! Assembly of the peripheral class and rendering of the final source file.
//!
//! ```text
//! namespace <root>.<namespace>
//! {
//!     public partial class <Name> : IPeripheral, IDoubleWordPeripheral
//!     {
//!         protected <Reg>Type <Reg>;        one member per register
//!         protected <Mem>Type <Mem>;        and per register array
//!
//!         constructor, Init/Reset hooks, IPeripheral.Reset,
//!         ReadDoubleWord/WriteDoubleWord dispatching on the offset
//!
//!         nested value holder and container classes
//!     }
//! }
//! ```

use anyhow::{bail, Result};
use log::{debug, info};
use registers_csharp::{
    process_ast, Access, Ast, AstResult, BinOp, ClassDef, CodeGenerator, EmitOptions, MethodDef,
    Modifiers, NodeId, Type,
};

use crate::config::ExportConfig;
use crate::model::ScannedState;
use crate::regarray::{container_class, dword_read_logic, dword_write_logic};
use crate::register::register_class;

/// Text preceding the generated namespace.
pub const HEADER: &str = "// Generated by registers-generator-renode

using Antmicro.Renode.Core;
using Antmicro.Renode.Peripherals.Bus;

";

const PERIPHERAL_INTERFACES: [&str; 2] = ["IPeripheral", "IDoubleWordPeripheral"];

/// A processed tree, ready to be emitted.
pub struct GeneratedTree {
    pub ast: Ast,
    /// Outermost namespace.
    pub root: NodeId,
    /// Namespace directly holding the peripheral class.
    pub namespace: NodeId,
    pub peripheral: NodeId,
}

/// A member of the peripheral class and the address it answers at.
#[derive(Clone, Copy)]
struct Member {
    decl: NodeId,
    address: u64,
}

pub struct CSharpGenerator<'a> {
    state: &'a ScannedState,
    config: &'a ExportConfig,
}

/// Declares `protected <ty> <name>;`.
fn member_decl(ast: &mut Ast, name: String, ty: &str, doc: String) -> AstResult<NodeId> {
    let decl = ast.variable(name, Type::named(ty), None, Some(Access::Protected))?;
    Ok(ast.with_doc(decl, doc))
}

/// `X = new XType();` for every member, followed by `Init();`.
fn constructor(ast: &mut Ast, name: &str, members: &[(NodeId, String)]) -> AstResult<NodeId> {
    let mut body = vec![];
    for (decl, ty) in members {
        let target = ast.var_ref(*decl)?;
        let instance = ast.new_object(Type::named(ty.as_str()), vec![])?;
        let assign = ast.assign(target, instance)?;
        body.push(ast.stmt(assign)?);
    }
    let init = ast.call("Init", None, vec![], None)?;
    body.push(ast.stmt(init)?);
    ast.method(MethodDef {
        name: name.to_string(),
        body: Some(body),
        ctor: true,
        access: Some(Access::Public),
        ..Default::default()
    })
}

/// `partial void <name>();`
fn partial_hook(ast: &mut Ast, name: &str) -> AstResult<NodeId> {
    ast.method(MethodDef {
        name: name.to_string(),
        modifiers: Modifiers::PARTIAL,
        ..Default::default()
    })
}

/// Resets every member, then runs the user hook.
fn reset_method(ast: &mut Ast, members: &[(NodeId, String)]) -> AstResult<NodeId> {
    let mut body = vec![];
    for (decl, _) in members {
        let member = ast.var_ref(*decl)?;
        let reset = ast.call("Reset", Some(member), vec![], None)?;
        body.push(ast.stmt(reset)?);
    }
    let hook = ast.call("Reset", None, vec![], None)?;
    body.push(ast.stmt(hook)?);
    ast.method(MethodDef {
        name: "IPeripheral.Reset".into(),
        body: Some(body),
        ..Default::default()
    })
}

/// `if(offset == <address>) { ... }`
fn address_guard(ast: &mut Ast, offset: NodeId, address: u64, then: Vec<NodeId>) -> AstResult<NodeId> {
    let offset = ast.var_ref(offset)?;
    let address = ast.int_lit(address, false, true, true);
    let matches = ast.binary(BinOp::Eq, offset, address)?;
    ast.if_stmt(matches, then, vec![])
}

impl<'a> CSharpGenerator<'a> {
    pub fn new(state: &'a ScannedState, config: &'a ExportConfig) -> Self {
        Self { state, config }
    }

    fn read_method(
        &self,
        ast: &mut Ast,
        registers: &[Member],
        arrays: &[Member],
    ) -> AstResult<NodeId> {
        let offset = ast.param("offset", Type::LONG);
        let mut body = vec![];
        for (member, array) in arrays.iter().zip(&self.state.register_arrays) {
            body.push(dword_read_logic(ast, array, member.decl, offset)?);
        }
        for member in registers {
            let register = ast.var_ref(member.decl)?;
            let read = ast.call("Read", Some(register), vec![], Some(Type::UINT))?;
            let ret = ast.ret(Some(read))?;
            body.push(address_guard(ast, offset, member.address, vec![ret])?);
        }
        let unmapped = ast.int_lit(0, true, false, false);
        body.push(ast.ret(Some(unmapped))?);
        ast.method(MethodDef {
            name: "IDoubleWordPeripheral.ReadDoubleWord".into(),
            params: vec![offset],
            body: Some(body),
            ret: Some(Type::UINT),
            ..Default::default()
        })
    }

    fn write_method(
        &self,
        ast: &mut Ast,
        registers: &[Member],
        arrays: &[Member],
    ) -> AstResult<NodeId> {
        let offset = ast.param("offset", Type::LONG);
        let value = ast.param("value", Type::UINT);
        let mut body = vec![];
        for (member, array) in arrays.iter().zip(&self.state.register_arrays) {
            body.push(dword_write_logic(ast, array, member.decl, offset, value)?);
        }
        for member in registers {
            let register = ast.var_ref(member.decl)?;
            let incoming = ast.var_ref(value)?;
            let write = ast.call("Write", Some(register), vec![incoming], None)?;
            let write = ast.stmt(write)?;
            let ret = ast.ret(None)?;
            body.push(address_guard(ast, offset, member.address, vec![write, ret])?);
        }
        ast.method(MethodDef {
            name: "IDoubleWordPeripheral.WriteDoubleWord".into(),
            params: vec![offset, value],
            body: Some(body),
            ..Default::default()
        })
    }

    fn peripheral_class(&self, ast: &mut Ast) -> Result<NodeId> {
        let name = self.config.class_name(&self.state.name);
        let mut fields = vec![];
        let mut classes = vec![];
        let mut instances = vec![];

        let mut arrays = vec![];
        for array in &self.state.register_arrays {
            classes.push(container_class(ast, array)?);
            let decl = member_decl(ast, array.variable_name(), &array.type_name(), array.doc())?;
            fields.push(decl);
            instances.push((decl, array.type_name()));
            arrays.push(Member {
                decl,
                address: array.address,
            });
        }

        let mut registers = vec![];
        for reg in &self.state.registers {
            classes.push(register_class(ast, reg, self.state.reset_of(reg))?);
            let decl = member_decl(ast, reg.variable_name(), &reg.type_name(), reg.doc())?;
            fields.push(decl);
            instances.push((decl, reg.type_name()));
            registers.push(Member {
                decl,
                address: reg.address,
            });
        }

        let methods = vec![
            constructor(ast, &name, &instances)?,
            partial_hook(ast, "Init")?,
            partial_hook(ast, "Reset")?,
            reset_method(ast, &instances)?,
            self.read_method(ast, &registers, &arrays)?,
            self.write_method(ast, &registers, &arrays)?,
        ];

        debug!(
            "Assembled peripheral `{name}` with {} registers and {} register arrays",
            registers.len(),
            arrays.len()
        );
        Ok(ast.class(ClassDef {
            name,
            fields,
            methods,
            classes,
            derives: PERIPHERAL_INTERFACES
                .iter()
                .map(|i| (None, Type::named(*i)))
                .collect(),
            access: Some(Access::Public),
            modifiers: Modifiers::PARTIAL,
            ..Default::default()
        })?)
    }

    /// Builds the namespace tree holding the peripheral and runs the passes.
    pub fn build(&self) -> Result<GeneratedTree> {
        let mut path = self.config.namespace_path();
        let Some(innermost) = path.pop() else {
            bail!("The generated peripheral needs a namespace");
        };
        let mut ast = Ast::new();
        let peripheral = self.peripheral_class(&mut ast)?;
        let namespace = ast.namespace(innermost, vec![peripheral], vec![])?;
        let mut root = namespace;
        for name in path.into_iter().rev() {
            root = ast.namespace(name, vec![], vec![root])?;
        }
        process_ast(&mut ast, root, self.config.all_public)?;
        Ok(GeneratedTree {
            ast,
            root,
            namespace,
            peripheral,
        })
    }

    /// Generates the complete source file.
    pub fn generate_code(&self) -> Result<String> {
        let tree = self.build()?;
        let body = CodeGenerator::emit(&tree.ast, tree.namespace, EmitOptions::default())?;
        let mut code = String::from(HEADER);
        for line in body.lines() {
            code.push_str(line.trim_end());
            code.push('\n');
        }
        info!(
            "Generated peripheral `{}` ({} nodes)",
            self.config.class_name(&self.state.name),
            tree.ast.len()
        );
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Reg, RegArray};

    fn state() -> ScannedState {
        let mut enable = Field::new("enable", 0, 0);
        enable.reset = 1;
        let ctrl = Reg {
            fields: vec![enable],
            ..Reg::new("ctrl", 0x10)
        };
        let mut entry = Reg::new("entry", 0x100);
        entry.fields.push(Field::new("data", 0, 31));
        let buffer = RegArray {
            name: "buffer".into(),
            groups: vec![],
            register: entry,
            address: 0x100,
            count: 4,
            stride: 4,
        };
        ScannedState {
            name: "timer".into(),
            resets: [(ctrl.type_name(), ctrl.reset_value())].into_iter().collect(),
            registers: vec![ctrl],
            register_arrays: vec![buffer],
        }
    }

    fn section<'t>(text: &'t str, start: &str) -> &'t str {
        let begin = text.find(start).unwrap();
        let end = text[begin..].find("\n\n").map_or(text.len(), |e| begin + e + 1);
        &text[begin..end]
    }

    #[test]
    fn test_peripheral_layout() {
        let state = state();
        let config = ExportConfig::default().with_namespace("Mocks");
        let code = CSharpGenerator::new(&state, &config).generate_code().unwrap();
        assert!(code.starts_with(HEADER));
        assert!(code[HEADER.len()..].starts_with(
            "namespace Antmicro.Renode.Peripherals.Mocks
{
    public partial class Timer : IPeripheral, IDoubleWordPeripheral
    {
        /// <summary> Memory \"buffer\" at 0x100, 4 elements of \"entry\" every 4 bytes </summary>
        protected BufferType Buffer;
        /// <summary> Register \"ctrl\" at 0x10 </summary>
        protected CtrlType Ctrl;

        public Timer()
        {
            Buffer = new BufferType();
            Ctrl = new CtrlType();
            Init();
        }

        partial void Init();

        partial void Reset();

        void IPeripheral.Reset()
        {
            Buffer.Reset();
            Ctrl.Reset();
            Reset();
        }
"
        ));
        assert_eq!(
            section(&code, "        uint IDoubleWordPeripheral.ReadDoubleWord"),
            "        uint IDoubleWordPeripheral.ReadDoubleWord(long offset)
        {
            if(offset >= 0x100L && offset < 0x100L + Buffer.Size)
            {
                return Buffer.ReadDoubleWord(offset - 0x100L);
            }
            if(offset == 0x10L)
            {
                return Ctrl.Read();
            }
            return 0U;
        }
"
        );
        assert_eq!(
            section(&code, "        void IDoubleWordPeripheral.WriteDoubleWord"),
            "        void IDoubleWordPeripheral.WriteDoubleWord(long offset, uint value)
        {
            if(offset >= 0x100L && offset < 0x100L + Buffer.Size)
            {
                Buffer.WriteDoubleWord(offset - 0x100L, value);
                return;
            }
            if(offset == 0x10L)
            {
                Ctrl.Write(value);
                return;
            }
        }
"
        );
        assert!(code.ends_with("    }\n}\n"));
        assert!(code.lines().all(|line| line == line.trim_end()));
    }

    #[test]
    fn test_all_public() {
        let state = state();
        let config = ExportConfig::default().all_public(true);
        let code = CSharpGenerator::new(&state, &config).generate_code().unwrap();
        assert!(code.contains("namespace Antmicro.Renode.Peripherals\n"));
        assert!(code.contains("        public CtrlType Ctrl;\n"));
        assert!(code.contains("        public class CtrlType\n"));
        assert!(code.contains("        partial void Init();\n"));
        assert!(code.contains("        void IPeripheral.Reset()\n"));
    }

    #[test]
    fn test_empty_namespace_is_an_error() {
        let state = state();
        let config = ExportConfig::default().with_root_namespace("");
        assert!(CSharpGenerator::new(&state, &config).build().is_err());
    }
}
