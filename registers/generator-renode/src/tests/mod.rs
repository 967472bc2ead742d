// Licensed under the Apache-2.0 license

//! Behavioural tests running the generated classes.


use registers_csharp::{process_ast, Ast, CodeGenerator, EmitOptions, NodeId};

use self::eval::{Evaluator, Fault, Value};
use crate::model::{Field, Reg, RegArray};
use crate::rdl::{OnRead, OnWrite};
use crate::regarray::container_class;
use crate::register::register_class;
use crate::{scan_design, AddrMapNode, CSharpGenerator, ExportConfig};

const OUT_OF_RANGE: &str = "System.IndexOutOfRangeException";

fn holder(fields: Vec<Field>, width: u32) -> (Ast, NodeId) {
    let reg = Reg {
        width,
        fields,
        ..Reg::new("holder", 0)
    };
    let mut ast = Ast::new();
    let class = register_class(&mut ast, &reg, 0).unwrap();
    process_ast(&mut ast, class, false).unwrap();
    (ast, class)
}

fn little_endian(bytes: &[u8]) -> u128 {
    bytes
        .iter()
        .rev()
        .fold(0, |acc, byte| acc << 8 | u128::from(*byte))
}

#[test]
fn test_field_round_trip() {
    let cases = [
        (0, 1),
        (9, 1),
        (31, 1),
        (0, 8),
        (5, 8),
        (3, 16),
        (16, 16),
        (7, 10),
        (0, 32),
        (4, 28),
        (32, 32),
        (8, 40),
        (20, 33),
    ];
    for (low, width) in cases {
        let high = low + width - 1;
        let (ast, class) = holder(vec![Field::new("f", low, high)], if high < 32 { 32 } else { 64 });
        let eval = Evaluator::new(&ast, class);
        let reg = eval.instantiate("HolderType", vec![]).unwrap();

        let memory = eval.field(&reg, "memory").bytes();
        let all = (1u128 << (8 * memory.borrow().len())) - 1;
        let ones = (1u128 << width) - 1;
        let mask = ones << low;
        let values = if width == 1 {
            vec![0, 1]
        } else {
            vec![0, ones, 0x5a5a_5a5a_5a5a_5a5a_5a5a & ones]
        };

        for value in values {
            memory.borrow_mut().fill(0xff);
            if width == 1 {
                eval.set(&reg, "F", Value::Bool(value == 1)).unwrap();
                assert_eq!(eval.get(&reg, "F").unwrap().bool(), value == 1);
            } else {
                eval.set(&reg, "F", Value::Int(value as i128)).unwrap();
                assert_eq!(
                    eval.get(&reg, "F").unwrap().int() as u128,
                    value,
                    "{value:#x} in the field at {low} of {width} bits"
                );
            }
            assert_eq!(
                little_endian(&memory.borrow()),
                (all & !mask) | value << low,
                "neighbours of {value:#x} in the field at {low} of {width} bits"
            );
        }
    }
}

#[test]
fn test_bool_field_sets_its_bit() {
    let (ast, class) = holder(vec![Field::new("go", 13, 13)], 32);
    let eval = Evaluator::new(&ast, class);
    let reg = eval.instantiate("HolderType", vec![]).unwrap();
    eval.set(&reg, "GO", Value::Bool(true)).unwrap();
    assert!(eval.get(&reg, "GO").unwrap().bool());
    assert_eq!(eval.call(&reg, "Read", vec![]).unwrap().int(), 1 << 13);
}

#[test]
fn test_write_effects() {
    let effects = [
        OnWrite::Woset,
        OnWrite::Woclr,
        OnWrite::Wot,
        OnWrite::Wzs,
        OnWrite::Wzc,
        OnWrite::Wzt,
        OnWrite::Wclr,
        OnWrite::Wset,
    ];
    let fields = effects
        .iter()
        .enumerate()
        .map(|(i, effect)| {
            let low = 4 * i as u32;
            let mut field = Field::new(format!("f{i}"), low, low + 3);
            field.onwrite = Some(*effect);
            field
        })
        .collect();
    let (ast, class) = holder(fields, 32);
    let eval = Evaluator::new(&ast, class);
    let reg = eval.instantiate("HolderType", vec![]).unwrap();
    let memory = eval.field(&reg, "memory").bytes();

    memory.borrow_mut().fill(0xaa);
    eval.call(&reg, "Write", vec![Value::Int(0x3333_3333)]).unwrap();
    assert_eq!(little_endian(&memory.borrow()), 0xf062_e98b);
    assert_eq!(eval.call(&reg, "Read", vec![]).unwrap().int(), 0xf062_e98b);

    memory.borrow_mut().fill(0x00);
    eval.call(&reg, "Write", vec![Value::Int(0)]).unwrap();
    assert_eq!(little_endian(&memory.borrow()), 0xf0f0_f000);
}

#[test]
fn test_read_effects() {
    let mut clear = Field::new("clear", 0, 7);
    clear.onread = Some(OnRead::Rclr);
    let mut set = Field::new("set", 8, 15);
    set.onread = Some(OnRead::Rset);
    let mut user = Field::new("user", 16, 23);
    user.onread = Some(OnRead::Ruser);
    let (ast, class) = holder(vec![clear, set, user], 32);
    let eval = Evaluator::new(&ast, class);
    let reg = eval.instantiate("HolderType", vec![]).unwrap();
    let memory = eval.field(&reg, "memory").bytes();

    memory.borrow_mut().copy_from_slice(&[0x5a, 0x12, 0x34, 0x00]);
    assert_eq!(eval.call(&reg, "Read", vec![]).unwrap().int(), 0x34_125a);
    assert_eq!(*memory.borrow(), [0x00, 0xff, 0x34, 0x00]);
    assert_eq!(eval.call(&reg, "Read", vec![]).unwrap().int(), 0x34_ff00);

    // Properties view the fields without side effects.
    memory.borrow_mut()[0] = 0x77;
    assert_eq!(eval.get(&reg, "CLEAR").unwrap().int(), 0x77);
    assert_eq!(memory.borrow()[0], 0x77);
}

#[test]
fn test_too_wide_field() {
    let reg = Reg {
        width: 96,
        fields: vec![Field::new("wide", 0, 71)],
        ..Reg::new("huge", 0)
    };
    let mut ast = Ast::new();
    let err = register_class(&mut ast, &reg, 0).unwrap_err();
    assert!(err.to_string().contains("72 bits wide"), "{err}");
}

#[test]
fn test_indexer_bounds() {
    let mut entry = Reg::new("entry", 0x400);
    entry.fields.push(Field::new("valid", 0, 0));
    entry.fields.push(Field::new("tag", 8, 19));
    let table = RegArray {
        name: "table".into(),
        groups: vec![],
        register: entry,
        address: 0x400,
        count: 16,
        stride: 8,
    };
    let mut ast = Ast::new();
    let class = container_class(&mut ast, &table).unwrap();
    process_ast(&mut ast, class, false).unwrap();
    let eval = Evaluator::new(&ast, class);
    let container = eval.instantiate("TableType", vec![]).unwrap();

    assert_eq!(eval.get(&container, "Size").unwrap().int(), 128);
    for index in [-1, 16, 100] {
        assert_eq!(
            eval.element(&container, index).unwrap_err(),
            Fault::Thrown(OUT_OF_RANGE.into())
        );
    }

    let element = eval.element(&container, 3).unwrap();
    assert_eq!(eval.field(&element, "spanBegin").int(), 24);
    eval.set(&element, "TAG", Value::Int(0xabc)).unwrap();
    eval.set(&element, "VALID", Value::Bool(true)).unwrap();
    let read = |offset: i128| {
        eval.call(&container, "ReadDoubleWord", vec![Value::Int(offset)])
            .unwrap()
            .int()
    };
    assert_eq!(read(24), 0xabc01);
    assert_eq!(read(16), 0);

    eval.call(
        &container,
        "WriteDoubleWord",
        vec![Value::Int(32), Value::Int(0x1234_5601)],
    )
    .unwrap();
    let next = eval.element(&container, 4).unwrap();
    assert!(eval.get(&next, "VALID").unwrap().bool());
    assert_eq!(eval.get(&next, "TAG").unwrap().int(), 0x456);

    eval.call(&container, "Reset", vec![]).unwrap();
    assert_eq!(read(24), 0);
    assert_eq!(read(32), 0);
}

const TIMER: &str = r#"
name = "timer"

[[children]]
type = "reg"
name = "ctrl"
offset = 0x10
fields = [
    { name = "enable", lsb = 0, msb = 0, reset = 1 },
    { name = "mode", lsb = 4, msb = 11 },
    { name = "status", lsb = 16, msb = 23, sw = "r", reset = 0x5a },
]

[[children]]
type = "mem"
name = "buffer"
offset = 0x100

[[children.children]]
type = "reg"
name = "entry"
array = [4]
fields = [{ name = "data", lsb = 0, msb = 31 }]
"#;

fn timer() -> crate::GeneratedTree {
    let top = AddrMapNode::from_toml(TIMER).unwrap();
    let state = scan_design(&top).unwrap();
    let config = ExportConfig::default().with_namespace("Timers");
    CSharpGenerator::new(&state, &config).build().unwrap()
}

const READ: &str = "IDoubleWordPeripheral.ReadDoubleWord";
const WRITE: &str = "IDoubleWordPeripheral.WriteDoubleWord";

#[test]
fn test_peripheral_register_access() {
    let tree = timer();
    let eval = Evaluator::new(&tree.ast, tree.root);
    let timer = eval.instantiate("Timer", vec![]).unwrap();
    let read = |offset: i128| eval.call(&timer, READ, vec![Value::Int(offset)]).unwrap().int();
    let write = |offset: i128, value: i128| {
        eval.call(&timer, WRITE, vec![Value::Int(offset), Value::Int(value)])
            .unwrap();
    };

    assert_eq!(read(0x10), 0x5a_0001);
    assert_eq!(read(0x14), 0);
    assert_eq!(read(0x40), 0);

    write(0x10, 0xab1);
    assert_eq!(read(0x10), 0x5a_0ab1);
    let ctrl = eval.field(&timer, "Ctrl");
    assert_eq!(eval.get(&ctrl, "MODE").unwrap().int(), 0xab);
    assert!(eval.get(&ctrl, "ENABLE").unwrap().bool());

    // status is read-only, bits without a field stay clear
    write(0x10, 0xffff_ffff);
    assert_eq!(read(0x10), 0x5a_0ff1);

    write(0x40, 0xffff_ffff);
    eval.call(&timer, "IPeripheral.Reset", vec![]).unwrap();
    assert_eq!(read(0x10), 0x5a_0001);
}

#[test]
fn test_peripheral_array_dispatch() {
    let tree = timer();
    let eval = Evaluator::new(&tree.ast, tree.root);
    let timer = eval.instantiate("Timer", vec![]).unwrap();
    let read = |offset: i128| eval.call(&timer, READ, vec![Value::Int(offset)]).unwrap().int();

    eval.call(
        &timer,
        WRITE,
        vec![Value::Int(0x108), Value::Int(0xdead_beef)],
    )
    .unwrap();
    assert_eq!(read(0x108), 0xdead_beef);
    assert_eq!(read(0x100), 0);
    assert_eq!(read(0x110), 0);

    let buffer = eval.field(&timer, "Buffer");
    let entry = eval.element(&buffer, 2).unwrap();
    assert_eq!(eval.get(&entry, "DATA").unwrap().int(), 0xdead_beef);
    eval.set(&entry, "DATA", Value::Int(0x1234)).unwrap();
    assert_eq!(read(0x108), 0x1234);

    eval.call(&timer, "IPeripheral.Reset", vec![]).unwrap();
    assert_eq!(read(0x108), 0);
}

const FIFO: &str = r#"
name = "fifo"

[[children]]
type = "mem"
name = "slots"
offset = 0x200

[[children.children]]
type = "reg"
name = "slot"
width = 8
array = [6]
fields = [
    { name = "en", lsb = 0, msb = 0, reset = 1 },
    { name = "level", lsb = 4, msb = 7, reset = 0xa },
]
"#;

#[test]
fn test_narrow_array_tail_access() {
    let top = AddrMapNode::from_toml(FIFO).unwrap();
    let state = scan_design(&top).unwrap();
    assert_eq!(state.register_arrays[0].stride, 1);
    let tree = CSharpGenerator::new(&state, &ExportConfig::default())
        .build()
        .unwrap();
    let eval = Evaluator::new(&tree.ast, tree.root);
    let fifo = eval.instantiate("Fifo", vec![]).unwrap();
    let read = |offset: i128| eval.call(&fifo, READ, vec![Value::Int(offset)]);

    assert_eq!(read(0x200).unwrap().int(), 0xa1a1_a1a1);
    assert_eq!(read(0x204).unwrap().int(), 0xa1a1);
    assert_eq!(read(0x205).unwrap().int(), 0xa1);
    assert_eq!(read(0x206).unwrap().int(), 0);

    eval.call(&fifo, WRITE, vec![Value::Int(0x204), Value::Int(0x0102_0354)])
        .unwrap();
    let slots = eval.field(&fifo, "Slots");
    assert_eq!(eval.get(&slots, "Size").unwrap().int(), 6);
    let fourth = eval.element(&slots, 4).unwrap();
    assert_eq!(eval.get(&fourth, "LEVEL").unwrap().int(), 5);
    assert!(!eval.get(&fourth, "EN").unwrap().bool());
    let last = eval.element(&slots, 5).unwrap();
    assert_eq!(eval.get(&last, "LEVEL").unwrap().int(), 0);
    assert!(eval.get(&last, "EN").unwrap().bool());
}

#[test]
fn test_array_elements_start_at_reset() {
    let top = AddrMapNode::from_toml(FIFO).unwrap();
    let state = scan_design(&top).unwrap();
    let tree = CSharpGenerator::new(&state, &ExportConfig::default())
        .build()
        .unwrap();
    let eval = Evaluator::new(&tree.ast, tree.root);
    let fifo = eval.instantiate("Fifo", vec![]).unwrap();
    let slots = eval.field(&fifo, "Slots");
    let check = |expected_en: bool, expected_level: i128| {
        for index in 0..6 {
            let slot = eval.element(&slots, index).unwrap();
            assert_eq!(eval.get(&slot, "EN").unwrap().bool(), expected_en, "slot {index}");
            assert_eq!(eval.get(&slot, "LEVEL").unwrap().int(), expected_level, "slot {index}");
        }
    };
    check(true, 0xa);

    for index in 0..6 {
        let slot = eval.element(&slots, index).unwrap();
        eval.set(&slot, "EN", Value::Bool(false)).unwrap();
        eval.set(&slot, "LEVEL", Value::Int(3)).unwrap();
    }
    check(false, 3);

    eval.call(&fifo, "IPeripheral.Reset", vec![]).unwrap();
    check(true, 0xa);
}

#[test]
fn test_interrupt_status_end_to_end() {
    let top = AddrMapNode::from_toml(
        r#"
name = "intc"

[[children]]
type = "reg"
name = "status"
offset = 0x0
fields = [
    { name = "pending", lsb = 0, msb = 7, sw = "r", onread = "rclr" },
]

[[children]]
type = "reg"
name = "clear"
offset = 0x0
fields = [
    { name = "pending", lsb = 0, msb = 7, sw = "w", onwrite = "woclr" },
]
"#,
    )
    .unwrap();
    let state = scan_design(&top).unwrap();
    let tree = CSharpGenerator::new(&state, &ExportConfig::default())
        .build()
        .unwrap();
    let eval = Evaluator::new(&tree.ast, tree.root);
    let intc = eval.instantiate("Intc", vec![]).unwrap();
    let read = || eval.call(&intc, READ, vec![Value::Int(0)]).unwrap().int();
    let write = |value: i128| {
        eval.call(&intc, WRITE, vec![Value::Int(0), Value::Int(value)])
            .unwrap();
    };

    let status = eval.field(&intc, "StatusClear");
    eval.set(&status, "PENDING_PENDING", Value::Int(0xf3)).unwrap();
    write(0x03);
    assert_eq!(eval.get(&status, "PENDING_PENDING").unwrap().int(), 0xf0);
    assert_eq!(read(), 0xf0);
    assert_eq!(read(), 0);
}

#[test]
fn test_ctrl_end_to_end() {
    let top = AddrMapNode::from_toml(
        r#"
name = "dev"

[[children]]
type = "reg"
name = "ctrl"
offset = 0x10
fields = [
    { name = "enable", lsb = 0, msb = 0, reset = 1 },
    { name = "mode", lsb = 1, msb = 2 },
]
"#,
    )
    .unwrap();
    let state = scan_design(&top).unwrap();
    let tree = CSharpGenerator::new(&state, &ExportConfig::default())
        .build()
        .unwrap();
    let text = CodeGenerator::emit(&tree.ast, tree.root, EmitOptions::default()).unwrap();
    assert!(text.contains("public bool ENABLE {"));
    assert!(text.contains("public byte MODE {"));

    let eval = Evaluator::new(&tree.ast, tree.root);
    let dev = eval.instantiate("Dev", vec![]).unwrap();
    let ctrl = eval.field(&dev, "Ctrl");
    assert!(eval.get(&ctrl, "ENABLE").unwrap().bool());
    assert_eq!(eval.get(&ctrl, "MODE").unwrap().int(), 0);
    let read = eval.call(&dev, READ, vec![Value::Int(0x10)]).unwrap();
    assert_eq!(read.int(), 0b001);

    eval.set(&ctrl, "MODE", Value::Int(0b10)).unwrap();
    let read = eval.call(&dev, READ, vec![Value::Int(0x10)]).unwrap();
    assert_eq!(read.int(), 0b101);
}

#[test]
fn test_passes_are_idempotent() {
    let mut tree = timer();
    let options = EmitOptions::default();
    let first = CodeGenerator::emit(&tree.ast, tree.root, options).unwrap();
    process_ast(&mut tree.ast, tree.root, false).unwrap();
    let second = CodeGenerator::emit(&tree.ast, tree.root, options).unwrap();
    assert_eq!(first, second);
}
