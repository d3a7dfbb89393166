//! 字节码容器测试

mod common;
use common::{compile, compile_bytes};

use gscript_core::{Program, ReadError};

#[test]
fn test_container_round_trip() {
    let bytes = compile_bytes("a = 1.5; b = a + 1.5; setstring s, text;").unwrap();
    let program = Program::from_bytes(&bytes).unwrap();

    assert_eq!(program.to_bytes(), bytes);
    assert_eq!(program.body_offset(), bytes.len() - program.body().len());
}

#[test]
fn test_constants_deduplicated() {
    let program = compile("a = 1; b = 1; c = a + a;").unwrap();

    // 1 只出现一次；名字各出现一次
    assert_eq!(program.numbers(), &[1.0]);
    assert_eq!(program.strings(), &["a".to_string(), "b".to_string(), "c".to_string()]);
}

#[test]
fn test_header_offset_matches() {
    let bytes = compile_bytes("x = 1;").unwrap();
    let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let program = Program::from_bytes(&bytes).unwrap();
    assert_eq!(declared, program.body_offset());

    let mut corrupted = bytes.clone();
    corrupted[0] = corrupted[0].wrapping_add(1);
    assert!(matches!(
        Program::from_bytes(&corrupted),
        Err(ReadError::BodyOffsetMismatch { .. })
    ));
}

#[test]
fn test_disassemble_listing() {
    let program = compile("x = 2;").unwrap();
    let listing = program.disassemble();
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("0000  PUSH"), "{}", listing);
    assert!(lines[0].contains("\"x\""), "{}", listing);
    assert!(lines[2].starts_with("0010  ASSIGN"), "{}", listing);
}

#[test]
fn test_empty_source_compiles_to_empty_body() {
    let program = compile("").unwrap();
    assert!(program.body().is_empty());
    assert!(program.strings().is_empty());
}
