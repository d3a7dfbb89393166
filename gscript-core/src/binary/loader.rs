//! 已加载的字节码程序

use std::fmt::Write;

use super::reader::{ByteReader, ReadError};
use super::writer::write_program;
use crate::runtime::bytecode::{Opcode, PackedKind, PackedValue, OPERAND_SIZE};

/// 不可变的字节码程序：常量表 + 字节码体
///
/// 加载后只读，可以在多个执行上下文之间通过 `Arc` 共享。
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    strings: Vec<String>,
    numbers: Vec<f32>,
    body: Vec<u8>,
    body_offset: usize,
}

impl Program {
    /// 解析容器；校验每个长度字段和 bodyOffset
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReadError> {
        let mut reader = ByteReader::new(data);
        let declared = reader.read_u32("body offset")? as usize;

        let count = reader.read_u32("string count")? as usize;
        let mut strings = Vec::with_capacity(count.min(reader.remaining() / 4));
        for index in 0..count {
            let len = reader.read_u32("string length")? as usize;
            let bytes = reader.read_bytes(len, "string constant")?;
            let text = std::str::from_utf8(bytes).map_err(|_| ReadError::InvalidUtf8 { index })?;
            strings.push(text.to_string());
        }

        let count = reader.read_u32("number count")? as usize;
        let mut numbers = Vec::with_capacity(count.min(reader.remaining() / 4));
        for _ in 0..count {
            numbers.push(reader.read_f32("number constant")?);
        }

        let actual = reader.offset();
        if declared != actual {
            return Err(ReadError::BodyOffsetMismatch { declared, actual });
        }

        Ok(Self {
            strings,
            numbers,
            body: data[actual..].to_vec(),
            body_offset: actual,
        })
    }

    /// 由常量表和字节码体直接构造
    pub fn from_parts(strings: Vec<String>, numbers: Vec<f32>, body: Vec<u8>) -> Self {
        let body_offset = 4
            + 4
            + strings.iter().map(|s| 4 + s.len()).sum::<usize>()
            + 4
            + numbers.len() * 4;
        Self {
            strings,
            numbers,
            body,
            body_offset,
        }
    }

    /// 重新编码为容器字节
    pub fn to_bytes(&self) -> Vec<u8> {
        write_program(&self.strings, &self.numbers, &self.body)
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn numbers(&self) -> &[f32] {
        &self.numbers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 字节码体在容器中的偏移
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    pub fn string(&self, index: u16) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    pub fn number(&self, index: u16) -> Option<f32> {
        self.numbers.get(index as usize).copied()
    }

    /// 反汇编：每行 `偏移  操作码  操作数`
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let mut ip = 0;

        while ip < self.body.len() {
            let offset = ip;
            let byte = self.body[ip];
            ip += 1;

            let Ok(op) = Opcode::try_from(byte) else {
                let _ = writeln!(out, "{:04}  ??? 0x{:02x}", offset, byte);
                continue;
            };

            if op.operand_len() == 0 {
                let _ = writeln!(out, "{:04}  {}", offset, op);
                continue;
            }

            let Some(raw) = self.body.get(ip..ip + OPERAND_SIZE) else {
                let _ = writeln!(out, "{:04}  {:<8} <truncated>", offset, op);
                break;
            };
            let raw = [raw[0], raw[1], raw[2], raw[3]];
            ip += OPERAND_SIZE;

            let operand = if op.has_jump_operand() {
                let displacement = i32::from_le_bytes(raw);
                let target = ip as i64 + displacement as i64;
                format!("{:+} -> {:04}", displacement, target)
            } else {
                match PackedValue::from_le_bytes(raw) {
                    Ok(packed) => self.describe_packed(packed),
                    Err(kind) => format!("<bad kind {}>", kind),
                }
            };
            let _ = writeln!(out, "{:04}  {:<8} {}", offset, op, operand);
        }

        out
    }

    fn describe_packed(&self, packed: PackedValue) -> String {
        let resolved = match packed.kind {
            PackedKind::ConstNumber => self.number(packed.index).map(|n| n.to_string()),
            PackedKind::ConstString | PackedKind::Named => {
                self.string(packed.index).map(|s| format!("{:?}", s))
            }
            PackedKind::ConstArray => self.number(packed.index).map(|n| format!("[{}]", n)),
        };
        format!("{} {}", packed, resolved.unwrap_or_else(|| "<missing>".to_string()))
    }
}
