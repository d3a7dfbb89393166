//! 字节码体缓冲区
//!
//! 前向跳转先写入 4 字节占位（[`Reservation`]），跳转目标确定后原地修补。
//! 位移相对于操作数字段之后的第一个字节。

use super::opcode::Opcode;
use super::packed::PackedValue;
use super::OPERAND_SIZE;

/// 待修补的跳转操作数位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub position: usize,
}

/// 字节码体
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub code: Vec<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前写入位置
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn write_op(&mut self, op: Opcode) {
        self.code.push(op.into());
    }

    pub fn write_op_packed(&mut self, op: Opcode, operand: PackedValue) {
        self.write_op(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// 写入跳转指令和占位操作数
    pub fn write_jump(&mut self, op: Opcode) -> Reservation {
        self.write_op(op);
        let position = self.code.len();
        self.write_i32(0);
        Reservation { position }
    }

    /// 写入目标已知的跳转（向后跳转）
    pub fn write_jump_to(&mut self, op: Opcode, target: usize) {
        let reservation = self.write_jump(op);
        self.patch_to(reservation, target);
    }

    /// 把跳转修补到当前写入位置
    pub fn patch(&mut self, reservation: Reservation) {
        let target = self.current_offset();
        self.patch_to(reservation, target);
    }

    pub fn patch_to(&mut self, reservation: Reservation, target: usize) {
        let from = reservation.position + OPERAND_SIZE;
        let displacement = target as i64 - from as i64;
        let bytes = (displacement as i32).to_le_bytes();
        self.code[reservation.position..from].copy_from_slice(&bytes);
    }

    /// 在已写出的位置覆盖一段字节（同长度）
    pub fn overwrite(&mut self, position: usize, bytes: &[u8]) {
        self.code[position..position + bytes.len()].copy_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
