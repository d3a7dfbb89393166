//! 字节码定义
//!
//! 操作码为单字节；操作数为 4 字节，或是相对跳转位移（i32），或是
//! [`PackedValue`]。所有多字节整数均为小端序。

pub mod chunk;
pub mod constants;
pub mod opcode;
pub mod packed;

pub use chunk::{Chunk, Reservation};
pub use constants::{ConstantTable, Interned};
pub use opcode::Opcode;
pub use packed::{PackedKind, PackedValue};

/// 操作数字节数
pub const OPERAND_SIZE: usize = 4;
