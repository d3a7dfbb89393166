//! 代码生成错误

use crate::kit::source::Pos;

/// 代码生成阶段的致命错误
///
/// 语法错误只作为诊断上报；这里的错误说明树虽然合法，但无法翻译成字节码。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("invalid assignment target '{text}'")]
    InvalidAssignTarget { text: String, pos: Pos },

    #[error("'{op}' is not supported")]
    Unsupported { op: String, pos: Pos },

    #[error("operand of '{op}' must be an identifier")]
    InvalidIncrementTarget { op: String, pos: Pos },

    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String, pos: Pos },

    #[error("range |{lower}, {upper}| has more than {limit} elements")]
    RangeTooLarge {
        lower: String,
        upper: String,
        limit: usize,
        pos: Pos,
    },

    #[error("too many {table} constants (limit {limit})")]
    TooManyConstants { table: &'static str, limit: usize },
}

impl CompileError {
    /// 出错位置（常量表溢出没有具体位置）
    pub fn pos(&self) -> Option<Pos> {
        match self {
            CompileError::InvalidAssignTarget { pos, .. }
            | CompileError::Unsupported { pos, .. }
            | CompileError::InvalidIncrementTarget { pos, .. }
            | CompileError::InvalidNumber { pos, .. }
            | CompileError::RangeTooLarge { pos, .. } => Some(*pos),
            CompileError::TooManyConstants { .. } => None,
        }
    }
}
