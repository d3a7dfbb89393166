//! 运行时错误

/// 虚拟机执行错误
///
/// 读取未定义变量、越界读取数组不是错误（得到默认值）；这里只收录无法继续执行的情况。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow (limit {limit})")]
    StackOverflow { limit: usize },

    #[error("return stack overflow (limit {limit})")]
    ReturnStackOverflow { limit: usize },

    #[error("unknown opcode 0x{byte:02x} at {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("truncated operand at {offset}")]
    TruncatedOperand { offset: usize },

    #[error("invalid operand kind {kind} at {offset}")]
    InvalidOperand { kind: u8, offset: usize },

    #[error("invalid {table} constant index {index}")]
    InvalidConstant { table: &'static str, index: u16 },

    #[error("jump to {target} out of bounds (body length {len})")]
    JumpOutOfBounds { target: i64, len: usize },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{op} needs a variable operand")]
    NotAVariable { op: &'static str },

    #[error("invalid index {index} for array '{name}'")]
    InvalidArrayIndex { name: String, index: f64 },

    #[error("array '{name}' would grow to {len} elements (limit {limit})")]
    ArrayTooLarge { name: String, len: usize, limit: usize },

    #[error("{name}: {message}")]
    Library { name: String, message: String },
}

impl RuntimeError {
    /// 库回调报告的失败
    pub fn library(name: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Library {
            name: name.into(),
            message: message.into(),
        }
    }
}
