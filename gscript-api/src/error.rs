//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use thiserror::Error;

use gscript_core::{CompileError, Diag, ReadError, RuntimeError, SourceError};

/// GScript 错误类型
#[derive(Error, Debug)]
pub enum GscriptError {
    /// 打不开源文件
    #[error("{0}")]
    Source(#[from] SourceError),

    /// 严格模式下的语法错误（第一条 Error 级别诊断）
    #[error("Syntax error: {}", .0.message)]
    Diagnostics(Diag),

    #[error("Compiler error: {0}")]
    Compiler(#[from] CompileError),

    /// 字节码容器无法加载
    #[error("Load error: {0}")]
    Load(#[from] ReadError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl GscriptError {
    /// 获取错误行号（如果有）
    pub fn line(&self) -> Option<usize> {
        match self {
            GscriptError::Diagnostics(diag) => Some(diag.pos.line),
            GscriptError::Compiler(e) => e.pos().map(|pos| pos.line),
            _ => None,
        }
    }

    /// 获取错误列号（如果有）
    pub fn column(&self) -> Option<usize> {
        match self {
            GscriptError::Diagnostics(diag) => Some(diag.pos.column),
            GscriptError::Compiler(e) => e.pos().map(|pos| pos.column),
            _ => None,
        }
    }

    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            GscriptError::Source(_) => "source",
            GscriptError::Diagnostics(_) => "parser",
            GscriptError::Compiler(_) => "compiler",
            GscriptError::Load(_) => "loader",
            GscriptError::Runtime(_) => "runtime",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以再转成 JSON。
    pub fn to_report(&self) -> ErrorReport {
        let message = match self {
            GscriptError::Source(e) => e.to_string(),
            GscriptError::Diagnostics(diag) => diag.message.clone(),
            GscriptError::Compiler(e) => e.to_string(),
            GscriptError::Load(e) => e.to_string(),
            GscriptError::Runtime(e) => e.to_string(),
        };

        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            column: self.column(),
            error_kind: self.error_kind(),
            message,
        }
    }

    fn error_kind(&self) -> String {
        let kind = match self {
            GscriptError::Source(_) => "SourceError",
            GscriptError::Diagnostics(_) => "SyntaxError",
            GscriptError::Compiler(e) => match e {
                CompileError::InvalidAssignTarget { .. } => "InvalidAssignTarget",
                CompileError::Unsupported { .. } => "Unsupported",
                CompileError::InvalidIncrementTarget { .. } => "InvalidIncrementTarget",
                CompileError::InvalidNumber { .. } => "InvalidNumber",
                CompileError::RangeTooLarge { .. } => "RangeTooLarge",
                CompileError::TooManyConstants { .. } => "TooManyConstants",
            },
            GscriptError::Load(_) => "ReadError",
            GscriptError::Runtime(_) => "RuntimeError",
        };
        kind.to_string()
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// 错误阶段: source, parser, compiler, loader, runtime
    pub phase: &'static str,
    /// 行号（1-based，如果有）
    pub line: Option<usize>,
    /// 列号（1-based，如果有）
    pub column: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "[{}:{}] {} error: {}", line, col, self.phase, self.message),
            _ => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
