//! API 类型定义
//!
//! 编译和执行的输入输出类型。

use gscript_core::{Context, Diag, Program, SyntaxTree};

/// 编译输出
#[derive(Debug)]
pub struct CompileOutput {
    /// 容器字节，可以直接写盘
    pub bytes: Vec<u8>,
    /// 由 `bytes` 加载出的程序
    pub program: Program,
    /// 词法/语法诊断（非致命）
    pub diagnostics: Vec<Diag>,
    /// 回填了循环目标的语法树
    pub tree: SyntaxTree,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diag::is_error)
    }
}

/// 执行输出
#[derive(Debug)]
pub struct ExecuteOutput {
    /// 执行结束后的上下文，可以继续查询变量
    pub context: Context,
    /// `message`/`print` 输出的文本行
    pub output: Vec<String>,
}
