//! GScript Core - 编译器与虚拟机（纯逻辑）
//!
//! 包含源码游标与诊断、词法分析、语法分析、代码生成、字节码容器和栈式虚拟机。
//! 除了 `FileSource` 读取源文件之外不做 IO；配置通过参数显式传入。

pub mod binary;
pub mod compiler;
pub mod kit;
pub mod runtime;

pub use binary::{Program, ReadError};
pub use compiler::lexer::{Lexer, Token, TokenKind};
pub use compiler::parser::{NodeId, NodeKind, Parser, PrototypeMap, SyntaxTree};
pub use kit::diag::{Diag, DiagBuilder, DiagObserver, Severity};
pub use kit::source::{FileSource, MemorySource, Pos, Range, Source, SourceError};
pub use runtime::bytecode::{ConstantTable, Opcode, PackedKind, PackedValue};
pub use runtime::compiler::{CompileError, Compiler};
pub use runtime::store::{VarKind, VarStore};
pub use runtime::value::{Value, VarHandle, Variable, VariableData};
pub use runtime::vm::{
    CommandFn, Context, DefaultFormatter, Library, RuntimeError, StoreSlot, StringFormatter,
};

// Re-export config types from gscript-config
pub use gscript_config::{CompilerConfig, LimitConfig, Phase};
