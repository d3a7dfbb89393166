//! 语法分析
//!
//! 解析器在命令和内建函数的原型表驱动下工作：原型决定哪些参数位置按原始
//! 字符串扫描。

mod expr;
pub mod parser;
mod stmt;
pub mod tree;

pub use parser::{Parser, PrototypeMap};
pub use tree::{Child, Node, NodeId, NodeKind, SyntaxTree, Terminal, TerminalId};
