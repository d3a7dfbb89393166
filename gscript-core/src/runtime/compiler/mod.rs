//! 语法树 → 字节码
//!
//! 单次遍历。前向跳转先写占位再修补；通用调用先预留 5 字节，
//! 等整个程序编译完、用户函数表完整之后再决定写 `JAL` 还是 `CALL`。

pub mod error;
pub mod expr;
pub mod stmt;

pub use error::CompileError;

use std::collections::HashMap;
use std::sync::Arc;

use gscript_config::CompilerConfig;
use gscript_log::Logger;

use crate::binary::writer::write_program;
use crate::compiler::parser::{NodeId, SyntaxTree};
use crate::kit::source::Pos;
use crate::runtime::bytecode::{Chunk, ConstantTable, Opcode, PackedKind, PackedValue, Reservation};

/// 常量表容量
const CONSTANT_LIMIT: usize = u16::MAX as usize + 1;

/// 等待决定目标的通用调用
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    /// 预留的 5 字节起点
    pub position: usize,
    pub name: String,
}

/// 正在编译的循环
#[derive(Debug)]
pub(crate) struct LoopFrame {
    pub node: NodeId,
    /// 已知的 continue 目标（`while` 的条件位置）
    pub continue_target: Option<usize>,
    pub breaks: Vec<Reservation>,
    pub continues: Vec<Reservation>,
}

/// 字节码生成器
pub struct Compiler {
    pub(crate) chunk: Chunk,
    pub(crate) strings: ConstantTable<String>,
    pub(crate) numbers: ConstantTable<f32>,
    /// 用户函数入口
    pub(crate) functions: HashMap<String, usize>,
    pub(crate) pending_calls: Vec<PendingCall>,
    pub(crate) loops: Vec<LoopFrame>,
    pub(crate) config: CompilerConfig,
    pub(crate) logger: Arc<Logger>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default(), Logger::noop())
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self::with_config(CompilerConfig::default(), logger)
    }

    pub fn with_config(config: CompilerConfig, logger: Arc<Logger>) -> Self {
        Self {
            chunk: Chunk::new(),
            strings: ConstantTable::new(),
            numbers: ConstantTable::new(),
            functions: HashMap::new(),
            pending_calls: Vec::new(),
            loops: Vec::new(),
            config,
            logger,
        }
    }

    /// 编译整棵树，返回容器字节
    ///
    /// 循环节点的 `break_target`/`continue_target` 会被回填到树上。
    pub fn compile(&mut self, tree: &mut SyntaxTree) -> Result<Vec<u8>, CompileError> {
        let _span = self.logger.enter_span("compile");
        self.reset();

        if self.config.dump_tree {
            gscript_log::debug!(
                self.logger,
                target: "gscript::compiler",
                "syntax tree:\n{}",
                tree.dump(self.config.dump_terminals)
            );
        }

        if let Some(root) = tree.root() {
            stmt::compile_stmt(self, tree, root)?;
        }
        self.resolve_calls()?;

        gscript_log::debug!(
            self.logger,
            target: "gscript::compiler",
            "emitted {} bytes, {} strings, {} numbers, {} functions",
            self.chunk.len(),
            self.strings.len(),
            self.numbers.len(),
            self.functions.len()
        );
        tracing::debug!(
            target: "gscript::compiler",
            body = self.chunk.len(),
            strings = self.strings.len(),
            numbers = self.numbers.len(),
            "compiled program"
        );

        Ok(write_program(
            self.strings.as_slice(),
            self.numbers.as_slice(),
            &self.chunk.code,
        ))
    }

    fn reset(&mut self) {
        self.chunk = Chunk::new();
        self.strings = ConstantTable::new();
        self.numbers = ConstantTable::new();
        self.functions.clear();
        self.pending_calls.clear();
        self.loops.clear();
    }

    // ===== 常量 =====

    pub(crate) fn intern_string(&mut self, text: &str) -> Result<u16, CompileError> {
        self.strings
            .intern(text.to_string())
            .ok_or(CompileError::TooManyConstants {
                table: "string",
                limit: CONSTANT_LIMIT,
            })
    }

    pub(crate) fn intern_number(&mut self, n: f32) -> Result<u16, CompileError> {
        self.numbers.intern(n).ok_or(CompileError::TooManyConstants {
            table: "number",
            limit: CONSTANT_LIMIT,
        })
    }

    // ===== 发射 =====

    pub(crate) fn emit(&mut self, op: Opcode) {
        self.chunk.write_op(op);
    }

    pub(crate) fn emit_packed(&mut self, op: Opcode, kind: PackedKind, index: u16) {
        self.chunk.write_op_packed(op, PackedValue::new(kind, index));
    }

    pub(crate) fn emit_number(&mut self, n: f32) -> Result<(), CompileError> {
        let index = self.intern_number(n)?;
        self.emit_packed(Opcode::Push, PackedKind::ConstNumber, index);
        Ok(())
    }

    pub(crate) fn emit_string(&mut self, text: &str) -> Result<(), CompileError> {
        let index = self.intern_string(text)?;
        self.emit_packed(Opcode::Push, PackedKind::ConstString, index);
        Ok(())
    }

    pub(crate) fn emit_named(&mut self, name: &str) -> Result<(), CompileError> {
        let index = self.intern_string(name)?;
        self.emit_packed(Opcode::Push, PackedKind::Named, index);
        Ok(())
    }

    /// 把栈顶 `count` 个值收成数组常量
    pub(crate) fn emit_array(&mut self, count: usize) -> Result<(), CompileError> {
        let index = self.intern_number(count as f32)?;
        self.emit_packed(Opcode::Push, PackedKind::ConstArray, index);
        Ok(())
    }

    /// 缺失的表达式按数字 0 处理
    pub(crate) fn emit_missing(&mut self, at: Pos, what: &str) -> Result<(), CompileError> {
        gscript_log::warn!(
            self.logger,
            target: "gscript::compiler",
            "{}: missing {}, using 0",
            at,
            what
        );
        self.emit_number(0.0)
    }

    /// 预留一次通用调用
    pub(crate) fn emit_pending_call(&mut self, name: &str) {
        let position = self.chunk.current_offset();
        self.emit(Opcode::Call);
        self.chunk.write_i32(0);
        self.pending_calls.push(PendingCall {
            position,
            name: name.to_string(),
        });
    }

    /// 回填通用调用：有同名用户函数写 `JAL`，否则写库函数 `CALL`
    fn resolve_calls(&mut self) -> Result<(), CompileError> {
        let pending = std::mem::take(&mut self.pending_calls);

        for call in pending {
            let mut bytes = [0u8; 5];
            if let Some(&entry) = self.functions.get(&call.name) {
                let from = call.position + 5;
                let displacement = entry as i64 - from as i64;
                bytes[0] = Opcode::Jal.into();
                bytes[1..].copy_from_slice(&(displacement as i32).to_le_bytes());
                gscript_log::trace!(
                    self.logger,
                    target: "gscript::compiler",
                    "call '{}' at {} -> JAL {}",
                    call.name,
                    call.position,
                    entry
                );
            } else {
                let index = self.intern_string(&call.name)?;
                bytes[0] = Opcode::Call.into();
                bytes[1..].copy_from_slice(&PackedValue::new(PackedKind::ConstString, index).to_le_bytes());
            }
            self.chunk.overwrite(call.position, &bytes);
        }

        Ok(())
    }
}

/// 解析数字字面量：十进制（小数点、指数、尾随 `f`）、`0x` 十六进制、`0b` 二进制
pub fn parse_number(text: &str) -> Option<f32> {
    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(digits, 16).ok().map(|v| v as f32);
    }
    if let Some(digits) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        return u64::from_str_radix(digits, 2).ok().map(|v| v as f32);
    }

    let decimal = text.strip_suffix('f').unwrap_or(text);
    if decimal.is_empty() {
        return None;
    }
    decimal.parse::<f32>().ok()
}
