//! 栈式虚拟机
//!
//! 一个 [`Context`] 持有一次执行所需的全部状态：操作数栈、返回地址栈、
//! 链接的程序、变量存储和库。程序本身只读，可以在多个上下文之间共享；
//! 上下文之间不共享任何可变状态。

mod error;
mod execution;
mod formatter;
mod library;
mod operators;
mod stack;
mod variables;

pub use crate::runtime::store::StoreSlot;
pub use error::RuntimeError;
pub use formatter::{format_number, interpolate, DefaultFormatter, StringFormatter};
pub use library::{CommandFn, Library};

use std::sync::Arc;

use gscript_config::LimitConfig;
use gscript_log::Logger;

use crate::binary::Program;
use crate::runtime::store::VarStore;
use crate::runtime::value::Value;

/// 执行上下文
pub struct Context {
    pub(crate) primary: VarStore,
    /// 按前缀挂载的存储，按挂载顺序匹配
    pub(crate) linked_stores: Vec<(String, VarStore)>,
    pub(crate) libraries: Vec<Arc<Library>>,
    pub(crate) programs: Vec<Arc<Program>>,
    /// 只读，读取时优先级最高
    pub(crate) event_flags: Option<Arc<VarStore>>,
    pub(crate) formatter: Arc<dyn StringFormatter>,
    pub(crate) limits: LimitConfig,
    pub(crate) logger: Arc<Logger>,
    pub(crate) stack: Vec<Value>,
    pub(crate) return_stack: Vec<usize>,
    /// 每条指令输出一行 trace 日志
    pub(crate) trace_steps: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_logger(Logger::noop())
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            primary: VarStore::new(),
            linked_stores: Vec::new(),
            libraries: Vec::new(),
            programs: Vec::new(),
            event_flags: None,
            formatter: Arc::new(DefaultFormatter),
            limits: LimitConfig::default(),
            logger,
            stack: Vec::new(),
            return_stack: Vec::new(),
            trace_steps: false,
        }
    }

    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn StringFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn set_trace_steps(&mut self, enabled: bool) {
        self.trace_steps = enabled;
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.limits
    }

    // ==================== 链接 ====================

    /// 追加程序；`run` 按链接顺序依次执行
    pub fn link_program(&mut self, program: Arc<Program>) {
        self.programs.push(program);
    }

    /// 追加库；查找命令和函数时先链接者优先
    pub fn link_library(&mut self, library: Arc<Library>) {
        self.libraries.push(library);
    }

    /// 挂载存储：名字以 `prefix` 开头的变量读写路由到它
    pub fn link_store(&mut self, prefix: impl Into<String>, store: VarStore) {
        self.linked_stores.push((prefix.into(), store));
    }

    pub fn programs(&self) -> &[Arc<Program>] {
        &self.programs
    }

    pub fn libraries(&self) -> &[Arc<Library>] {
        &self.libraries
    }

    pub fn primary_store(&self) -> &VarStore {
        &self.primary
    }

    pub fn primary_store_mut(&mut self) -> &mut VarStore {
        &mut self.primary
    }

    /// 按挂载前缀取存储
    pub fn linked_store(&self, prefix: &str) -> Option<&VarStore> {
        self.linked_stores.iter().find(|(p, _)| p == prefix).map(|(_, s)| s)
    }

    pub fn linked_store_mut(&mut self, prefix: &str) -> Option<&mut VarStore> {
        self.linked_stores
            .iter_mut()
            .find(|(p, _)| p == prefix)
            .map(|(_, s)| s)
    }

    pub fn event_flags(&self) -> Option<&VarStore> {
        self.event_flags.as_deref()
    }

    // ==================== 执行 ====================

    /// 依次执行所有链接的程序
    ///
    /// `event_flags` 在本次执行期间作为只读存储参与变量读取。
    pub fn run(&mut self, event_flags: Option<Arc<VarStore>>) -> Result<(), RuntimeError> {
        let _span = self.logger.enter_span("run");
        self.event_flags = event_flags;

        let programs = self.programs.clone();
        let mut result = Ok(());
        for (index, program) in programs.iter().enumerate() {
            gscript_log::debug!(
                self.logger,
                target: "gscript::vm",
                "running program {} ({} bytes)",
                index,
                program.body().len()
            );
            result = execution::run_program(self, program);
            if result.is_err() {
                break;
            }
        }

        tracing::debug!(target: "gscript::vm", programs = programs.len(), ok = result.is_ok(), "run finished");
        self.event_flags = None;
        result
    }

    /// 执行单个程序（不必事先链接）
    pub fn run_program(&mut self, program: &Program) -> Result<(), RuntimeError> {
        execution::run_program(self, program)
    }

    /// 清空操作数栈和返回地址栈
    pub fn reset(&mut self) {
        self.stack.clear();
        self.return_stack.clear();
    }

    // ==================== 插值 ====================

    /// 用当前格式化器展开文本中的 `#v/#s/#e`
    pub fn interpolate(&self, text: &str) -> String {
        formatter::interpolate(self, self.formatter.as_ref(), text)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("programs", &self.programs.len())
            .field("libraries", &self.libraries)
            .field("linked_stores", &self.linked_stores.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("stack", &self.stack)
            .finish()
    }
}
