//! API 层配置
//!
//! 包含执行配置 RunConfig 和全局单例（供 CLI 使用）

use gscript_config::{CompilerConfig, LimitConfig};
use gscript_log::Logger;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 执行配置
#[derive(Clone)]
pub struct RunConfig {
    /// 每条指令输出一行 trace 日志
    pub show_steps: bool,
    /// 编译后以反汇编形式记录字节码
    pub dump_bytecode: bool,
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
    pub logger: Arc<Logger>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("show_steps", &self.show_steps)
            .field("dump_bytecode", &self.dump_bytecode)
            .field("compiler", &self.compiler)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            show_steps: false,
            dump_bytecode: false,
            compiler: CompilerConfig::default(),
            limits: LimitConfig::default(),
            logger: Logger::noop(),
        }
    }
}

impl RunConfig {
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }
}

static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// 初始化全局配置；已经初始化过时返回 false，原配置保持不变
pub fn init(config: RunConfig) -> bool {
    GLOBAL_CONFIG.set(config).is_ok()
}

/// 全局配置；未初始化时先装入默认配置
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}
