//! CLI 配置
//!
//! 项目文件 `gscript.json` 与分阶段日志级别

use std::path::{Path, PathBuf};

use gscript_config::{CompilerConfig, LimitConfig, Phase};
use gscript_core::PrototypeMap;
use serde::Deserialize;
use tracing::Level;

/// `gscript.json` 结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    /// 入口文件，相对于项目文件所在目录
    pub entry: String,
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
    /// 缺省时使用演示库的原型表
    pub prototypes: Option<Prototypes>,
    pub options: ProjectOptions,
    pub log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Prototypes {
    pub commands: PrototypeMap,
    pub functions: PrototypeMap,
}

/// 可被命令行参数覆盖的运行选项
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectOptions {
    pub compile_only: bool,
    pub dump_bytecode: bool,
    pub show_steps: bool,
    pub show_source: bool,
}

/// 日志级别字符串: "error", "warn", "info", "debug", "trace"
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: Option<String>,
    pub lexer: Option<String>,
    pub parser: Option<String>,
    pub compiler: Option<String>,
    pub vm: Option<String>,
}

impl ProjectFile {
    /// 读取并校验项目文件
    pub fn read(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!(
                "未找到 '{}'\n\n当前目录不是一个 GScript 项目。\n提示: 创建 '{}' 文件并指定 'entry' 字段，或直接传入脚本路径",
                path.display(),
                path.display()
            ));
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;
        let project: ProjectFile =
            serde_json::from_str(&content).map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))?;

        if project.entry.is_empty() {
            return Err(format!("'{}' 中的 'entry' 字段不能为空", path.display()));
        }
        Ok(project)
    }

    /// 入口文件路径
    pub fn entry_path(&self, project_path: &Path) -> PathBuf {
        let base_dir = project_path.parent().unwrap_or(Path::new("."));
        base_dir.join(&self.entry)
    }
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub lexer: Option<Level>,
    pub parser: Option<Level>,
    pub compiler: Option<Level>,
    pub vm: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            lexer: None,
            parser: None,
            compiler: None,
            vm: None,
        }
    }
}

impl LogConfig {
    /// 从项目文件的日志段构建；无法识别的级别被忽略
    pub fn from_section(section: &LogSection) -> Self {
        let parse = |s: &Option<String>| s.as_deref().and_then(|s| s.parse::<Level>().ok());
        Self {
            global: parse(&section.level).unwrap_or(Level::WARN),
            lexer: parse(&section.lexer),
            parser: parse(&section.parser),
            compiler: parse(&section.compiler),
            vm: parse(&section.vm),
        }
    }

    /// 某阶段的日志级别
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Lexer => self.lexer,
            Phase::Parser => self.parser,
            Phase::Compiler => self.compiler,
            Phase::Vm => self.vm,
        };
        level.unwrap_or(self.global)
    }

    /// 所有阶段中最详细的级别
    pub fn most_verbose(&self) -> Level {
        Phase::ALL
            .iter()
            .map(|phase| self.level_for(*phase))
            .fold(self.global, |a, b| if b > a { b } else { a })
    }
}
