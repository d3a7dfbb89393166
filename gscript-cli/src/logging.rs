//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。核心库直接发出的
//! tracing 事件按 `gscript::<phase>` 过滤；`gscript-log` 日志器的记录
//! 先经 [`PhaseSink`] 按阶段过滤，再以 `gscript` 目标转发给 tracing。

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use gscript_config::Phase;
use gscript_log::{LogSink, Logger, Record, TracingSink};
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LogConfig;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 初始化 tracing 订阅者，并返回接入它的 GScript 日志器
///
/// 没有指定文件时写到 stderr，stdout 留给程序输出。
pub fn init(log_config: &LogConfig, format: LogFormat, file: Option<&Path>) -> io::Result<Arc<Logger>> {
    let targets = targets(log_config);

    match file {
        Some(path) => {
            let handle = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(handle))
                .with_filter(targets);
            tracing_subscriber::registry().with(layer).init();
        }
        None => {
            let layer = create_format_layer(format, io::stderr).with_filter(targets);
            tracing_subscriber::registry().with(layer).init();
        }
    }

    let logger = Logger::new(to_log_level(log_config.most_verbose()));
    logger.add_sink(PhaseSink::new(log_config.clone(), TracingSink));
    Ok(logger)
}

fn targets(log_config: &LogConfig) -> Targets {
    let mut targets = Targets::new()
        .with_default(log_config.global)
        .with_target("gscript", log_config.most_verbose())
        .with_target("gscript::cli", log_config.global);
    for phase in Phase::ALL {
        targets = targets.with_target(phase.target(), log_config.level_for(phase));
    }
    targets
}

/// 根据格式创建输出层
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

/// tracing 级别转换为日志器级别
pub fn to_log_level(level: Level) -> gscript_log::Level {
    match level {
        Level::TRACE => gscript_log::Level::Trace,
        Level::DEBUG => gscript_log::Level::Debug,
        Level::INFO => gscript_log::Level::Info,
        Level::WARN => gscript_log::Level::Warn,
        _ => gscript_log::Level::Error,
    }
}

/// 按记录所属阶段的级别过滤后再转发
pub struct PhaseSink<S> {
    config: LogConfig,
    inner: S,
}

impl<S: LogSink> PhaseSink<S> {
    pub fn new(config: LogConfig, inner: S) -> Self {
        Self { config, inner }
    }

    fn threshold(&self, target: &str) -> gscript_log::Level {
        let level = Phase::ALL
            .into_iter()
            .find(|phase| target.starts_with(phase.target()))
            .map(|phase| self.config.level_for(phase))
            .unwrap_or(self.config.global);
        to_log_level(level)
    }
}

impl<S: LogSink> LogSink for PhaseSink<S> {
    fn write(&self, record: &Record) {
        if record.level >= self.threshold(record.target) {
            self.inner.write(record);
        }
    }
}
