//! 日志配置
//!
//! 一次性组装 logger 和它的输出目标。

use crate::ring_buffer::LogRingBuffer;
use crate::sink::{FileSink, StderrSink, StdoutSink, TracingSink};
use crate::{Level, Logger};
use std::sync::Arc;

/// 日志输出目标配置
#[derive(Clone, Debug, PartialEq)]
pub enum OutputConfig {
    Stdout,
    Stderr,
    /// 追加写入的文件路径
    File(String),
    /// 环形缓冲区容量
    RingBuffer(usize),
    /// 转发到 `tracing`
    Tracing,
}

/// 日志配置
///
/// ```
/// use gscript_log::{LogConfig, Level};
///
/// let (logger, ring) = LogConfig::new(Level::Debug)
///     .with_ring_buffer(10000)
///     .init();
/// assert!(ring.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: Level,
    pub outputs: Vec<OutputConfig>,
    /// 为 false 时 `init` 返回的 logger 不会在记录中附带 span ID
    pub enable_span: bool,
}

impl LogConfig {
    /// 指定级别，无输出
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            outputs: Vec::new(),
            enable_span: true,
        }
    }

    /// 开发环境：Debug 级别，stdout + 10000 条环形缓冲区
    pub fn dev() -> Self {
        LogConfig {
            level: Level::Debug,
            outputs: vec![OutputConfig::Stdout, OutputConfig::RingBuffer(10000)],
            enable_span: true,
        }
    }

    /// 生产环境：Warn 级别，stderr + 1000 条环形缓冲区
    pub fn production() -> Self {
        LogConfig {
            level: Level::Warn,
            outputs: vec![OutputConfig::Stderr, OutputConfig::RingBuffer(1000)],
            enable_span: false,
        }
    }

    /// 测试环境：Trace 级别，只写入环形缓冲区，方便断言
    pub fn test() -> Self {
        LogConfig {
            level: Level::Trace,
            outputs: vec![OutputConfig::RingBuffer(4096)],
            enable_span: false,
        }
    }

    pub fn with_stdout(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stdout) {
            self.outputs.push(OutputConfig::Stdout);
        }
        self
    }

    pub fn with_stderr(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stderr) {
            self.outputs.push(OutputConfig::Stderr);
        }
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(OutputConfig::File(path.into()));
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.outputs.push(OutputConfig::RingBuffer(capacity));
        self
    }

    pub fn with_tracing(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Tracing) {
            self.outputs.push(OutputConfig::Tracing);
        }
        self
    }

    pub fn without_span(mut self) -> Self {
        self.enable_span = false;
        self
    }

    /// 初始化日志系统
    ///
    /// 返回 (logger, Option<ring_buffer>)。配置了多个环形缓冲区时返回最后一个。
    /// 打不开的文件输出会被跳过。
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = Logger::new(self.level);
        let mut ring_buffer: Option<Arc<LogRingBuffer>> = None;

        for output in self.outputs {
            match output {
                OutputConfig::Stdout => logger.add_sink(StdoutSink),
                OutputConfig::Stderr => logger.add_sink(StderrSink),
                OutputConfig::File(path) => {
                    if let Ok(sink) = FileSink::new(&path) {
                        logger.add_sink(sink);
                    }
                }
                OutputConfig::RingBuffer(capacity) => {
                    let ring = LogRingBuffer::new(capacity);
                    ring_buffer = Some(Arc::clone(&ring));
                    logger.add_sink(ring);
                }
                OutputConfig::Tracing => logger.add_sink(TracingSink),
            }
        }

        if !self.enable_span {
            logger.disable_spans();
        }

        (logger, ring_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let dev = LogConfig::dev();
        assert_eq!(dev.level, Level::Debug);
        assert!(dev.outputs.contains(&OutputConfig::Stdout));

        let prod = LogConfig::production();
        assert_eq!(prod.level, Level::Warn);
        assert!(prod.outputs.contains(&OutputConfig::Stderr));
        assert!(!prod.enable_span);

        let test = LogConfig::test();
        assert_eq!(test.level, Level::Trace);
        assert_eq!(test.outputs, vec![OutputConfig::RingBuffer(4096)]);
    }

    #[test]
    fn test_builder_deduplicates_std_streams() {
        let config = LogConfig::new(Level::Info)
            .with_stdout()
            .with_stdout()
            .with_tracing()
            .with_ring_buffer(5000);

        assert_eq!(
            config.outputs,
            vec![
                OutputConfig::Stdout,
                OutputConfig::Tracing,
                OutputConfig::RingBuffer(5000)
            ]
        );
    }

    #[test]
    fn test_config_init() {
        let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(100).init();

        assert_eq!(logger.level(), Level::Debug);
        crate::debug!(logger, "test message");
        crate::trace!(logger, "filtered");
        assert_eq!(ring.unwrap().dump_records().len(), 1);
    }

    #[test]
    fn test_without_span() {
        let (logger, ring) = LogConfig::test().without_span().init();
        let ring = ring.unwrap();

        let guard = logger.enter_span("run");
        crate::info!(logger, "no span id");
        drop(guard);

        assert_eq!(ring.dump_records()[0].span_id, None);
    }
}
