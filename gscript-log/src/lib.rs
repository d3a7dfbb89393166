//! gscript-log - 结构化日志系统
//!
//! 为 GScript 编译器和虚拟机设计的日志系统：
//! - **显式传递**：没有全局 logger，每个阶段构造时接收 `Arc<Logger>`
//! - **非阻塞**：环形缓冲区满了覆盖最旧的记录
//! - **可桥接**：`TracingSink` 把记录转发给 `tracing`，由宿主的 subscriber 统一输出
//!
//! ```
//! use gscript_log::{LogConfig, Level, debug};
//!
//! let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(64).init();
//! debug!(logger, "compiled {} bytes", 42);
//! assert_eq!(ring.unwrap().len(), 1);
//! ```

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;
mod sink;
mod span;

pub use config::{LogConfig, OutputConfig};
pub use logger::{LogSink, Logger, SpanGuard};
pub use record::{Level, Record};
pub use ring_buffer::{LogRingBuffer, RingBufferStats};
pub use sink::{FileSink, StderrSink, StdoutSink, TracingSink};
pub use span::{Span, SpanId};

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 文件 sink 打开失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 级别名称无法识别
    #[error("unknown log level: {0}")]
    UnknownLevel(String),
}
