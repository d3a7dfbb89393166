//! 日志器实现

use crate::record::{Level, Record};
use crate::span::{Span, SpanId};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 日志输出目标
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// 日志器
///
/// 级别可以在运行中调整；sink 列表和 span 栈由互斥锁保护，
/// 同一个 logger 可以在多个执行上下文之间共享。
pub struct Logger {
    level: AtomicU8,
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
    span_stack: Mutex<Vec<Span>>,
    next_span_id: AtomicU64,
    spans_enabled: AtomicBool,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // sink 在写入时 panic 不应让日志器永久失效
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
            span_stack: Mutex::new(Vec::new()),
            next_span_id: AtomicU64::new(1),
            spans_enabled: AtomicBool::new(true),
        })
    }

    /// 添加输出目标（链式）
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        relock(&self.sinks).push(Box::new(sink));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    /// 级别已启用且至少有一个 sink 时才值得格式化消息
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level() && !relock(&self.sinks).is_empty()
    }

    /// 记录一条日志
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if level < self.level() {
            return;
        }

        let mut record = Record::new(level, target, message);
        if self.spans_enabled.load(Ordering::Relaxed) {
            if let Some(span) = relock(&self.span_stack).last() {
                record = record.with_span(span.id.0);
            }
        }

        for sink in relock(&self.sinks).iter() {
            sink.write(&record);
        }
    }

    /// 进入一个新的 span，守卫析构时弹出
    pub fn enter_span(self: &Arc<Self>, name: &'static str) -> SpanGuard {
        let id = SpanId(self.next_span_id.fetch_add(1, Ordering::Relaxed));
        relock(&self.span_stack).push(Span::new(id, name));

        SpanGuard {
            logger: Arc::clone(self),
            id,
        }
    }

    /// 记录不再附带 span ID（span 栈仍然维护）
    pub fn disable_spans(&self) {
        self.spans_enabled.store(false, Ordering::Relaxed);
    }

    pub fn span_depth(&self) -> usize {
        relock(&self.span_stack).len()
    }

    /// 当前最内层 span 的名称
    pub fn current_span(&self) -> Option<&'static str> {
        relock(&self.span_stack).last().map(|span| span.name)
    }

    /// 不输出任何内容的日志器
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("sinks", &relock(&self.sinks).len())
            .field("span_depth", &self.span_depth())
            .finish()
    }
}

/// Span 守卫
pub struct SpanGuard {
    logger: Arc<Logger>,
    id: SpanId,
}

impl SpanGuard {
    pub fn id(&self) -> SpanId {
        self.id
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        let mut stack = relock(&self.logger.span_stack);
        if let Some(pos) = stack.iter().rposition(|span| span.id == self.id) {
            stack.truncate(pos);
        }
    }
}

// 父 logger 可以把另一个 logger 当作 sink 挂载
impl LogSink for Arc<Logger> {
    fn write(&self, record: &Record) {
        self.log(record.level, record.target, record.message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogRingBuffer;

    #[test]
    fn test_level_filtering() {
        let ring = LogRingBuffer::new(16);
        let logger = Logger::new(Level::Warn).with_sink(Arc::clone(&ring));

        logger.log(Level::Info, "test", "dropped");
        logger.log(Level::Error, "test", "kept");

        let records = ring.dump_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "kept");
    }

    #[test]
    fn test_noop_is_never_enabled() {
        let logger = Logger::noop();
        assert!(!logger.is_enabled(Level::Error));
    }

    #[test]
    fn test_set_level() {
        let logger = Logger::new(Level::Info).with_sink(LogRingBuffer::new(4));
        assert!(!logger.is_enabled(Level::Debug));
        logger.set_level(Level::Trace);
        assert!(logger.is_enabled(Level::Debug));
    }

    #[test]
    fn test_span_tags_records() {
        let ring = LogRingBuffer::new(16);
        let logger = Logger::new(Level::Trace).with_sink(Arc::clone(&ring));

        {
            let guard = logger.enter_span("compile");
            assert_eq!(logger.span_depth(), 1);
            assert_eq!(logger.current_span(), Some("compile"));
            logger.log(Level::Debug, "test", "inside");
            assert_eq!(ring.dump_records()[0].span_id, Some(guard.id().0));
        }

        assert_eq!(logger.span_depth(), 0);
        logger.log(Level::Debug, "test", "outside");
        assert_eq!(ring.dump_records()[1].span_id, None);
    }

    #[test]
    fn test_nested_logger_as_sink() {
        let ring = LogRingBuffer::new(16);
        let inner = Logger::new(Level::Trace).with_sink(Arc::clone(&ring));
        let outer = Logger::new(Level::Trace).with_sink(Arc::clone(&inner));

        outer.log(Level::Info, "gscript::vm", "forwarded");
        assert_eq!(ring.dump_records()[0].target, "gscript::vm");
    }
}
