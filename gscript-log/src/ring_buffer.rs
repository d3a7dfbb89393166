//! 日志专用环形缓冲区

use crate::logger::LogSink;
use crate::record::{Level, Record};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 环形缓冲区统计信息
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RingBufferStats {
    pub record_count: usize,
    /// 因缓冲区满而被覆盖的记录数
    pub dropped_count: usize,
    pub capacity: usize,
}

/// 日志环形缓冲区
///
/// 满了以后新记录覆盖最旧的记录。测试里用它断言脚本输出和告警。
pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            dropped: AtomicUsize::new(0),
        })
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<Record>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, record: Record) {
        let mut inner = self.records();
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
    }

    /// 按时间顺序返回所有记录
    pub fn dump_records(&self) -> Vec<Record> {
        self.records().iter().cloned().collect()
    }

    /// 指定 target 下的消息文本
    pub fn messages(&self, target: &str) -> Vec<String> {
        self.records()
            .iter()
            .filter(|r| r.target == target)
            .map(|r| r.message.clone())
            .collect()
    }

    /// 不低于指定级别的消息文本
    pub fn messages_at_least(&self, level: Level) -> Vec<String> {
        self.records()
            .iter()
            .filter(|r| r.level >= level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// 转储为多行文本（崩溃转储用）
    pub fn dump(&self) -> String {
        self.records()
            .iter()
            .map(|r| r.format())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.records().clear();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RingBufferStats {
        RingBufferStats {
            record_count: self.len(),
            dropped_count: self.dropped_count(),
            capacity: self.capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for LogRingBuffer {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Logger;

    #[test]
    fn test_overwrite_oldest() {
        let ring = LogRingBuffer::new(3);
        for i in 0..5 {
            ring.write(&Record::new(Level::Info, "test", format!("msg {i}")));
        }

        let records = ring.dump_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "msg 2");
        assert_eq!(records[2].message, "msg 4");
        assert_eq!(ring.dropped_count(), 2);
    }

    #[test]
    fn test_stats_and_clear() {
        let ring = LogRingBuffer::new(10);
        ring.write(&Record::new(Level::Debug, "test", "a"));
        ring.write(&Record::new(Level::Debug, "test", "b"));

        assert_eq!(
            ring.stats(),
            RingBufferStats {
                record_count: 2,
                dropped_count: 0,
                capacity: 10,
            }
        );

        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.stats().record_count, 0);
    }

    #[test]
    fn test_messages_by_target() {
        let ring = LogRingBuffer::new(10);
        let logger = Logger::new(Level::Trace).with_sink(Arc::clone(&ring));

        logger.log(Level::Info, "gscript::output", "hello");
        logger.log(Level::Debug, "gscript::vm", "push 1");
        logger.log(Level::Warn, "gscript::vm", "index out of range");

        assert_eq!(ring.messages("gscript::output"), vec!["hello".to_string()]);
        assert_eq!(ring.messages("gscript::vm").len(), 2);
        assert_eq!(
            ring.messages_at_least(Level::Warn),
            vec!["index out of range".to_string()]
        );
    }

    #[test]
    fn test_dump_joins_lines() {
        let ring = LogRingBuffer::new(4);
        ring.write(&Record::new(Level::Info, "a", "one"));
        ring.write(&Record::new(Level::Info, "b", "two"));

        let dump = ring.dump();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("INFO a: one"));
    }
}
