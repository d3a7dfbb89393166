//! 内置输出目标

use crate::logger::LogSink;
use crate::record::{Level, Record};
use std::io::Write;
use std::sync::Mutex;

/// 标准输出
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, record: &Record) {
        println!("{}", record.format());
    }
}

/// 标准错误
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{}", record.format());
    }
}

/// 文件（追加模式）
pub struct FileSink {
    file: Mutex<std::fs::File>,
}

impl FileSink {
    pub fn new(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(FileSink {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    #[inline(never)]
    fn write(&self, record: &Record) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", record.format());
        }
    }
}

/// 转发到 `tracing`
///
/// `tracing` 的 target 必须是编译期常量，所以记录的 target 作为字段携带，
/// 事件本身挂在 `gscript` target 下。
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        let target = record.target;
        let span = record.span_id.unwrap_or(0);
        match record.level {
            Level::Trace => tracing::trace!(target: "gscript", source = target, span, "{}", record.message),
            Level::Debug => tracing::debug!(target: "gscript", source = target, span, "{}", record.message),
            Level::Info => tracing::info!(target: "gscript", source = target, span, "{}", record.message),
            Level::Warn => tracing::warn!(target: "gscript", source = target, span, "{}", record.message),
            Level::Error => tracing::error!(target: "gscript", source = target, span, "{}", record.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_appends() {
        let path = std::env::temp_dir().join(format!("gscript-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let sink = FileSink::new(&path).unwrap();
        sink.write(&Record::new(Level::Info, "test", "first"));
        sink.write(&Record::new(Level::Warn, "test", "second"));
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO test: first"));
        assert!(content.contains("WARN test: second"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_sink_bad_path() {
        let result = FileSink::new("/definitely/not/a/dir/gscript.log");
        assert!(result.is_err());
    }
}
