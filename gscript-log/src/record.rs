//! 日志记录定义

use std::fmt;
use std::str::FromStr;

/// 日志级别
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    /// 将级别转换为字符串
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// 从u8解析级别
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            _ => Err(crate::Error::UnknownLevel(s.to_string())),
        }
    }
}

/// 单条日志记录
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Unix 时间戳（毫秒）
    pub timestamp_ms: u64,
    pub level: Level,
    /// 模块路径或阶段 target（如 `gscript::vm`）
    pub target: &'static str,
    pub message: String,
    /// 记录产生时最内层 span 的 ID
    pub span_id: Option<u64>,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms: current_timestamp_ms(),
            level,
            target,
            message: message.into(),
            span_id: None,
        }
    }

    pub fn with_span(mut self, span_id: u64) -> Self {
        self.span_id = Some(span_id);
        self
    }

    /// 格式化为 `[hh:mm:ss.mmm] LEVEL target [span=N]: message`
    pub fn format(&self) -> String {
        let span_info = match self.span_id {
            Some(id) => format!(" [span={id}]"),
            None => String::new(),
        };

        format!(
            "[{}] {} {}{}: {}",
            format_timestamp(self.timestamp_ms),
            self.level,
            self.target,
            span_info,
            self.message
        )
    }
}

fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn format_timestamp(timestamp_ms: u64) -> String {
    let secs = timestamp_ms / 1000;
    let millis = timestamp_ms % 1000;

    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
