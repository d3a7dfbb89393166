//! 诊断信息
//!
//! 词法和语法错误不会中断解析：它们被交给观察者，由调用方决定是否继续。

use super::source::{Pos, Range};
use gscript_log::{Level, Logger};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// 一条诊断
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diag {
    pub pos: Pos,
    pub range: Range,
    pub message: String,
    pub severity: Severity,
}

impl Diag {
    pub fn new(severity: Severity, pos: Pos, range: Range, message: impl Into<String>) -> Self {
        Self {
            pos,
            range,
            message: message.into(),
            severity,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// `error: 3@17: expected ';' got 'id'`（行号@字符偏移）
impl std::fmt::Display for Diag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}@{}: {}",
            self.severity.as_str(),
            self.pos.line,
            self.pos.offset,
            self.message
        )
    }
}

/// 诊断观察者
pub trait DiagObserver {
    fn observe(&mut self, diag: &Diag);
}

impl DiagObserver for Vec<Diag> {
    fn observe(&mut self, diag: &Diag) {
        self.push(diag.clone());
    }
}

impl<F: FnMut(&Diag)> DiagObserver for F {
    fn observe(&mut self, diag: &Diag) {
        self(diag)
    }
}

/// 诊断发射器：统计数量、写日志、转发给观察者
pub struct DiagBuilder<'o> {
    observer: &'o mut dyn DiagObserver,
    logger: Arc<Logger>,
    error_count: usize,
    warning_count: usize,
}

impl<'o> DiagBuilder<'o> {
    pub fn new(observer: &'o mut dyn DiagObserver) -> Self {
        Self::with_logger(observer, Logger::noop())
    }

    pub fn with_logger(observer: &'o mut dyn DiagObserver, logger: Arc<Logger>) -> Self {
        Self {
            observer,
            logger,
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn emit(&mut self, diag: Diag) {
        let level = match diag.severity {
            Severity::Info => Level::Info,
            Severity::Warning => {
                self.warning_count += 1;
                Level::Warn
            }
            Severity::Error => {
                self.error_count += 1;
                Level::Error
            }
        };
        gscript_log::log!(self.logger, level, target: "gscript::parser", "{}", diag);
        self.observer.observe(&diag);
    }

    pub fn info(&mut self, pos: Pos, range: Range, message: impl Into<String>) {
        self.emit(Diag::new(Severity::Info, pos, range, message));
    }

    pub fn warn(&mut self, pos: Pos, range: Range, message: impl Into<String>) {
        self.emit(Diag::new(Severity::Warning, pos, range, message));
    }

    pub fn error(&mut self, pos: Pos, range: Range, message: impl Into<String>) {
        self.emit(Diag::new(Severity::Error, pos, range, message));
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_counts_and_forwards() {
        let mut sink: Vec<Diag> = Vec::new();
        {
            let mut diag = DiagBuilder::new(&mut sink);
            diag.warn(Pos::start(), Range::default(), "expected end of file");
            diag.error(Pos::start(), Range::default(), "expected expression");
            diag.error(Pos::start(), Range::default(), "expected statement");
            assert_eq!(diag.error_count(), 2);
            assert_eq!(diag.warning_count(), 1);
        }
        assert_eq!(sink.len(), 3);
        assert_eq!(sink[0].severity, Severity::Warning);
        assert!(sink[2].is_error());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        let mut observer = |d: &Diag| seen.push(d.to_string());
        {
            let mut diag = DiagBuilder::new(&mut observer);
            let pos = Pos { offset: 17, line: 3, column: 5 };
            diag.error(pos, Range::at(pos), "expected ';' got 'id'");
        }
        assert_eq!(seen, vec!["error: 3@17: expected ';' got 'id'".to_string()]);
    }

    #[test]
    fn test_diag_serializes() {
        let d = Diag::new(Severity::Info, Pos::start(), Range::default(), "note");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "Info");
        assert_eq!(json["pos"]["line"], 1);
    }
}
