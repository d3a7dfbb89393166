//! 日志宏
//!
//! 级别未启用时不会格式化消息。默认 target 是调用处的 `module_path!()`，
//! 也可以用 `target: "..."` 显式指定。

/// 记录 Trace 级别日志
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)*)
    };
}

/// 记录 Debug 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)*)
    };
}

/// 记录 Info 级别日志
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)*)
    };
}

/// 记录 Warn 级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)*)
    };
}

/// 记录 Error 级别日志
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)*)
    };
}

/// 通用日志宏
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, target: $target:expr, $($arg:tt)*) => {{
        if $logger.is_enabled($level) {
            let message = ::std::format!($($arg)*);
            $logger.log($level, $target, message);
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)*) => {{
        if $logger.is_enabled($level) {
            let message = ::std::format!($($arg)*);
            $logger.log($level, module_path!(), message);
        }
    }};
}
