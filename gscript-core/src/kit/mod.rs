//! 通用基础设施：源码游标与诊断

pub mod diag;
pub mod source;
