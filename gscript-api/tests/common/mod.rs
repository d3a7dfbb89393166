//! 测试辅助工具

#![allow(dead_code)]

use gscript_api::{run, ExecuteOutput, GscriptError, RunConfig};
use gscript_core::VarKind;

/// 用默认配置和演示库执行
pub fn run_code(code: &str) -> Result<ExecuteOutput, GscriptError> {
    run(code, &RunConfig::default())
}

pub fn number(output: &ExecuteOutput, name: &str) -> Option<f32> {
    output
        .context
        .get_variable(name, VarKind::Number)
        .and_then(|v| v.as_number())
}

pub fn flag(output: &ExecuteOutput, name: &str) -> Option<bool> {
    output
        .context
        .get_variable(name, VarKind::Flag)
        .and_then(|v| v.as_flag())
}

pub fn string(output: &ExecuteOutput, name: &str) -> Option<String> {
    output
        .context
        .get_variable(name, VarKind::String)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
