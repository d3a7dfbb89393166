//! GScript API - 编译与执行的编排层
//!
//! 提供统一的入口：
//! - 从字符串或文件编译（需要命令/函数原型表）
//! - 加载字节码容器
//! - 链接演示库并执行
//! - 统一错误类型（GscriptError）
//!
//! CLI 可以使用全局配置；作为库使用时请显式传入 `RunConfig`。

use std::path::Path;
use std::sync::Arc;

use gscript_core::{
    Compiler, Context, Diag, FileSource, Lexer, MemorySource, Parser, Program, Source, SyntaxTree,
};
use gscript_log::{debug, info};

pub mod config;
pub mod error;
pub mod libraries;
pub mod types;

pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};
pub use error::{ErrorReport, GscriptError};
pub use libraries::{default_commands, default_functions, default_libraries, OutputBuffer};
pub use types::{CompileOutput, ExecuteOutput};

pub use gscript_config::{CompilerConfig, LimitConfig, Phase};
pub use gscript_core::{PrototypeMap, Value, VarStore};

// ==================== 编译 ====================

/// 从字符串编译；语法诊断收集在输出里，不会中断编译
pub fn compile_str(
    source: &str,
    commands: &PrototypeMap,
    functions: &PrototypeMap,
    config: &RunConfig,
) -> Result<CompileOutput, GscriptError> {
    let mut source = MemorySource::new(source);
    compile_source(&mut source, commands, functions, config)
}

/// 从文件编译
pub fn compile_file(
    path: impl AsRef<Path>,
    commands: &PrototypeMap,
    functions: &PrototypeMap,
    config: &RunConfig,
) -> Result<CompileOutput, GscriptError> {
    let mut source = FileSource::open(path)?;
    compile_source(&mut source, commands, functions, config)
}

/// 同 [`compile_str`]，但第一条 Error 级别诊断会变成错误
pub fn compile_str_strict(
    source: &str,
    commands: &PrototypeMap,
    functions: &PrototypeMap,
    config: &RunConfig,
) -> Result<CompileOutput, GscriptError> {
    compile_str(source, commands, functions, config).and_then(reject_diagnostics)
}

/// 同 [`compile_file`]，但第一条 Error 级别诊断会变成错误
pub fn compile_file_strict(
    path: impl AsRef<Path>,
    commands: &PrototypeMap,
    functions: &PrototypeMap,
    config: &RunConfig,
) -> Result<CompileOutput, GscriptError> {
    compile_file(path, commands, functions, config).and_then(reject_diagnostics)
}

fn reject_diagnostics(output: CompileOutput) -> Result<CompileOutput, GscriptError> {
    match output.diagnostics.iter().find(|d| d.is_error()) {
        Some(diag) => Err(GscriptError::Diagnostics(diag.clone())),
        None => Ok(output),
    }
}

fn compile_source(
    source: &mut dyn Source,
    commands: &PrototypeMap,
    functions: &PrototypeMap,
    config: &RunConfig,
) -> Result<CompileOutput, GscriptError> {
    let logger = &config.logger;
    info!(logger, target: "gscript::compiler", "compiling {}", source.name());

    let mut diagnostics: Vec<Diag> = Vec::new();
    let mut tree: SyntaxTree = {
        let lexer = Lexer::with_logger(source, Arc::clone(logger));
        Parser::with_logger(lexer, &mut diagnostics, commands, functions, Arc::clone(logger)).parse()
    };

    let bytes = Compiler::with_config(config.compiler.clone(), Arc::clone(logger)).compile(&mut tree)?;
    let program = Program::from_bytes(&bytes)?;

    if config.dump_bytecode {
        debug!(logger, target: "gscript::compiler", "bytecode:\n{}", program.disassemble());
    }
    debug!(
        logger,
        target: "gscript::compiler",
        "compiled: strings={}, numbers={}, body={} bytes, diagnostics={}",
        program.strings().len(),
        program.numbers().len(),
        program.body().len(),
        diagnostics.len()
    );

    Ok(CompileOutput {
        bytes,
        program,
        diagnostics,
        tree,
    })
}

// ==================== 加载与执行 ====================

/// 加载字节码容器
pub fn load(bytes: &[u8]) -> Result<Program, GscriptError> {
    Ok(Program::from_bytes(bytes)?)
}

/// 按配置创建上下文并链接全部演示库
pub fn new_context(config: &RunConfig, output: OutputBuffer) -> Context {
    let mut ctx = Context::with_logger(Arc::clone(&config.logger)).with_limits(config.limits.clone());
    ctx.set_trace_steps(config.show_steps);
    for library in default_libraries(output) {
        ctx.link_library(library);
    }
    ctx
}

/// 在演示库环境中执行一个已加载的程序
pub fn execute(program: Program, config: &RunConfig) -> Result<ExecuteOutput, GscriptError> {
    let output = OutputBuffer::default();
    let mut context = new_context(config, Arc::clone(&output));
    context.link_program(Arc::new(program));

    info!(config.logger, target: "gscript::vm", "starting execution");
    context.run(None)?;
    info!(config.logger, target: "gscript::vm", "execution completed");

    let output = output.lock().map(|lines| lines.clone()).unwrap_or_default();
    Ok(ExecuteOutput { context, output })
}

/// 用演示库的原型表编译并执行
pub fn run(source: &str, config: &RunConfig) -> Result<ExecuteOutput, GscriptError> {
    let compiled = compile_str_strict(source, &default_commands(), &default_functions(), config)?;
    tracing::debug!(target: "gscript::api", bytes = compiled.bytes.len(), "compiled source");
    execute(compiled.program, config)
}

/// 使用全局配置执行（未初始化时使用默认配置）
pub fn quick_run(source: &str) -> Result<ExecuteOutput, GscriptError> {
    run(source, get_config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_explicit_config() {
        let result = run("x = 40 + 2; message x=#v(x);", &RunConfig::default()).unwrap();
        assert_eq!(result.output, vec!["x=42"]);
        assert_eq!(result.context.primary_store().number("x"), Some(42.0));
    }

    #[test]
    fn test_quick_run() {
        assert!(quick_run("print ok;").is_ok());
    }

    #[test]
    fn test_lenient_compile_keeps_diagnostics() {
        let config = RunConfig::default();
        let output = compile_str("a = 1", &PrototypeMap::new(), &PrototypeMap::new(), &config).unwrap();
        assert!(output.has_errors());
        assert!(!output.program.body().is_empty());

        let err = compile_str_strict("a = 1", &PrototypeMap::new(), &PrototypeMap::new(), &config).unwrap_err();
        assert_eq!(err.phase(), "parser");
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load(&[1, 2]), Err(GscriptError::Load(_))));
    }
}
