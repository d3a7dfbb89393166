//! 测试辅助工具
//!
//! 提供源码到执行结果的端到端辅助函数

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use gscript_core::{
    Compiler, Context, Diag, Lexer, Library, MemorySource, Parser, Program, PrototypeMap,
    RuntimeError, SyntaxTree,
};

/// 端到端执行失败的阶段
#[derive(Debug)]
pub enum ExecError {
    Parser(Vec<Diag>),
    Compiler(String),
    Runtime(RuntimeError),
}

/// 测试库的命令原型：参数是否按原始字符串扫描
pub fn prototypes() -> PrototypeMap {
    let mut commands = PrototypeMap::new();
    commands.insert("setstring".to_string(), vec![true, true]);
    commands.insert("message".to_string(), vec![true]);
    commands
}

pub fn parse(code: &str) -> (SyntaxTree, Vec<Diag>) {
    let mut source = MemorySource::new(code);
    let mut diags: Vec<Diag> = Vec::new();
    let commands = prototypes();
    let functions = PrototypeMap::new();
    let tree = {
        let lexer = Lexer::new(&mut source);
        Parser::new(lexer, &mut diags, &commands, &functions).parse()
    };
    (tree, diags)
}

/// 解析 + 编译，返回容器字节
pub fn compile_bytes(code: &str) -> Result<Vec<u8>, ExecError> {
    let (mut tree, diags) = parse(code);
    if diags.iter().any(Diag::is_error) {
        return Err(ExecError::Parser(diags));
    }
    Compiler::new()
        .compile(&mut tree)
        .map_err(|e| ExecError::Compiler(e.to_string()))
}

pub fn compile(code: &str) -> Result<Program, ExecError> {
    let bytes = compile_bytes(code)?;
    Ok(Program::from_bytes(&bytes).expect("container written by the compiler must load"))
}

/// 在新上下文中执行代码
pub fn run_code(code: &str) -> Result<Context, ExecError> {
    run_in(Context::new(), code)
}

/// 在给定上下文中链接并执行代码
pub fn run_in(mut ctx: Context, code: &str) -> Result<Context, ExecError> {
    let program = compile(code)?;
    ctx.link_program(Arc::new(program));
    ctx.run(None).map_err(ExecError::Runtime)?;
    Ok(ctx)
}

/// 链接测试库后执行，返回上下文和 `message` 的输出
pub fn run_with_output(code: &str) -> Result<(Context, Vec<String>), ExecError> {
    let (library, output) = test_library();
    let mut ctx = Context::new();
    ctx.link_library(Arc::new(library));
    let ctx = run_in(ctx, code)?;
    let lines = output.lock().expect("output lock").clone();
    Ok((ctx, lines))
}

/// `setstring name, text;` 与 `message text;`
pub fn test_library() -> (Library, Arc<Mutex<Vec<String>>>) {
    let output = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&output);

    let library = Library::new("test")
        .with_command("setstring", |ctx: &mut Context| {
            let text = ctx.pop_string()?;
            let name = ctx.pop_string()?;
            let text = ctx.interpolate(&text);
            ctx.set_variable(
                &name,
                gscript_core::Variable::new(gscript_core::VariableData::String(text)),
            );
            Ok(())
        })
        .with_command("message", move |ctx: &mut Context| {
            let text = ctx.pop_string()?;
            let line = ctx.interpolate(&text);
            if let Ok(mut lines) = sink.lock() {
                lines.push(line);
            }
            Ok(())
        });

    (library, output)
}

pub fn number(ctx: &Context, name: &str) -> Option<f32> {
    ctx.get_variable(name, gscript_core::VarKind::Number)
        .and_then(|v| v.as_number())
}

pub fn flag(ctx: &Context, name: &str) -> Option<bool> {
    ctx.get_variable(name, gscript_core::VarKind::Flag)
        .and_then(|v| v.as_flag())
}

pub fn string(ctx: &Context, name: &str) -> Option<String> {
    ctx.get_variable(name, gscript_core::VarKind::String)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
