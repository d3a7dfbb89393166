//! 宿主库：按名字注册的命令和函数回调

use std::fmt;

use super::{Context, RuntimeError};

/// 命令/函数回调
///
/// 回调自己按编译器压栈的顺序弹出参数；函数还需要压入一个结果。
pub type CommandFn = Box<dyn Fn(&mut Context) -> Result<(), RuntimeError> + Send + Sync>;

/// 一组命令和函数；多个库按链接顺序查找，先匹配者生效
pub struct Library {
    name: String,
    commands: Vec<(String, CommandFn)>,
    functions: Vec<(String, CommandFn)>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_command<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Context) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.commands.push((name.into(), Box::new(handler)));
    }

    pub fn add_function<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Context) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.functions.push((name.into(), Box::new(handler)));
    }

    pub fn with_command<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.add_command(name, handler);
        self
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.add_function(name, handler);
        self
    }

    pub fn command(&self, name: &str) -> Option<&CommandFn> {
        self.commands.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn function(&self, name: &str) -> Option<&CommandFn> {
        self.functions.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(n, _)| n.as_str())
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(n, _)| n.as_str())
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("commands", &self.command_names().collect::<Vec<_>>())
            .field("functions", &self.function_names().collect::<Vec<_>>())
            .finish()
    }
}
