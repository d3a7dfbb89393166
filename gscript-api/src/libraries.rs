//! 演示库
//!
//! 四个小库覆盖最常见的宿主接口：标志、字符串、输出和数组。
//! 命令/函数的参数按编译器压栈的顺序倒序弹出。

use std::sync::{Arc, Mutex};

use gscript_core::{Context, Library, PrototypeMap, RuntimeError, Value, VarKind, Variable, VariableData};
use gscript_log::{debug, info};

/// 输出库收集的文本行
pub type OutputBuffer = Arc<Mutex<Vec<String>>>;

/// `set <name>;` `unset <name>;` `setplayerprop <name>, <value>;`
pub fn flag_library() -> Library {
    Library::new("flag")
        .with_command("set", |ctx: &mut Context| {
            let name = ctx.pop_string()?;
            ctx.set_variable(&name, Variable::new(VariableData::Flag(true)));
            Ok(())
        })
        .with_command("unset", |ctx: &mut Context| {
            let name = ctx.pop_string()?;
            ctx.set_variable(&name, Variable::new(VariableData::Flag(false)));
            Ok(())
        })
        .with_command("setplayerprop", |ctx: &mut Context| {
            let value = ctx.pop_string()?;
            let name = ctx.pop_string()?;
            debug!(ctx.logger(), target: "gscript::vm", "setting player prop {} = {}", name, value);
            Ok(())
        })
}

/// `setstring <name>, <text>;` `addstring <name>, <text>;` `strtofloat(<text>)`
pub fn string_library() -> Library {
    Library::new("string")
        .with_command("setstring", |ctx: &mut Context| {
            let text = ctx.pop_string()?;
            let text = ctx.interpolate(&text);
            let name = ctx.pop_string()?;

            debug!(ctx.logger(), target: "gscript::vm", "setstring {}={}", name, text);
            ctx.set_variable(&name, Variable::new(VariableData::String(text)));
            Ok(())
        })
        .with_command("addstring", |ctx: &mut Context| {
            let text = ctx.pop_string()?;
            let text = ctx.interpolate(&text);
            let name = ctx.pop_string()?;

            let mut joined = ctx
                .get_variable(&name, VarKind::String)
                .and_then(Variable::as_str)
                .unwrap_or_default()
                .to_string();
            joined.push_str(&text);

            debug!(ctx.logger(), target: "gscript::vm", "addstring {}={}", name, joined);
            ctx.set_variable(&name, Variable::new(VariableData::String(joined)));
            Ok(())
        })
        .with_function("strtofloat", |ctx: &mut Context| {
            let text = ctx.pop_string()?;
            let text = ctx.interpolate(&text);
            ctx.push(Value::Number(parse_leading_float(&text).unwrap_or(0.0)))
        })
}

/// `message <text>;` `print <text>;`：插值后写入缓冲区并以 Info 级别记录
pub fn output_library(buffer: OutputBuffer) -> Library {
    let write = move |ctx: &mut Context| -> Result<(), RuntimeError> {
        let text = ctx.pop_string()?;
        let line = ctx.interpolate(&text);
        info!(ctx.logger(), target: "gscript::output", "{}", line);

        let mut lines = buffer
            .lock()
            .map_err(|_| RuntimeError::library("output", "output buffer poisoned"))?;
        lines.push(line);
        Ok(())
    };
    let write = Arc::new(write);
    let message = Arc::clone(&write);

    Library::new("output")
        .with_command("message", move |ctx: &mut Context| (*message)(ctx))
        .with_command("print", move |ctx: &mut Context| (*write)(ctx))
}

/// `arraylen(<array>)`：不是数组时为 0
pub fn array_library() -> Library {
    Library::new("array").with_function("arraylen", |ctx: &mut Context| {
        let value = ctx.pop()?;
        let len = ctx
            .resolve(&value)
            .and_then(Variable::as_array)
            .map_or(0, <[Value]>::len);
        ctx.push(Value::Number(len as f64))
    })
}

/// 按固定顺序返回全部演示库
pub fn default_libraries(buffer: OutputBuffer) -> Vec<Arc<Library>> {
    vec![
        Arc::new(flag_library()),
        Arc::new(string_library()),
        Arc::new(output_library(buffer)),
        Arc::new(array_library()),
    ]
}

/// 演示库命令的参数原型
pub fn default_commands() -> PrototypeMap {
    let mut commands = PrototypeMap::new();
    commands.insert("message".to_string(), vec![true]);
    commands.insert("print".to_string(), vec![true]);
    commands.insert("set".to_string(), vec![true]);
    commands.insert("unset".to_string(), vec![true]);
    commands.insert("setplayerprop".to_string(), vec![true, true]);
    commands.insert("setstring".to_string(), vec![true, true]);
    commands.insert("addstring".to_string(), vec![true, true]);
    commands
}

/// 演示库函数的参数原型
pub fn default_functions() -> PrototypeMap {
    let mut functions = PrototypeMap::new();
    functions.insert("strtofloat".to_string(), vec![true]);
    functions.insert("arraylen".to_string(), vec![false]);
    functions
}

/// 解析开头的浮点数，忽略后面的字符
fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &text[digits_start..end] == "." {
        return None;
    }

    // 指数部分不完整时不计入
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }

    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("3.5"), Some(3.5));
        assert_eq!(parse_leading_float("  -2abc"), Some(-2.0));
        assert_eq!(parse_leading_float("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_float("7e"), Some(7.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float(""), None);
    }

    #[test]
    fn test_prototypes_cover_libraries() {
        let buffer = OutputBuffer::default();
        let libraries = default_libraries(buffer);
        let commands = default_commands();
        let functions = default_functions();

        for library in &libraries {
            for name in library.command_names() {
                assert!(commands.contains_key(name), "missing prototype for {}", name);
            }
            for name in library.function_names() {
                assert!(functions.contains_key(name), "missing prototype for {}", name);
            }
        }
    }
}
