//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use gscript_api::GscriptError;
use gscript_core::Diag;

/// 打印错误并显示源代码上下文
pub fn print_error_with_source(e: &GscriptError, source: Option<&str>) {
    eprintln!("❌ {}", e.to_report());

    if let (Some(source), Some(line), Some(column)) = (source, e.line(), e.column()) {
        print_source_context(source, line, column);
    }
}

/// 打印全部诊断，只给第一条 Error 附带源码上下文
pub fn print_diagnostics(diagnostics: &[Diag], source: &str) {
    let mut shown_context = false;
    for diag in diagnostics {
        eprintln!("{}", diag);
        if diag.is_error() && !shown_context {
            print_source_context(source, diag.pos.line, diag.pos.column);
            shown_context = true;
        }
    }
}

/// 打印源代码上下文（显示错误行前后几行）
pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    eprint!("{}", render_source_context(source, error_line, error_col));
}

fn render_source_context(source: &str, error_line: usize, error_col: usize) -> String {
    const CONTEXT_LINES: usize = 3;

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();
    if error_line == 0 || error_line > total_lines {
        return String::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);
    let width = end_line.to_string().len();

    let separator = "-".repeat(width + 1);
    let mut out = format!("{}|--\n", separator);

    for line_idx in start_line..=end_line {
        out.push_str(&format!("{:>width$} | {}\n", line_idx, lines[line_idx - 1], width = width));
        if line_idx == error_line {
            // 列号从 1 开始
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push_str(&format!("{} | {}^\n", " ".repeat(width), marker));
        }
    }

    out.push_str(&format!("{}|--\n", separator));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_error_column() {
        let source = "a = 1;\nb = ;\nc = 3;";
        let rendered = render_source_context(source, 2, 5);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "--|--");
        assert_eq!(lines[1], "1 | a = 1;");
        assert_eq!(lines[2], "2 | b = ;");
        assert_eq!(lines[3], "  |     ^");
        assert_eq!(lines[4], "3 | c = 3;");
        assert_eq!(lines[5], "--|--");
    }

    #[test]
    fn test_render_out_of_range_line() {
        assert!(render_source_context("a;", 0, 1).is_empty());
        assert!(render_source_context("a;", 5, 1).is_empty());
    }
}
