//! 字符串插值
//!
//! 文本中的 `#v(name)`、`#s(name)`、`#e(start, len, text)` 由 [`StringFormatter`]
//! 展开。扫描是单遍的：参数只做括号配对，不会在参数内部递归展开
//! （`#e` 的 `text` 部分由格式化器自己再插值一次）。

use super::Context;
use crate::runtime::store::VarKind;

/// 可替换的格式化器
pub trait StringFormatter: Send + Sync {
    /// `spec` 是 `#` 后的格式字符，`param` 是括号内的原始文本（没有括号时为空）
    fn format(&self, ctx: &Context, spec: char, param: &str) -> String;
}

/// 格式字符是否由格式化器处理
fn is_spec(c: char) -> bool {
    matches!(c, 'v' | 's' | 'e')
}

/// 扫描并展开文本
pub fn interpolate(ctx: &Context, formatter: &dyn StringFormatter, text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        if c != '#' || i + 1 >= len || !is_spec(chars[i + 1]) {
            out.push(c);
            i += 1;
            continue;
        }

        let spec = chars[i + 1];
        let after_spec = i + 2;

        let mut open = after_spec;
        while open < len && chars[open] == ' ' {
            open += 1;
        }

        let param: String;
        if open < len && chars[open] == '(' {
            let start = open + 1;
            let mut depth = 1;
            let mut end = start;
            while end < len {
                match chars[end] {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                end += 1;
            }
            param = chars[start..end].iter().collect();
            // 未配对时参数延伸到结尾
            i = (end + 1).min(len);
        } else {
            param = String::new();
            i = after_spec;
        }

        out.push_str(&formatter.format(ctx, spec, &param));
    }

    out
}

/// 默认格式化器
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl StringFormatter for DefaultFormatter {
    fn format(&self, ctx: &Context, spec: char, param: &str) -> String {
        match spec {
            'v' => ctx
                .get_variable(param.trim(), VarKind::Number)
                .and_then(|var| var.as_number())
                .map(|n| format_number(n as f64))
                .unwrap_or_default(),
            's' => ctx
                .get_variable(param.trim(), VarKind::String)
                .and_then(|var| var.as_str())
                .map(str::to_string)
                .unwrap_or_default(),
            'e' => substring(ctx, param).unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// `start, len, text`：先展开 text，再按字符截取
fn substring(ctx: &Context, param: &str) -> Option<String> {
    let mut parts = param.splitn(3, ',');
    let start: usize = parts.next()?.trim().parse().ok()?;
    let count: usize = parts.next()?.trim().parse().ok()?;
    let text = ctx.interpolate(parts.next()?.trim_start());

    Some(text.chars().skip(start).take(count).collect())
}

/// 与 C 的 `%.6g` 相同的数字格式
pub fn format_number(n: f64) -> String {
    const PRECISION: i32 = 6;

    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // 先按有效位数舍入，再决定记数法
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::store::VarStore;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1234567.0), "1.23457e+06");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(999999.5), "1e+06");
        assert_eq!(format_number(f64::NAN), "nan");
    }

    fn context() -> Context {
        let mut store = VarStore::new();
        store.set_number("hp", 42.0);
        store.set_string("name", "Alice");
        store.set_string("nested", "#s(name)!");
        let mut ctx = Context::new();
        *ctx.primary_store_mut() = store;
        ctx
    }

    #[test]
    fn test_interpolate_specifiers() {
        let ctx = context();
        assert_eq!(ctx.interpolate("hp=#v(hp)"), "hp=42");
        assert_eq!(ctx.interpolate("hi #s(name)."), "hi Alice.");
        assert_eq!(ctx.interpolate("#s(missing)|#v(missing)"), "|");
        // 格式字符与括号之间允许空格
        assert_eq!(ctx.interpolate("#s  (name)"), "Alice");
    }

    #[test]
    fn test_interpolate_literals() {
        let ctx = context();
        assert_eq!(ctx.interpolate("#x #"), "#x #");
        assert_eq!(ctx.interpolate("##s(name)"), "#Alice");
        // 没有括号时参数为空，后面的字符原样保留
        assert_eq!(ctx.interpolate("#s name"), " name");
        // 未配对的括号延伸到结尾
        assert_eq!(ctx.interpolate("a #s(name"), "a Alice");
    }

    #[test]
    fn test_interpolate_substring() {
        let ctx = context();
        assert_eq!(ctx.interpolate("#e(0, 3, #s(name))"), "Ali");
        assert_eq!(ctx.interpolate("#e(3,10,#s(name))"), "ce");
        assert_eq!(ctx.interpolate("#e(1,2,héllo)"), "él");
        assert_eq!(ctx.interpolate("[#e(x,1,abc)]"), "[]");
        assert_eq!(ctx.interpolate("[#e(1,abc)]"), "[]");
        // 字符串变量本身不会被再次展开
        assert_eq!(ctx.interpolate("#s(nested)"), "#s(name)!");
    }
}
