//! 值的强制转换与运算

use super::Context;
use crate::runtime::bytecode::Opcode;
use crate::runtime::value::{Value, VariableData};

impl Context {
    /// 数字解释：数字 → 自身，标志 → 1/0，数字变量 → 其值，其余 → NaN
    pub fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Flag(b) => f64::from(u8::from(*b)),
            Value::Owned(_) | Value::Borrowed(_) => match self.resolve(value).map(|v| &v.data) {
                Some(VariableData::Number(n)) => f64::from(*n),
                _ => f64::NAN,
            },
            Value::Empty => f64::NAN,
        }
    }

    /// 标志解释：标志 → 自身，数字 → 非零，标志/数字变量同理，其余 → false
    pub fn to_flag(&self, value: &Value) -> bool {
        match value {
            Value::Flag(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Owned(_) | Value::Borrowed(_) => match self.resolve(value).map(|v| &v.data) {
                Some(VariableData::Flag(b)) => *b,
                Some(VariableData::Number(n)) => *n != 0.0,
                _ => false,
            },
            Value::Empty => false,
        }
    }

    /// 文本解释：字符串变量 → 其内容，其余 → 空
    pub fn to_text(&self, value: &Value) -> String {
        self.resolve(value)
            .and_then(|var| var.as_str())
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn as_text<'a>(&'a self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::Owned(_) | Value::Borrowed(_) => self.resolve(value)?.as_str(),
            _ => None,
        }
    }

    /// 调试描述
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Number(n) => format!("Number: {}", n),
            Value::Flag(b) => format!("Flag: {}", b),
            Value::Empty => "Empty".to_string(),
            Value::Owned(_) | Value::Borrowed(_) => {
                let name = value.name().unwrap_or("<anonymous>");
                match self.resolve(value) {
                    Some(var) => format!("{} ({})", var.debug_string(), name),
                    None => format!("<dangling> ({})", name),
                }
            }
        }
    }

    /// 算术运算
    pub(crate) fn arithmetic(&self, op: Opcode, left: &Value, right: &Value) -> f64 {
        let a = self.to_number(left);
        let b = self.to_number(right);
        match op {
            Opcode::Add => a + b,
            Opcode::Sub => a - b,
            Opcode::Mul => a * b,
            Opcode::Div => a / b,
            Opcode::Mod => a % b,
            Opcode::Pow => a.powf(b),
            _ => f64::NAN,
        }
    }

    /// 比较运算；相等比较在两边都是字符串时比较文本
    pub(crate) fn compare(&self, op: Opcode, left: &Value, right: &Value) -> bool {
        if op == Opcode::Eq {
            if let (Some(a), Some(b)) = (self.as_text(left), self.as_text(right)) {
                return a == b;
            }
        }

        let a = self.to_number(left);
        let b = self.to_number(right);
        match op {
            Opcode::Eq => a == b,
            Opcode::Lt => a < b,
            Opcode::Gt => a > b,
            Opcode::Lte => a <= b,
            Opcode::Gte => a >= b,
            _ => false,
        }
    }
}
