//! 操作数栈

use super::{Context, RuntimeError};
use crate::runtime::value::Value;

impl Context {
    /// 压栈；设置了 `max_stack_size` 且已满时报错
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if let Some(limit) = self.limits.max_stack_size {
            if self.stack.len() >= limit {
                return Err(RuntimeError::StackOverflow { limit });
            }
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// 弹出两个操作数，返回 (左, 右)
    pub(crate) fn pop_two(&mut self) -> Result<(Value, Value), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        Ok((left, right))
    }

    /// 弹出并按数字解释
    pub fn pop_number(&mut self) -> Result<f64, RuntimeError> {
        let value = self.pop()?;
        Ok(self.to_number(&value))
    }

    /// 弹出并按文本解释
    pub fn pop_string(&mut self) -> Result<String, RuntimeError> {
        let value = self.pop()?;
        Ok(self.to_text(&value))
    }

    /// 栈顶往下第 `distance` 个值
    pub fn peek(&self, distance: usize) -> Option<&Value> {
        self.stack.len().checked_sub(distance + 1).map(|i| &self.stack[i])
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gscript_config::LimitConfig;

    #[test]
    fn test_push_pop() {
        let mut ctx = Context::new();
        ctx.push(Value::Number(1.0)).unwrap();
        ctx.push(Value::Flag(true)).unwrap();

        assert_eq!(ctx.peek(0), Some(&Value::Flag(true)));
        assert_eq!(ctx.peek(1), Some(&Value::Number(1.0)));
        assert_eq!(ctx.peek(2), None);

        let (left, right) = ctx.pop_two().unwrap();
        assert_eq!(left, Value::Number(1.0));
        assert_eq!(right, Value::Flag(true));
        assert_eq!(ctx.pop(), Err(RuntimeError::StackUnderflow));
    }

    #[test]
    fn test_stack_limit() {
        let limits = LimitConfig {
            max_stack_size: Some(2),
            ..LimitConfig::default()
        };
        let mut ctx = Context::new().with_limits(limits);
        ctx.push(Value::Number(1.0)).unwrap();
        ctx.push(Value::Number(2.0)).unwrap();
        assert_eq!(
            ctx.push(Value::Number(3.0)),
            Err(RuntimeError::StackOverflow { limit: 2 })
        );
    }

    #[test]
    fn test_stack_unbounded_by_default() {
        let mut ctx = Context::new();
        for i in 0..5000 {
            ctx.push(Value::Number(i as f64)).unwrap();
        }
        assert_eq!(ctx.stack_len(), 5000);
    }
}
