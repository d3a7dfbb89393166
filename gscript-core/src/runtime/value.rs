//! 运行时值与变量
//!
//! [`Value`] 是操作数栈上的元素。变量要么被拥有（`Owned`，常量字符串、
//! 数组字面量、未找到时合成的具名变量），要么只是对某个存储中变量的句柄
//! （`Borrowed`），在需要长期保存时通过 [`Context::to_owned_value`] 深拷贝。
//!
//! [`Context::to_owned_value`]: crate::runtime::vm::Context::to_owned_value

use serde::Serialize;

use super::store::{StoreSlot, VarKind};

/// 指向某个存储中某个变量的句柄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarHandle {
    pub store: StoreSlot,
    pub kind: VarKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Value {
    Number(f64),
    Flag(bool),
    Owned(Box<Variable>),
    Borrowed(VarHandle),
    #[default]
    Empty,
}

impl Value {
    pub fn number(n: impl Into<f64>) -> Self {
        Value::Number(n.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::Owned(Box::new(Variable::new(VariableData::String(text.into()))))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Owned(Box::new(Variable::new(VariableData::Array(values))))
    }

    pub fn variable(var: Variable) -> Self {
        Value::Owned(Box::new(var))
    }

    /// 值所携带的变量名（可作为赋值目标）
    pub fn name(&self) -> Option<&str> {
        match self {
            Value::Owned(var) => var.name.as_deref(),
            Value::Borrowed(handle) => Some(&handle.name),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Flag(_) => "flag",
            Value::Owned(var) => var.kind().as_str(),
            Value::Borrowed(handle) => handle.kind.as_str(),
            Value::Empty => "empty",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VariableData {
    Number(f32),
    Flag(bool),
    String(String),
    /// 元素不会是 `Borrowed`
    Array(Vec<Value>),
}

/// 运行时变量；种类在创建后不变
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: Option<String>,
    pub data: VariableData,
}

impl Variable {
    pub fn new(data: VariableData) -> Self {
        Self { name: None, data }
    }

    pub fn named(name: impl Into<String>, data: VariableData) -> Self {
        Self {
            name: Some(name.into()),
            data,
        }
    }

    /// 给定种类的未赋值变量
    pub fn unset(name: impl Into<String>, kind: VarKind) -> Self {
        let data = match kind {
            VarKind::Number => VariableData::Number(0.0),
            VarKind::Flag => VariableData::Flag(false),
            VarKind::String => VariableData::String(String::new()),
            VarKind::Array => VariableData::Array(Vec::new()),
        };
        Self::named(name, data)
    }

    pub fn kind(&self) -> VarKind {
        match self.data {
            VariableData::Number(_) => VarKind::Number,
            VariableData::Flag(_) => VarKind::Flag,
            VariableData::String(_) => VarKind::String,
            VariableData::Array(_) => VarKind::Array,
        }
    }

    /// 拷贝并改名
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            data: self.data.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self.data {
            VariableData::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self.data {
            VariableData::Flag(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            VariableData::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match &self.data {
            VariableData::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.data {
            VariableData::Array(values) => Some(values),
            _ => None,
        }
    }

    /// 调试输出
    pub fn debug_string(&self) -> String {
        match &self.data {
            VariableData::Number(n) => format!("Number: {}", n),
            VariableData::Flag(b) => format!("Flag: {}", b),
            VariableData::String(s) => format!("String: {:?}", s),
            VariableData::Array(values) => format!("Array: size {}", values.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_defaults() {
        assert_eq!(Variable::unset("a", VarKind::Number).data, VariableData::Number(0.0));
        assert_eq!(Variable::unset("a", VarKind::Flag).data, VariableData::Flag(false));
        assert_eq!(Variable::unset("a", VarKind::String).as_str(), Some(""));
        assert_eq!(Variable::unset("a", VarKind::Array).as_array().map(<[Value]>::len), Some(0));
    }

    #[test]
    fn test_renamed_is_deep_copy() {
        let original = Variable::named("a", VariableData::Array(vec![Value::Number(1.0)]));
        let mut copy = original.renamed("b");
        copy.as_array_mut().unwrap().push(Value::Number(2.0));

        assert_eq!(copy.name.as_deref(), Some("b"));
        assert_eq!(original.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_value_name() {
        assert_eq!(Value::Number(1.0).name(), None);
        assert_eq!(Value::string("x").name(), None);
        let named = Value::variable(Variable::unset("x", VarKind::Number));
        assert_eq!(named.name(), Some("x"));
        assert_eq!(named.type_name(), "number");
    }
}
