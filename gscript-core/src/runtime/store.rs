//! 变量存储
//!
//! 每个存储按变量种类分为四个独立的库，查询总是带种类：同一个名字在数字库和
//! 字符串库里可以是两个不同的变量。写入总是整体替换对应槽位。

use std::collections::HashMap;

use serde::Serialize;

use super::value::{Value, Variable, VariableData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarKind {
    Number,
    Flag,
    String,
    Array,
}

impl VarKind {
    /// 按名字解析任意种类时的查找顺序
    pub const ANY_ORDER: [VarKind; 4] = [VarKind::Flag, VarKind::Number, VarKind::String, VarKind::Array];

    pub fn as_str(&self) -> &'static str {
        match self {
            VarKind::Number => "number",
            VarKind::Flag => "flag",
            VarKind::String => "string",
            VarKind::Array => "array",
        }
    }
}

/// 上下文中一个存储的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreSlot {
    /// 只读事件标志
    EventFlags,
    /// 按前缀挂载的存储，值为挂载顺序
    Linked(usize),
    Primary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarStore {
    numbers: HashMap<String, Variable>,
    flags: HashMap<String, Variable>,
    strings: HashMap<String, Variable>,
    arrays: HashMap<String, Variable>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bank(&self, kind: VarKind) -> &HashMap<String, Variable> {
        match kind {
            VarKind::Number => &self.numbers,
            VarKind::Flag => &self.flags,
            VarKind::String => &self.strings,
            VarKind::Array => &self.arrays,
        }
    }

    fn bank_mut(&mut self, kind: VarKind) -> &mut HashMap<String, Variable> {
        match kind {
            VarKind::Number => &mut self.numbers,
            VarKind::Flag => &mut self.flags,
            VarKind::String => &mut self.strings,
            VarKind::Array => &mut self.arrays,
        }
    }

    pub fn contains(&self, name: &str, kind: VarKind) -> bool {
        self.bank(kind).contains_key(name)
    }

    pub fn get(&self, name: &str, kind: VarKind) -> Option<&Variable> {
        self.bank(kind).get(name)
    }

    pub fn get_mut(&mut self, name: &str, kind: VarKind) -> Option<&mut Variable> {
        self.bank_mut(kind).get_mut(name)
    }

    /// 写入变量；进入与其种类对应的库，名字改为 `name`
    pub fn set(&mut self, name: &str, mut var: Variable) {
        var.name = Some(name.to_string());
        self.bank_mut(var.kind()).insert(name.to_string(), var);
    }

    pub fn remove(&mut self, name: &str, kind: VarKind) -> Option<Variable> {
        self.bank_mut(kind).remove(name)
    }

    pub fn set_number(&mut self, name: &str, n: f32) {
        self.set(name, Variable::new(VariableData::Number(n)));
    }

    pub fn set_flag(&mut self, name: &str, b: bool) {
        self.set(name, Variable::new(VariableData::Flag(b)));
    }

    pub fn set_string(&mut self, name: &str, s: impl Into<String>) {
        self.set(name, Variable::new(VariableData::String(s.into())));
    }

    pub fn set_array(&mut self, name: &str, values: Vec<Value>) {
        self.set(name, Variable::new(VariableData::Array(values)));
    }

    pub fn number(&self, name: &str) -> Option<f32> {
        self.get(name, VarKind::Number).and_then(Variable::as_number)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name, VarKind::Flag).and_then(Variable::as_flag)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name, VarKind::String).and_then(Variable::as_str)
    }

    pub fn array(&self, name: &str) -> Option<&[Value]> {
        self.get(name, VarKind::Array).and_then(Variable::as_array)
    }

    /// 四个库中的变量总数
    pub fn len(&self) -> usize {
        self.numbers.len() + self.flags.len() + self.strings.len() + self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 某个库中的全部名字（无序）
    pub fn names(&self, kind: VarKind) -> impl Iterator<Item = &str> {
        self.bank(kind).keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
        self.flags.clear();
        self.strings.clear();
        self.arrays.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banks_are_independent() {
        let mut store = VarStore::new();
        store.set_number("x", 1.0);
        store.set_string("x", "hello");

        assert_eq!(store.number("x"), Some(1.0));
        assert_eq!(store.string("x"), Some("hello"));
        assert_eq!(store.flag("x"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_set_replaces_and_renames() {
        let mut store = VarStore::new();
        store.set_number("x", 1.0);
        store.set("x", Variable::named("other", VariableData::Number(2.0)));

        let var = store.get("x", VarKind::Number).unwrap();
        assert_eq!(var.name.as_deref(), Some("x"));
        assert_eq!(var.as_number(), Some(2.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = VarStore::new();
        store.set_flag("f", true);
        assert!(store.contains("f", VarKind::Flag));
        assert!(store.remove("f", VarKind::Flag).is_some());
        assert!(store.is_empty());
    }
}
