//! 变量路由
//!
//! 读取顺序：事件标志 → 前缀匹配的挂载存储（按挂载顺序）→ 主存储。
//! 写入：第一个前缀匹配的挂载存储，否则主存储；事件标志永远不写。

use super::Context;
use crate::kit::source::has_prefix;
use crate::runtime::store::{StoreSlot, VarKind, VarStore};
use crate::runtime::value::{Value, VarHandle, Variable, VariableData};

impl Context {
    fn store(&self, slot: StoreSlot) -> Option<&VarStore> {
        match slot {
            StoreSlot::EventFlags => self.event_flags.as_deref(),
            StoreSlot::Linked(i) => self.linked_stores.get(i).map(|(_, s)| s),
            StoreSlot::Primary => Some(&self.primary),
        }
    }

    pub(crate) fn store_mut(&mut self, slot: StoreSlot) -> Option<&mut VarStore> {
        match slot {
            StoreSlot::EventFlags => None,
            StoreSlot::Linked(i) => self.linked_stores.get_mut(i).map(|(_, s)| s),
            StoreSlot::Primary => Some(&mut self.primary),
        }
    }

    /// 查找变量及其所在存储
    pub fn find_variable(&self, name: &str, kind: VarKind) -> Option<(StoreSlot, &Variable)> {
        if let Some(var) = self.event_flags.as_deref().and_then(|s| s.get(name, kind)) {
            return Some((StoreSlot::EventFlags, var));
        }

        for (i, (prefix, store)) in self.linked_stores.iter().enumerate() {
            if has_prefix(name, prefix) {
                if let Some(var) = store.get(name, kind) {
                    return Some((StoreSlot::Linked(i), var));
                }
            }
        }

        self.primary.get(name, kind).map(|var| (StoreSlot::Primary, var))
    }

    pub fn get_variable(&self, name: &str, kind: VarKind) -> Option<&Variable> {
        self.find_variable(name, kind).map(|(_, var)| var)
    }

    /// 名字对应的写入存储
    pub(crate) fn write_slot(&self, name: &str) -> StoreSlot {
        self.linked_stores
            .iter()
            .position(|(prefix, _)| has_prefix(name, prefix))
            .map_or(StoreSlot::Primary, StoreSlot::Linked)
    }

    /// 写入变量，整体替换同名同种类的槽位
    pub fn set_variable(&mut self, name: &str, var: Variable) {
        let slot = self.write_slot(name);
        if let Some(store) = self.store_mut(slot) {
            store.set(name, var);
        }
    }

    /// 值背后的变量
    pub fn resolve<'a>(&'a self, value: &'a Value) -> Option<&'a Variable> {
        match value {
            Value::Owned(var) => Some(var.as_ref()),
            Value::Borrowed(handle) => self.store(handle.store)?.get(&handle.name, handle.kind),
            _ => None,
        }
    }

    /// 深拷贝：借用句柄变为拥有的变量
    pub fn to_owned_value(&self, value: &Value) -> Value {
        match value {
            Value::Borrowed(handle) => match self.resolve(value) {
                Some(var) => Value::variable(var.clone()),
                None => Value::variable(Variable::unset(handle.name.clone(), handle.kind)),
            },
            other => other.clone(),
        }
    }

    /// 按名字解析任意种类；都没有时合成一个未赋值的数字变量
    pub(crate) fn lookup_named(&self, name: &str) -> Value {
        for kind in VarKind::ANY_ORDER {
            if let Some((store, _)) = self.find_variable(name, kind) {
                return Value::Borrowed(VarHandle {
                    store,
                    kind,
                    name: name.to_string(),
                });
            }
        }
        Value::variable(Variable::unset(name, VarKind::Number))
    }

    /// 按值的种类写入：数字进数字库，标志进标志库，变量按自身种类拷贝改名
    pub fn assign(&mut self, name: &str, value: &Value) {
        let var = match value {
            Value::Number(n) => Variable::new(VariableData::Number(*n as f32)),
            Value::Flag(b) => Variable::new(VariableData::Flag(*b)),
            Value::Owned(_) | Value::Borrowed(_) => match self.resolve(value) {
                Some(var) => var.renamed(name),
                None => return,
            },
            Value::Empty => return,
        };
        self.set_variable(name, var);
    }
}
