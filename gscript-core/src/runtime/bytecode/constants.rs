//! 去重常量表

use std::collections::HashMap;
use std::hash::Hash;

/// 可放入常量表的值，`key` 决定两个值是否视为同一个常量
pub trait Interned: Clone {
    type Key: Eq + Hash;

    fn key(&self) -> Self::Key;
}

impl Interned for String {
    type Key = String;

    fn key(&self) -> String {
        self.clone()
    }
}

/// 数字按位模式去重：`0.0` 与 `-0.0` 是两个常量，NaN 与自身相同
impl Interned for f32 {
    type Key = u32;

    fn key(&self) -> u32 {
        self.to_bits()
    }
}

/// 只追加的常量表；相等的值总是得到同一个下标
#[derive(Debug, Clone)]
pub struct ConstantTable<T: Interned> {
    values: Vec<T>,
    keys: HashMap<T::Key, u16>,
}

impl<T: Interned> ConstantTable<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// 返回值的下标，首次出现时追加；表满（超过 u16 范围）时返回 `None`
    pub fn intern(&mut self, value: T) -> Option<u16> {
        let key = value.key();
        if let Some(&index) = self.keys.get(&key) {
            return Some(index);
        }

        let index = u16::try_from(self.values.len()).ok()?;
        self.values.push(value);
        self.keys.insert(key, index);
        Some(index)
    }

    pub fn get(&self, index: u16) -> Option<&T> {
        self.values.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T: Interned> Default for ConstantTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interned> FromIterator<T> for ConstantTable<T> {
    /// 按顺序重建；重复值保留第一次出现的下标
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        for value in iter {
            let key = value.key();
            let index = table.values.len() as u16;
            table.values.push(value);
            table.keys.entry(key).or_insert(index);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_dedup() {
        let mut table = ConstantTable::new();
        assert_eq!(table.intern("a".to_string()), Some(0));
        assert_eq!(table.intern("b".to_string()), Some(1));
        assert_eq!(table.intern("a".to_string()), Some(0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).map(String::as_str), Some("b"));
    }

    #[test]
    fn test_number_dedup_by_bits() {
        let mut table = ConstantTable::new();
        assert_eq!(table.intern(1.5f32), Some(0));
        assert_eq!(table.intern(0.0f32), Some(1));
        // -0.0 位模式不同
        assert_eq!(table.intern(-0.0f32), Some(2));
        assert_eq!(table.intern(f32::NAN), Some(3));
        assert_eq!(table.intern(f32::NAN), Some(3));
        assert_eq!(table.intern(1.5f32), Some(0));
    }

    #[test]
    fn test_keys_increase_in_first_seen_order() {
        let mut table = ConstantTable::new();
        let keys: Vec<u16> = ["x", "y", "x", "z", "y", "w"]
            .iter()
            .filter_map(|s| table.intern(s.to_string()))
            .collect();
        assert_eq!(keys, vec![0, 1, 0, 2, 1, 3]);
        assert_eq!(table.as_slice(), &["x", "y", "z", "w"]);
    }

    #[test]
    fn test_table_full() {
        let mut table = ConstantTable::new();
        for i in 0..=u16::MAX as u32 {
            assert!(table.intern(i as f32).is_some());
        }
        assert_eq!(table.intern(1.0e9f32), None);
    }
}
