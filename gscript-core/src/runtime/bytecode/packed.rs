//! 打包操作数
//!
//! 4 字节小端：低 4 位为种类，随后 16 位为下标，高 12 位保留为 0。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum PackedKind {
    /// 数字常量表下标
    ConstNumber = 0,
    /// 字符串常量表下标
    ConstString = 1,
    /// 常量数组，下标指向数字常量表中的元素个数
    ConstArray = 2,
    /// 变量引用，下标指向字符串常量表中的名称
    Named = 3,
}

impl PackedKind {
    pub fn name(&self) -> &'static str {
        match self {
            PackedKind::ConstNumber => "num",
            PackedKind::ConstString => "str",
            PackedKind::ConstArray => "arr",
            PackedKind::Named => "var",
        }
    }
}

impl TryFrom<u8> for PackedKind {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, u8> {
        match bits {
            0 => Ok(PackedKind::ConstNumber),
            1 => Ok(PackedKind::ConstString),
            2 => Ok(PackedKind::ConstArray),
            3 => Ok(PackedKind::Named),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PackedValue {
    pub kind: PackedKind,
    pub index: u16,
}

const KIND_MASK: u32 = 0xF;
const INDEX_SHIFT: u32 = 4;

impl PackedValue {
    pub const fn new(kind: PackedKind, index: u16) -> Self {
        Self { kind, index }
    }

    pub fn to_u32(self) -> u32 {
        (self.kind as u32) | ((self.index as u32) << INDEX_SHIFT)
    }

    /// 解码；种类未知时返回原始种类位
    pub fn from_u32(raw: u32) -> Result<Self, u8> {
        let kind = PackedKind::try_from((raw & KIND_MASK) as u8)?;
        let index = ((raw >> INDEX_SHIFT) & 0xFFFF) as u16;
        Ok(Self { kind, index })
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.to_u32().to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Result<Self, u8> {
        Self::from_u32(u32::from_le_bytes(bytes))
    }
}

impl std::fmt::Display for PackedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind.name(), self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        let packed = PackedValue::new(PackedKind::Named, 0x1234);
        assert_eq!(packed.to_u32(), 0x0001_2343);
        assert_eq!(packed.to_le_bytes(), [0x43, 0x23, 0x01, 0x00]);
        assert_eq!(PackedValue::from_u32(0x0001_2343), Ok(packed));
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(PackedValue::from_u32(0x7), Err(7));
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let packed = PackedValue::from_u32(0xFFF0_0011).expect("decode");
        assert_eq!(packed.kind, PackedKind::ConstString);
        assert_eq!(packed.index, 1);
    }
}
