//! 字节读取游标

/// 读取错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// 数据在读取某个字段时提前结束
    Truncated { what: &'static str, offset: usize },
    /// 字符串常量不是合法的 UTF-8
    InvalidUtf8 { index: usize },
    /// bodyOffset 与实际头部长度不一致
    BodyOffsetMismatch { declared: usize, actual: usize },
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Truncated { what, offset } => {
                write!(f, "truncated {} at offset {}", what, offset)
            }
            ReadError::InvalidUtf8 { index } => {
                write!(f, "string constant {} is not valid UTF-8", index)
            }
            ReadError::BodyOffsetMismatch { declared, actual } => write!(
                f,
                "body offset {} does not match header length {}",
                declared, actual
            ),
        }
    }
}

impl std::error::Error for ReadError {}

/// 小端序读取游标
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], ReadError> {
        if self.remaining() < len {
            return Err(ReadError::Truncated {
                what,
                offset: self.offset,
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32, ReadError> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32(&mut self, what: &'static str) -> Result<f32, ReadError> {
        self.read_u32(what).map(f32::from_bits)
    }
}
