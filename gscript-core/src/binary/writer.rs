//! 容器写入器

/// 按容器格式拼装头部和字节码体
#[derive(Debug, Default)]
pub struct ProgramWriter {
    header: Vec<u8>,
}

impl ProgramWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_u32(&mut self, value: u32) {
        self.header.extend_from_slice(&value.to_le_bytes());
    }

    /// 写入字符串常量表
    pub fn write_strings(&mut self, strings: &[String]) {
        self.write_u32(strings.len() as u32);
        for s in strings {
            self.write_u32(s.len() as u32);
            self.header.extend_from_slice(s.as_bytes());
        }
    }

    /// 写入数字常量表
    pub fn write_numbers(&mut self, numbers: &[f32]) {
        self.write_u32(numbers.len() as u32);
        for n in numbers {
            self.write_u32(n.to_bits());
        }
    }

    /// 头部长度（含 bodyOffset 字段）
    pub fn header_len(&self) -> usize {
        4 + self.header.len()
    }

    /// 输出完整容器
    pub fn finish(self, body: &[u8]) -> Vec<u8> {
        let body_offset = self.header_len();
        let mut out = Vec::with_capacity(body_offset + body.len());
        out.extend_from_slice(&(body_offset as u32).to_le_bytes());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(body);
        out
    }
}

/// 一次写出常量表和字节码体
pub fn write_program(strings: &[String], numbers: &[f32], body: &[u8]) -> Vec<u8> {
    let mut writer = ProgramWriter::new();
    writer.write_strings(strings);
    writer.write_numbers(numbers);
    writer.finish(body)
}
