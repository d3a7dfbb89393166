//! 源码游标
//!
//! 词法分析器通过 [`Source`] 逐字符读取源码。游标支持回退到之前观察到的
//! 位置：字符串模式被追溯开启时，已经预读的 token 需要按新模式重新扫描。

use serde::Serialize;
use std::path::Path;

/// 源码位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pos {
    /// 字符偏移，0-based
    pub offset: usize,
    /// 行号，1-based
    pub line: usize,
    /// 列号，1-based，按字符计数
    pub column: usize,
}

impl Pos {
    pub const fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// 跨过一个字符
    pub fn advance(&mut self, c: char) {
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Pos {
    fn default() -> Self {
        Self::start()
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 半开区间 `[beg, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Range {
    pub beg: Pos,
    pub end: Pos,
}

impl Range {
    pub const fn new(beg: Pos, end: Pos) -> Self {
        Self { beg, end }
    }

    /// 零宽区间
    pub const fn at(pos: Pos) -> Self {
        Self { beg: pos, end: pos }
    }

    pub fn is_empty(&self) -> bool {
        self.beg.offset >= self.end.offset
    }

    pub fn merge(&self, other: &Range) -> Self {
        let beg = if other.beg.offset < self.beg.offset { other.beg } else { self.beg };
        let end = if other.end.offset > self.end.offset { other.end } else { self.end };
        Self { beg, end }
    }
}

/// 源码错误
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("couldn't open file: {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 字符游标
pub trait Source {
    /// 当前字符，读完后为 `None`
    fn current(&self) -> Option<char>;

    /// 当前字符之后的一个字符
    fn lookahead(&self) -> Option<char>;

    /// 前进一个字符
    fn advance(&mut self);

    fn pos(&self) -> Pos;

    fn is_finished(&self) -> bool {
        self.current().is_none()
    }

    /// 回到之前由 [`Source::pos`] 得到的位置
    fn reset(&mut self, pos: Pos);

    /// 区间内的文本
    fn range_text(&self, range: Range) -> String;

    /// 源的名称，用于诊断输出
    fn name(&self) -> &str;
}

/// 内存中的源码
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    chars: Vec<char>,
    pos: Pos,
}

impl MemorySource {
    pub fn new(text: &str) -> Self {
        Self::with_name("<string>", text)
    }

    pub fn with_name(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            chars: text.chars().collect(),
            pos: Pos::start(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl Source for MemorySource {
    fn current(&self) -> Option<char> {
        self.chars.get(self.pos.offset).copied()
    }

    fn lookahead(&self) -> Option<char> {
        self.chars.get(self.pos.offset + 1).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos.advance(c);
        }
    }

    fn pos(&self) -> Pos {
        self.pos
    }

    fn reset(&mut self, pos: Pos) {
        self.pos = pos;
        if self.pos.offset > self.chars.len() {
            self.pos.offset = self.chars.len();
        }
    }

    fn range_text(&self, range: Range) -> String {
        let end = range.end.offset.min(self.chars.len());
        let beg = range.beg.offset.min(end);
        self.chars[beg..end].iter().collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 文件源码，打开时整体读入
#[derive(Debug, Clone)]
pub struct FileSource {
    inner: MemorySource,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            inner: MemorySource::with_name(path.display().to_string(), &text),
        })
    }
}

impl Source for FileSource {
    fn current(&self) -> Option<char> {
        self.inner.current()
    }

    fn lookahead(&self) -> Option<char> {
        self.inner.lookahead()
    }

    fn advance(&mut self) {
        self.inner.advance()
    }

    fn pos(&self) -> Pos {
        self.inner.pos()
    }

    fn reset(&mut self, pos: Pos) {
        self.inner.reset(pos)
    }

    fn range_text(&self, range: Range) -> String {
        self.inner.range_text(range)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// `name` 是否以 `prefix` 开头（逐字节比较，不做任何规范化）
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name.as_bytes().starts_with(prefix.as_bytes())
}
