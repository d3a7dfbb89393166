//! Span 跟踪

/// Span ID（单个 logger 内唯一）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

/// 一段命名的执行上下文，如一次编译或一个程序的运行
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub id: SpanId,
    pub name: &'static str,
}

impl Span {
    pub const fn new(id: SpanId, name: &'static str) -> Self {
        Span { id, name }
    }
}
