//! 字节码容器格式
//!
//! ```text
//! u32  bodyOffset                      // 字节码体的绝对偏移，等于头部长度
//! u32  stringCount
//!      [u32 len, len 字节 UTF-8] * stringCount
//! u32  numberCount
//!      [f32 原始位模式] * numberCount
//! ...  字节码体，直到缓冲区结尾
//! ```
//!
//! 所有整数均为小端序，与宿主字节序无关。

pub mod loader;
pub mod reader;
pub mod writer;

pub use loader::Program;
pub use reader::{ByteReader, ReadError};
pub use writer::ProgramWriter;
