//! 运行时：字节码、代码生成、值与变量存储、虚拟机

pub mod bytecode;
pub mod compiler;
pub mod store;
pub mod value;
pub mod vm;
