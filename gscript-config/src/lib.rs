//! GScript Config - shared configuration vocabulary
//!
//! Only data lives here: no global state, no IO. Every type round-trips
//! through serde so the CLI can read it from a project file.

use serde::{Deserialize, Serialize};

/// Configuration for the front end and code generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Log an indented dump of the syntax tree before code generation
    pub dump_tree: bool,
    /// Include terminals (tokens) in the tree dump
    pub dump_terminals: bool,
    /// Largest number of elements a `|lo, hi|` range literal may expand to
    pub max_range_len: usize,
}

/// Configuration for execution limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum operand stack size; `None` lets the stack grow without bound
    pub max_stack_size: Option<usize>,
    /// Maximum depth of the return-address stack
    pub max_return_depth: usize,
    /// Maximum number of elements a single array may grow to
    pub max_array_len: usize,
}

/// Execution phase, used to route log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexer,
    Parser,
    Compiler,
    Vm,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Lexer, Phase::Parser, Phase::Compiler, Phase::Vm];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Compiler => "compiler",
            Phase::Vm => "vm",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> &'static str {
        match self {
            Phase::Lexer => "gscript::lexer",
            Phase::Parser => "gscript::parser",
            Phase::Compiler => "gscript::compiler",
            Phase::Vm => "gscript::vm",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dump_tree: false,
            dump_terminals: false,
            max_range_len: 4096,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_stack_size: None,
            max_return_depth: 256,
            max_array_len: 65536,
        }
    }
}
