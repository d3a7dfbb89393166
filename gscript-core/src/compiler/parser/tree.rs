//! 语法树
//!
//! 节点和终结符都存放在 [`SyntaxTree`] 的 arena 中，通过下标互相引用。
//! 每个节点记录父节点下标，`break`/`continue` 向上查找外层循环时只做下标追踪。
//! 节点的 `children` 保留所有终结符（含 trivia），`NodeKind` 中的字段则是
//! 按语义挑出的子节点，供编译器使用。

use serde::Serialize;

use crate::compiler::lexer::{Token, TokenKind};
use crate::kit::source::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TerminalId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 节点的直接子元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Child {
    Node(NodeId),
    Terminal(TerminalId),
}

/// 终结符：一个 token 及其前后的 trivia
#[derive(Debug, Clone, Default, Serialize)]
pub struct Terminal {
    pub token: Token,
    pub leading: Vec<Token>,
    pub trailing: Vec<Token>,
    pub parent: Option<NodeId>,
}

impl Terminal {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }

    /// 包含 trivia 的区间
    pub fn full_range(&self) -> Range {
        let beg = self.leading.first().map_or(self.token.range.beg, |t| t.range.beg);
        let end = self.trailing.last().map_or(self.token.range.end, |t| t.range.end);
        Range::new(beg, end)
    }
}

/// 节点种类
///
/// 表达式子节点用 `Option` 表示：语法错误时解析器仍然产出节点，缺失的位置为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    // ===== 语句 =====
    Empty,
    Block {
        statements: Vec<NodeId>,
    },
    If {
        cond: Option<NodeId>,
        then_body: Option<NodeId>,
        else_body: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: Option<NodeId>,
        break_target: Option<u32>,
        continue_target: Option<u32>,
    },
    While {
        cond: Option<NodeId>,
        body: Option<NodeId>,
        break_target: Option<u32>,
        continue_target: Option<u32>,
    },
    Break,
    Continue,
    Return,
    Command {
        name: TerminalId,
        args: Vec<Option<NodeId>>,
    },
    FunctionDecl {
        name: TerminalId,
        body: Option<NodeId>,
    },

    // ===== 表达式 =====
    Identifier {
        name: TerminalId,
    },
    NumberLiteral {
        literal: TerminalId,
    },
    StringLiteral {
        literal: TerminalId,
    },
    List {
        elements: Vec<Option<NodeId>>,
    },
    Range {
        lower: TerminalId,
        upper: TerminalId,
    },
    UnaryOp {
        op: TerminalId,
        prefix: bool,
        expr: Option<NodeId>,
    },
    BinaryOp {
        op: TerminalId,
        left: NodeId,
        right: Option<NodeId>,
    },
    TernaryOp {
        cond: NodeId,
        then_value: Option<NodeId>,
        else_value: Option<NodeId>,
    },
    Index {
        left: NodeId,
        index: Option<NodeId>,
    },
    DotLookup {
        left: NodeId,
        id: TerminalId,
    },
    Call {
        left: NodeId,
        args: Vec<Option<NodeId>>,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Empty => "StmtEmpty",
            NodeKind::Block { .. } => "StmtBlock",
            NodeKind::If { .. } => "StmtIf",
            NodeKind::For { .. } => "StmtFor",
            NodeKind::While { .. } => "StmtWhile",
            NodeKind::Break => "StmtBreak",
            NodeKind::Continue => "StmtContinue",
            NodeKind::Return => "StmtReturn",
            NodeKind::Command { .. } => "StmtCommand",
            NodeKind::FunctionDecl { .. } => "StmtFunctionDecl",
            NodeKind::Identifier { .. } => "ExprId",
            NodeKind::NumberLiteral { .. } => "ExprNumberLiteral",
            NodeKind::StringLiteral { .. } => "ExprStringLiteral",
            NodeKind::List { .. } => "ExprList",
            NodeKind::Range { .. } => "ExprRange",
            NodeKind::UnaryOp { .. } => "ExprUnaryOp",
            NodeKind::BinaryOp { .. } => "ExprBinaryOp",
            NodeKind::TernaryOp { .. } => "ExprTernaryOp",
            NodeKind::Index { .. } => "ExprIndex",
            NodeKind::DotLookup { .. } => "ExprIndexDotLookup",
            NodeKind::Call { .. } => "ExprCall",
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, NodeKind::For { .. } | NodeKind::While { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<Child>,
}

/// 转储时单个节点文本的最大字符数
const DUMP_TEXT_LIMIT: usize = 64;

/// 语法树 arena
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    terminals: Vec<Terminal>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.0]
    }

    /// 分配一个尚未挂到任何父节点上的节点
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    /// 把 `child` 追加到 `parent` 末尾
    pub(crate) fn attach_node(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(Child::Node(child));
    }

    pub(crate) fn attach_terminal(&mut self, parent: Option<NodeId>, mut terminal: Terminal) -> TerminalId {
        let id = TerminalId(self.terminals.len());
        terminal.parent = parent;
        self.terminals.push(terminal);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(Child::Terminal(id));
        }
        id
    }

    /// 把 `child` 从原父节点移到 `new_parent` 末尾
    pub(crate) fn adopt(&mut self, child: NodeId, new_parent: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            let children = &mut self.nodes[old.0].children;
            if let Some(i) = children.iter().position(|c| *c == Child::Node(child)) {
                children.remove(i);
            }
        }
        self.attach_node(new_parent, child);
    }

    /// 按源码顺序列出节点下的全部终结符
    pub fn terminals_of(&self, id: NodeId) -> Vec<TerminalId> {
        let mut out = Vec::new();
        self.collect_terminals(id, &mut out);
        out
    }

    fn collect_terminals(&self, id: NodeId, out: &mut Vec<TerminalId>) {
        for child in &self.nodes[id.0].children {
            match *child {
                Child::Node(n) => self.collect_terminals(n, out),
                Child::Terminal(t) => out.push(t),
            }
        }
    }

    /// 节点覆盖的源码区间（不含首尾 trivia）
    pub fn range(&self, id: NodeId) -> Range {
        let terminals = self.terminals_of(id);
        match (terminals.first(), terminals.last()) {
            (Some(first), Some(last)) => Range::new(
                self.terminal(*first).token.range.beg,
                self.terminal(*last).token.range.end,
            ),
            _ => Range::default(),
        }
    }

    /// 由终结符和内部 trivia 还原节点的源码文本
    pub fn text(&self, id: NodeId) -> String {
        let terminals = self.terminals_of(id);
        let last = terminals.len().saturating_sub(1);
        let mut text = String::new();

        for (i, tid) in terminals.iter().enumerate() {
            let term = self.terminal(*tid);
            if i > 0 {
                term.leading.iter().for_each(|t| text.push_str(&t.text));
            }
            text.push_str(&term.token.text);
            if i < last {
                term.trailing.iter().for_each(|t| text.push_str(&t.text));
            }
        }

        text
    }

    /// 向上查找最近的循环节点
    pub fn enclosing_loop(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.parent(id);
        while let Some(n) = cur {
            if self.kind(n).is_loop() {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// 缩进形式的调试转储
    pub fn dump(&self, include_terminals: bool) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_node(root, 0, include_terminals, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, include_terminals: bool, out: &mut String) {
        push_line(out, depth, self.kind(id).name(), &self.text(id));

        for child in &self.nodes[id.0].children {
            match *child {
                Child::Node(n) => self.dump_node(n, depth + 1, include_terminals, out),
                Child::Terminal(t) if include_terminals => {
                    let term = self.terminal(t);
                    push_line(out, depth + 1, term.kind().name(), term.text());
                }
                Child::Terminal(_) => {}
            }
        }
    }
}

fn push_line(out: &mut String, depth: usize, name: &str, text: &str) {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let mut shown: String = flat.chars().take(DUMP_TEXT_LIMIT).collect();
    if flat.chars().count() > DUMP_TEXT_LIMIT {
        shown.push_str("...");
    }

    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str("* ");
    out.push_str(name);
    out.push('(');
    out.push_str(&shown);
    out.push_str(")\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::source::Pos;

    fn term(text: &str, kind: TokenKind) -> Terminal {
        Terminal::new(Token::new(Range::at(Pos::start()), text, kind))
    }

    #[test]
    fn test_adopt_moves_child() {
        let mut tree = SyntaxTree::new();
        let root = tree.alloc(NodeKind::Block { statements: vec![] });
        let left = tree.alloc(NodeKind::Empty);
        tree.attach_node(root, left);

        let op = tree.alloc(NodeKind::Empty);
        tree.adopt(left, op);
        tree.attach_node(root, op);

        assert_eq!(tree.parent(left), Some(op));
        assert_eq!(tree.node(root).children, vec![Child::Node(op)]);
        assert_eq!(tree.node(op).children, vec![Child::Node(left)]);
    }

    #[test]
    fn test_text_keeps_inner_trivia() {
        let mut tree = SyntaxTree::new();
        let root = tree.alloc(NodeKind::Empty);
        tree.set_root(root);

        let mut a = term("a", TokenKind::Id);
        a.leading.push(Token::new(Range::default(), " ", TokenKind::Whitespace));
        a.trailing.push(Token::new(Range::default(), " ", TokenKind::Whitespace));
        let mut b = term("b", TokenKind::Id);
        b.trailing.push(Token::new(Range::default(), "\n", TokenKind::Newline));
        tree.attach_terminal(Some(root), a);
        tree.attach_terminal(Some(root), b);

        // 首尾 trivia 不计入
        assert_eq!(tree.text(root), "a b");
    }

    #[test]
    fn test_dump_truncates() {
        let mut tree = SyntaxTree::new();
        let root = tree.alloc(NodeKind::Empty);
        tree.set_root(root);
        tree.attach_terminal(Some(root), term(&"x".repeat(100), TokenKind::Id));

        let dump = tree.dump(true);
        let first = dump.lines().next().unwrap_or_default();
        assert!(first.starts_with("* StmtEmpty(xxxx"));
        assert!(first.ends_with("...)"));
        assert!(dump.lines().nth(1).unwrap_or_default().starts_with("  * TokId("));
    }

    #[test]
    fn test_enclosing_loop() {
        let mut tree = SyntaxTree::new();
        let root = tree.alloc(NodeKind::Block { statements: vec![] });
        let lp = tree.alloc(NodeKind::While {
            cond: None,
            body: None,
            break_target: None,
            continue_target: None,
        });
        let brk = tree.alloc(NodeKind::Break);
        tree.attach_node(root, lp);
        tree.attach_node(lp, brk);

        assert_eq!(tree.enclosing_loop(brk), Some(lp));
        assert_eq!(tree.enclosing_loop(lp), None);
    }
}
