use std::collections::HashMap;
use std::sync::Arc;

use gscript_log::Logger;

use super::tree::{NodeId, NodeKind, SyntaxTree, Terminal, TerminalId};
use crate::compiler::lexer::{Lexer, Token, TokenKind};
use crate::kit::diag::{DiagBuilder, DiagObserver};
use crate::kit::source::{Pos, Range};

/// 参数原型表：名称 -> 每个参数位置是否按原始字符串扫描
pub type PrototypeMap = HashMap<String, Vec<bool>>;

/// 递归下降 + 优先级爬升解析器
///
/// 解析器始终持有一个“当前终结符”：token 已从词法分析器取出，前导 trivia
/// 和同一行的尾随 trivia 已挂在它上面。吃掉终结符时把它挂到栈顶节点下，
/// 再从词法分析器取下一个。
pub struct Parser<'a> {
    pub(super) lexer: Lexer<'a>,
    pub(super) diag: DiagBuilder<'a>,
    pub(super) commands: &'a PrototypeMap,
    pub(super) functions: &'a PrototypeMap,
    pub(super) tree: SyntaxTree,
    pub(super) stack: Vec<NodeId>,
    pub(super) terminal: Terminal,
    pub(super) logger: Arc<Logger>,
}

impl<'a> Parser<'a> {
    pub fn new(
        lexer: Lexer<'a>,
        observer: &'a mut dyn DiagObserver,
        commands: &'a PrototypeMap,
        functions: &'a PrototypeMap,
    ) -> Self {
        Self::with_logger(lexer, observer, commands, functions, Logger::noop())
    }

    pub fn with_logger(
        lexer: Lexer<'a>,
        observer: &'a mut dyn DiagObserver,
        commands: &'a PrototypeMap,
        functions: &'a PrototypeMap,
        logger: Arc<Logger>,
    ) -> Self {
        let mut parser = Self {
            lexer,
            diag: DiagBuilder::with_logger(observer, Arc::clone(&logger)),
            commands,
            functions,
            tree: SyntaxTree::new(),
            stack: Vec::new(),
            terminal: Terminal::default(),
            logger,
        };
        // 预读第一个终结符
        parser.terminal = parser.next_terminal();
        parser
    }

    /// 解析整个程序，总是返回一棵树
    pub fn parse(mut self) -> SyntaxTree {
        let _span = self.logger.enter_span("parse");

        let root = self.open_root();
        let mut statements = Vec::new();

        while let Some(stmt) = self.parse_stmt(true) {
            statements.push(stmt);
        }

        if self.token() == TokenKind::Eof {
            self.eat();
        } else {
            let at = self.here();
            self.diag.warn(at, Range::default(), "expected end of file");
        }
        self.close(root, NodeKind::Block { statements });

        gscript_log::debug!(
            self.logger,
            target: "gscript::parser",
            "parsed {} nodes, {} errors, {} warnings",
            self.tree.len(),
            self.diag.error_count(),
            self.diag.warning_count()
        );

        self.tree
    }

    pub fn error_count(&self) -> usize {
        self.diag.error_count()
    }

    // ===== 终结符 =====

    pub(super) fn token(&self) -> TokenKind {
        self.terminal.token.kind
    }

    pub(super) fn here(&self) -> Pos {
        self.terminal.token.range.beg
    }

    /// 从词法分析器取下一个终结符，收集前后 trivia
    fn next_terminal(&mut self) -> Terminal {
        let mut terminal = Terminal::default();

        while self.lexer.current().kind.is_trivia() {
            terminal.leading.push(self.lexer.advance());
        }

        terminal.token = self.lexer.advance();

        // 换行只作为下一个终结符的前导 trivia
        while matches!(
            self.lexer.current().kind,
            TokenKind::Whitespace | TokenKind::Comment
        ) {
            terminal.trailing.push(self.lexer.advance());
        }

        for diag in self.lexer.take_diags() {
            self.diag.emit(diag);
        }

        terminal
    }

    /// 吃掉当前终结符，挂到栈顶节点下
    pub(super) fn eat(&mut self) -> TerminalId {
        let next = self.next_terminal();
        let current = std::mem::replace(&mut self.terminal, next);
        self.tree.attach_terminal(self.stack.last().copied(), current)
    }

    /// 吃掉指定类型的终结符；不匹配时合成零宽终结符并报错
    pub(super) fn expect(&mut self, kind: TokenKind) -> TerminalId {
        if self.token() == kind {
            return self.eat();
        }

        let at = self.here();
        let placeholder = Terminal::new(Token::placeholder(kind, at));
        let id = self.tree.attach_terminal(self.stack.last().copied(), placeholder);
        self.diag.error(
            at,
            Range::default(),
            format!("expected '{}' got '{}'", kind.spelling(), self.token().spelling()),
        );
        id
    }

    // ===== 节点栈 =====

    fn open_root(&mut self) -> NodeId {
        let id = self.tree.alloc(NodeKind::Empty);
        self.tree.set_root(id);
        self.stack.push(id);
        id
    }

    /// 以占位种类开启节点，挂到栈顶节点下并压栈
    pub(super) fn open(&mut self, placeholder: NodeKind) -> NodeId {
        let id = self.tree.alloc(placeholder);
        self.push(id);
        id
    }

    /// 把已分配的节点挂到栈顶节点下并压栈
    pub(super) fn push(&mut self, id: NodeId) {
        if let Some(&parent) = self.stack.last() {
            self.tree.attach_node(parent, id);
        }
        self.stack.push(id);
    }

    /// 写入最终种类并出栈
    pub(super) fn close(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        self.tree.set_kind(id, kind);
        self.stack.pop();
        id
    }

    /// 为中缀/后缀结构分配节点并收养左操作数
    pub(super) fn open_around(&mut self, left: NodeId) -> NodeId {
        let id = self.tree.alloc(NodeKind::Empty);
        self.tree.adopt(left, id);
        self.push(id);
        id
    }
}
