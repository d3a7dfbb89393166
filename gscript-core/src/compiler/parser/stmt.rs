//! 语句解析

use super::parser::Parser;
use super::tree::{NodeId, NodeKind};
use crate::compiler::lexer::TokenKind;

impl Parser<'_> {
    /// 解析一条语句；`optional` 为假时缺失语句会报错
    pub(super) fn parse_stmt(&mut self, optional: bool) -> Option<NodeId> {
        match self.token() {
            TokenKind::Semicolon => return Some(self.parse_stmt_empty()),
            TokenKind::LeftBrace => return Some(self.parse_stmt_block()),
            TokenKind::KwIf => return Some(self.parse_stmt_if()),
            TokenKind::KwFor => return Some(self.parse_stmt_for()),
            TokenKind::KwWhile => return Some(self.parse_stmt_while()),
            TokenKind::KwBreak => return Some(self.parse_stmt_keyword(TokenKind::KwBreak, NodeKind::Break)),
            TokenKind::KwContinue => {
                return Some(self.parse_stmt_keyword(TokenKind::KwContinue, NodeKind::Continue))
            }
            TokenKind::KwReturn => return Some(self.parse_stmt_keyword(TokenKind::KwReturn, NodeKind::Return)),
            TokenKind::KwFunction => {
                let node = self.parse_stmt_function_decl();
                if self.stack.len() != 1 {
                    let range = self.tree.range(node);
                    self.diag
                        .error(range.beg, range, "function declaration not at top level");
                }
                return Some(node);
            }
            _ => {}
        }

        if self.token() == TokenKind::Id {
            let commands = self.commands;
            if let Some(prototype) = commands.get(&self.terminal.token.text) {
                return Some(self.parse_stmt_command(prototype));
            }
        }

        if let Some(expr) = self.parse_expr(true, 0) {
            self.expect(TokenKind::Semicolon);
            return Some(expr);
        }

        if !optional {
            let at = self.here();
            self.diag.error(at, Default::default(), "expected statement");
        }
        None
    }

    fn parse_stmt_empty(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::Semicolon);
        self.close(node, NodeKind::Empty)
    }

    fn parse_stmt_block(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::LeftBrace);

        let mut statements = Vec::new();
        while self.token() != TokenKind::RightBrace {
            match self.parse_stmt(false) {
                Some(stmt) => statements.push(stmt),
                None => break,
            }
        }

        self.expect(TokenKind::RightBrace);
        self.close(node, NodeKind::Block { statements })
    }

    fn parse_stmt_if(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::KwIf);
        self.expect(TokenKind::LeftParen);
        let cond = self.parse_expr(false, 0);
        self.expect(TokenKind::RightParen);
        let then_body = self.parse_stmt(false);

        let else_body = if self.token() == TokenKind::KwElse {
            self.eat();
            self.parse_stmt(false)
        } else {
            None
        };

        self.close(
            node,
            NodeKind::If {
                cond,
                then_body,
                else_body,
            },
        )
    }

    fn parse_stmt_for(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::KwFor);
        self.expect(TokenKind::LeftParen);
        let init = self.parse_expr(true, 0);
        self.expect(TokenKind::Semicolon);
        let cond = self.parse_expr(true, 0);
        self.expect(TokenKind::Semicolon);
        let step = self.parse_expr(true, 0);
        self.expect(TokenKind::RightParen);
        let body = self.parse_stmt(false);

        self.close(
            node,
            NodeKind::For {
                init,
                cond,
                step,
                body,
                break_target: None,
                continue_target: None,
            },
        )
    }

    fn parse_stmt_while(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::KwWhile);
        self.expect(TokenKind::LeftParen);
        let cond = self.parse_expr(false, 0);
        self.expect(TokenKind::RightParen);
        let body = self.parse_stmt(false);

        self.close(
            node,
            NodeKind::While {
                cond,
                body,
                break_target: None,
                continue_target: None,
            },
        )
    }

    /// `break;` `continue;` `return;`
    fn parse_stmt_keyword(&mut self, keyword: TokenKind, kind: NodeKind) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(keyword);
        self.expect(TokenKind::Semicolon);
        self.close(node, kind)
    }

    fn parse_stmt_command(&mut self, prototype: &[bool]) -> NodeId {
        let node = self.open(NodeKind::Empty);
        let last = prototype.len().saturating_sub(1);

        if prototype.first() == Some(&true) {
            self.lexer.flag_next_as_string(false, last == 0);
        }
        let name = self.expect(TokenKind::Id);

        let mut args = Vec::with_capacity(prototype.len());
        for (i, &is_string) in prototype.iter().enumerate() {
            if i != 0 {
                if is_string {
                    self.lexer.flag_next_as_string(false, i == last);
                }
                self.expect(TokenKind::Comma);
            }
            args.push(self.parse_expr(false, 0));
        }

        self.expect(TokenKind::Semicolon);
        self.close(node, NodeKind::Command { name, args })
    }

    fn parse_stmt_function_decl(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::KwFunction);
        let name = self.expect(TokenKind::Id);
        self.expect(TokenKind::LeftParen);
        self.expect(TokenKind::RightParen);
        let body = self.parse_stmt(false);
        self.close(node, NodeKind::FunctionDecl { name, body })
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::{NodeKind, Parser, PrototypeMap, SyntaxTree};
    use crate::kit::diag::Diag;
    use crate::kit::source::MemorySource;

    fn parse_with(code: &str, commands: &PrototypeMap) -> (SyntaxTree, Vec<Diag>) {
        let mut source = MemorySource::new(code);
        let mut diags: Vec<Diag> = Vec::new();
        let functions = PrototypeMap::new();
        let tree = {
            let lexer = Lexer::new(&mut source);
            Parser::new(lexer, &mut diags, commands, &functions).parse()
        };
        (tree, diags)
    }

    fn root_statements(tree: &SyntaxTree) -> Vec<NodeKind> {
        let root = tree.root().expect("root");
        match tree.kind(root) {
            NodeKind::Block { statements } => statements.iter().map(|s| tree.kind(*s).clone()).collect(),
            other => panic!("root is {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let (tree, diags) = parse_with("if (a) { b = 1; } else c = 2;", &PrototypeMap::new());
        assert!(diags.is_empty(), "{:?}", diags);

        let stmts = root_statements(&tree);
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            NodeKind::If {
                cond: Some(_),
                then_body: Some(t),
                else_body: Some(e),
            } => {
                assert!(matches!(tree.kind(*t), NodeKind::Block { .. }));
                assert!(matches!(tree.kind(*e), NodeKind::BinaryOp { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_for_optional_parts() {
        let (tree, diags) = parse_with("for (;;) break;", &PrototypeMap::new());
        assert!(diags.is_empty(), "{:?}", diags);
        match &root_statements(&tree)[0] {
            NodeKind::For {
                init: None,
                cond: None,
                step: None,
                body: Some(body),
                ..
            } => assert_eq!(tree.kind(*body), &NodeKind::Break),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_string_args() {
        let mut commands = PrototypeMap::new();
        commands.insert("setstring".to_string(), vec![true, true]);
        let (tree, diags) = parse_with("setstring name, hello (a, b) world;", &commands);
        assert!(diags.is_empty(), "{:?}", diags);

        match &root_statements(&tree)[0] {
            NodeKind::Command { name, args } => {
                assert_eq!(tree.terminal(*name).text(), "setstring");
                assert_eq!(args.len(), 2);
                let texts: Vec<String> = args.iter().flatten().map(|a| tree.text(*a)).collect();
                assert_eq!(texts, vec!["name", "hello (a, b) world"]);
                assert!(args
                    .iter()
                    .flatten()
                    .all(|a| matches!(tree.kind(*a), NodeKind::StringLiteral { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_mixed_args() {
        let mut commands = PrototypeMap::new();
        commands.insert("setplayerprop".to_string(), vec![true, false]);
        let (tree, diags) = parse_with("setplayerprop speed, 1 + 2;", &commands);
        assert!(diags.is_empty(), "{:?}", diags);

        match &root_statements(&tree)[0] {
            NodeKind::Command { args, .. } => {
                assert!(matches!(tree.kind(args[0].unwrap()), NodeKind::StringLiteral { .. }));
                assert!(matches!(tree.kind(args[1].unwrap()), NodeKind::BinaryOp { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_function_not_at_top_level() {
        let (tree, diags) = parse_with("{ function f() { } }", &PrototypeMap::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "function declaration not at top level");
        // 节点仍然产出
        let stmts = root_statements(&tree);
        assert!(matches!(stmts[0], NodeKind::Block { ref statements } if statements.len() == 1));
    }

    #[test]
    fn test_missing_semicolon() {
        let (_, diags) = parse_with("a = 1", &PrototypeMap::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "expected ';' got 'end of file'");
    }

    #[test]
    fn test_expected_end_of_file() {
        let (_, diags) = parse_with("a = 1; }", &PrototypeMap::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "expected end of file");
        assert!(!diags[0].is_error());
    }

    #[test]
    fn test_unclosed_block() {
        let (_, diags) = parse_with("{ a = 1;", &PrototypeMap::new());
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["expected statement", "expected '}' got 'end of file'"]);
    }
}
