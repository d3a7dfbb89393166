//! 表达式解析（优先级爬升）

use super::parser::Parser;
use super::tree::{NodeId, NodeKind};
use crate::compiler::lexer::TokenKind;

/// 前缀运算符的操作数只取基本表达式（后缀运算符除外）
const PREFIX_OPERAND_PRECEDENCE: u8 = u8::MAX;

impl Parser<'_> {
    /// 解析优先级不低于 `precedence` 的表达式
    pub(super) fn parse_expr(&mut self, optional: bool, precedence: u8) -> Option<NodeId> {
        let mut left = match self.token() {
            TokenKind::Id => Some(self.parse_expr_id()),
            TokenKind::NumberLiteral => {
                let node = self.open(NodeKind::Empty);
                let literal = self.eat();
                Some(self.close(node, NodeKind::NumberLiteral { literal }))
            }
            TokenKind::StringLiteral => {
                let node = self.open(NodeKind::Empty);
                let literal = self.eat();
                Some(self.close(node, NodeKind::StringLiteral { literal }))
            }
            TokenKind::LeftParen => {
                // 括号不产生节点，终结符挂在外层节点上
                self.expect(TokenKind::LeftParen);
                let inner = self.parse_expr(false, 0);
                self.expect(TokenKind::RightParen);
                inner
            }
            TokenKind::LeftBrace => Some(self.parse_expr_list()),
            TokenKind::Pipe => Some(self.parse_expr_range()),
            _ => None,
        };

        if left.is_none() && self.token().is_unary_prefix() {
            left = Some(self.parse_expr_prefix());
        }

        let Some(mut left) = left else {
            if !optional {
                let at = self.here();
                self.diag.error(at, Default::default(), "expected expression");
            }
            return None;
        };

        loop {
            let op = self.token();
            if let Some(p) = op.precedence() {
                if p >= precedence {
                    left = if op == TokenKind::OpTernary {
                        self.parse_expr_ternary(left, p)
                    } else {
                        self.parse_expr_binary(left, p, op.is_right_associative())
                    };
                    continue;
                }
            }

            if op.is_unary_postfix() {
                let node = self.open_around(left);
                let op = self.eat();
                left = self.close(
                    node,
                    NodeKind::UnaryOp {
                        op,
                        prefix: false,
                        expr: Some(left),
                    },
                );
                continue;
            }

            break;
        }

        Some(left)
    }

    fn parse_expr_id(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        let name = self.expect(TokenKind::Id);
        let id = self.close(node, NodeKind::Identifier { name });

        match self.token() {
            TokenKind::LeftBracket => self.parse_expr_index(id),
            TokenKind::LeftParen => self.parse_expr_call(id, name),
            _ => id,
        }
    }

    fn parse_expr_list(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::LeftBrace);

        let mut elements = Vec::new();
        while self.token() != TokenKind::RightBrace {
            elements.push(self.parse_expr(false, 0));
            if self.token() == TokenKind::Comma {
                self.eat();
            } else {
                break;
            }
        }

        self.expect(TokenKind::RightBrace);
        self.close(node, NodeKind::List { elements })
    }

    /// `|lo, hi|`
    fn parse_expr_range(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        self.expect(TokenKind::Pipe);
        let lower = self.expect(TokenKind::NumberLiteral);
        self.expect(TokenKind::Comma);
        let upper = self.expect(TokenKind::NumberLiteral);
        self.expect(TokenKind::Pipe);
        self.close(node, NodeKind::Range { lower, upper })
    }

    fn parse_expr_prefix(&mut self) -> NodeId {
        let node = self.open(NodeKind::Empty);
        let op = self.eat();
        let expr = self.parse_expr(false, PREFIX_OPERAND_PRECEDENCE);
        self.close(
            node,
            NodeKind::UnaryOp {
                op,
                prefix: true,
                expr,
            },
        )
    }

    fn parse_expr_binary(&mut self, left: NodeId, precedence: u8, right_assoc: bool) -> NodeId {
        let node = self.open_around(left);
        let op = self.eat();
        let next = if right_assoc { precedence } else { precedence + 1 };
        let right = self.parse_expr(false, next);
        self.close(node, NodeKind::BinaryOp { op, left, right })
    }

    fn parse_expr_ternary(&mut self, cond: NodeId, precedence: u8) -> NodeId {
        let node = self.open_around(cond);
        self.expect(TokenKind::OpTernary);
        let then_value = self.parse_expr(false, precedence);
        self.expect(TokenKind::Colon);
        let else_value = self.parse_expr(false, precedence);
        self.close(
            node,
            NodeKind::TernaryOp {
                cond,
                then_value,
                else_value,
            },
        )
    }

    fn parse_expr_index(&mut self, left: NodeId) -> NodeId {
        let node = self.open_around(left);
        self.expect(TokenKind::LeftBracket);
        let index = self.parse_expr(false, 0);
        self.expect(TokenKind::RightBracket);
        let node = self.close(node, NodeKind::Index { left, index });

        if self.token() != TokenKind::Dot {
            return node;
        }

        let lookup = self.open_around(node);
        self.expect(TokenKind::Dot);
        let id = self.expect(TokenKind::Id);
        self.close(lookup, NodeKind::DotLookup { left: node, id })
    }

    fn parse_expr_call(&mut self, left: NodeId, name: super::tree::TerminalId) -> NodeId {
        let functions = self.functions;
        if let Some(prototype) = functions.get(self.tree.terminal(name).text()) {
            return self.parse_expr_call_builtin(left, prototype);
        }

        let node = self.open_around(left);
        self.expect(TokenKind::LeftParen);

        let mut args = Vec::new();
        let mut trailing_comma = None;
        while self.token() != TokenKind::RightParen {
            args.push(self.parse_expr(false, 0));
            if self.token() == TokenKind::Comma {
                trailing_comma = Some(self.here());
                self.eat();
            } else {
                trailing_comma = None;
                break;
            }
        }

        if let Some(at) = trailing_comma {
            self.diag
                .error(at, Default::default(), "trailing comma in argument list");
        }

        self.expect(TokenKind::RightParen);
        self.close(node, NodeKind::Call { left, args })
    }

    /// 内建函数调用：参数形状由原型决定
    fn parse_expr_call_builtin(&mut self, left: NodeId, prototype: &[bool]) -> NodeId {
        let node = self.open_around(left);
        let last = prototype.len().saturating_sub(1);

        if prototype.first() == Some(&true) {
            self.lexer.flag_next_as_string(true, last == 0);
        }
        self.expect(TokenKind::LeftParen);

        let mut args = Vec::with_capacity(prototype.len());
        for (i, &is_string) in prototype.iter().enumerate() {
            if i != 0 {
                if is_string {
                    self.lexer.flag_next_as_string(true, i == last);
                }
                self.expect(TokenKind::Comma);
            }
            args.push(self.parse_expr(false, 0));
        }

        self.expect(TokenKind::RightParen);
        self.close(node, NodeKind::Call { left, args })
    }
}
