//! 按需产出 token 的词法分析器
//!
//! 词法分析器维护一个小的待取队列，`current`/`lookahead`/`advance` 按需补充。
//! 解析器可以通过 [`Lexer::flag_next_as_string`] 要求下一个 token 按原始
//! 字符串扫描：已经预读的 token 会被丢弃，游标回退到队首 token 的起点。

use std::collections::VecDeque;
use std::sync::Arc;

use gscript_log::Logger;
use serde::Serialize;

use super::token_kind::TokenKind;
use crate::kit::diag::{Diag, Severity};
use crate::kit::source::{Pos, Range, Source};

/// 词法单元
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Token {
    pub range: Range,
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(range: Range, text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            range,
            text: text.into(),
            kind,
        }
    }

    /// 零宽占位 token，解析器在缺少期望的终结符时合成
    pub fn placeholder(kind: TokenKind, at: Pos) -> Self {
        Self::new(Range::at(at), String::new(), kind)
    }
}

/// 字符串模式的终止规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StringMode {
    in_call: bool,
    last_arg: bool,
}

impl StringMode {
    fn is_terminator(&self, c: char) -> bool {
        match (self.in_call, self.last_arg) {
            (true, true) => c == ')',
            (false, true) => c == ';',
            (_, false) => c == ',',
        }
    }
}

pub struct Lexer<'s> {
    source: &'s mut dyn Source,
    tokens: VecDeque<Token>,
    string_next: Option<StringMode>,
    start: Pos,
    diags: Vec<Diag>,
    logger: Arc<Logger>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s mut dyn Source) -> Self {
        Self::with_logger(source, Logger::noop())
    }

    pub fn with_logger(source: &'s mut dyn Source, logger: Arc<Logger>) -> Self {
        let start = source.pos();
        Self {
            source,
            tokens: VecDeque::new(),
            string_next: None,
            start,
            diags: Vec::new(),
            logger,
        }
    }

    /// 让下一个 token 按原始字符串扫描
    ///
    /// `in_call` 表示参数位于括号参数表中，`last_arg` 表示这是最后一个参数。
    pub fn flag_next_as_string(&mut self, in_call: bool, last_arg: bool) {
        self.string_next = Some(StringMode { in_call, last_arg });

        if let Some(front) = self.tokens.front() {
            let beg = front.range.beg;
            gscript_log::trace!(
                self.logger,
                target: "gscript::lexer",
                "string mode: rewinding to {} ({} queued tokens dropped)",
                beg,
                self.tokens.len()
            );
            self.source.reset(beg);
            self.tokens.clear();
        }
    }

    pub fn current(&mut self) -> &Token {
        self.fill(0);
        &self.tokens[0]
    }

    pub fn lookahead(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.tokens[n]
    }

    /// 取出当前 token
    pub fn advance(&mut self) -> Token {
        self.fill(0);
        self.tokens.pop_front().unwrap_or_default()
    }

    /// 取走累积的诊断
    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    fn fill(&mut self, n: usize) {
        while self.tokens.len() <= n {
            let token = self.fetch_token();
            self.tokens.push_back(token);
        }
    }

    fn ch(&self) -> Option<char> {
        self.source.current()
    }

    fn pk(&self) -> Option<char> {
        self.source.lookahead()
    }

    fn next_char(&mut self) {
        self.source.advance();
    }

    fn fetch_token(&mut self) -> Token {
        self.start = self.source.pos();

        let (ch, pk) = match self.ch() {
            None => return self.make_token(TokenKind::Eof),
            Some(ch) => (ch, self.pk()),
        };

        let token = if is_whitespace(ch) {
            self.lex_whitespace()
        } else if ch == '\n' || (ch == '\r' && pk == Some('\n')) {
            self.lex_newline()
        } else if let Some(mode) = self.string_next.take() {
            self.lex_string(mode)
        } else if ch == '/' && pk == Some('/') {
            self.lex_line_comment()
        } else if ch == '/' && pk == Some('*') {
            self.lex_block_comment()
        } else if ch == '_' || ch.is_ascii_alphabetic() {
            self.lex_identifier()
        } else if ch.is_ascii_digit() || (ch == '.' && pk.is_some_and(|c| c.is_ascii_digit())) {
            self.lex_number()
        } else if let Some(token) = self.lex_symbol(ch, pk) {
            token
        } else {
            self.next_char();
            self.make_token(TokenKind::Invalid)
        };

        gscript_log::trace!(
            self.logger,
            target: "gscript::lexer",
            "{} {:?} at {}",
            token.kind.name(),
            token.text,
            token.range.beg
        );
        token
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let range = Range::new(self.start, self.source.pos());
        Token::new(range, self.source.range_text(range), kind)
    }

    fn lex_whitespace(&mut self) -> Token {
        while self.ch().is_some_and(is_whitespace) {
            self.next_char();
        }
        self.make_token(TokenKind::Whitespace)
    }

    fn lex_newline(&mut self) -> Token {
        if self.ch() == Some('\r') {
            self.next_char();
        }
        self.next_char();
        self.make_token(TokenKind::Newline)
    }

    fn lex_line_comment(&mut self) -> Token {
        loop {
            self.next_char();
            match self.ch() {
                None | Some('\n') => break,
                Some('\r') if self.pk() == Some('\n') => break,
                _ => {}
            }
        }
        self.make_token(TokenKind::Comment)
    }

    fn lex_block_comment(&mut self) -> Token {
        // 跳过 "/*"，避免 "/*/" 被当成闭合
        self.next_char();
        self.next_char();

        while let Some(c) = self.ch() {
            if c == '*' && self.pk() == Some('/') {
                break;
            }
            self.next_char();
        }

        if self.ch().is_none() {
            let range = Range::new(self.start, self.source.pos());
            self.diags.push(Diag::new(
                Severity::Error,
                self.start,
                range,
                "unterminated block comment",
            ));
        } else {
            self.next_char();
            self.next_char();
        }

        self.make_token(TokenKind::Comment)
    }

    fn lex_identifier(&mut self) -> Token {
        loop {
            self.next_char();
            match self.ch() {
                Some(c) if c == '_' || c == '.' || c.is_ascii_alphanumeric() => {}
                _ => break,
            }
        }

        let mut token = self.make_token(TokenKind::Id);
        if let Some(kind) = TokenKind::keyword(&token.text) {
            token.kind = kind;
        }
        token
    }

    fn lex_number(&mut self) -> Token {
        let mut radix = 10;

        if self.ch() == Some('0') {
            match self.pk() {
                Some('b' | 'B') => radix = 2,
                Some('x' | 'X') => radix = 16,
                _ => {}
            }
            if radix != 10 {
                self.next_char();
                self.next_char();
            }
        }

        match radix {
            2 => {
                while matches!(self.ch(), Some('0' | '1')) {
                    self.next_char();
                }
            }
            16 => {
                while self.ch().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.next_char();
                }
            }
            _ => self.lex_decimal_tail(),
        }

        self.make_token(TokenKind::NumberLiteral)
    }

    fn lex_decimal_tail(&mut self) {
        let mut has_dot = false;

        // 第二个 '.' 结束字面量
        while let Some(c) = self.ch() {
            if c == '.' {
                if has_dot {
                    break;
                }
                has_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.next_char();
        }

        if matches!(self.ch(), Some('e' | 'E')) {
            let exponent_follows = match self.pk() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => true,
                _ => false,
            };
            if exponent_follows {
                self.next_char();
                if matches!(self.ch(), Some('+' | '-')) {
                    self.next_char();
                }
                while self.ch().is_some_and(|c| c.is_ascii_digit()) {
                    self.next_char();
                }
            }
        }

        if self.ch() == Some('f') {
            self.next_char();
        }
    }

    fn lex_string(&mut self, mode: StringMode) -> Token {
        let mut nest_level = 0i32;

        while let Some(c) = self.ch() {
            if nest_level == 0 && mode.is_terminator(c) {
                break;
            }

            match c {
                '(' => nest_level += 1,
                ')' => nest_level -= 1,
                _ => {}
            }

            self.next_char();
        }

        self.make_token(TokenKind::StringLiteral)
    }

    fn lex_symbol(&mut self, ch: char, pk: Option<char>) -> Option<Token> {
        if let Some(pk) = pk {
            let mut op2 = String::with_capacity(2);
            op2.push(ch);
            op2.push(pk);
            if let Some(kind) = TokenKind::symbol(&op2) {
                self.next_char();
                self.next_char();
                return Some(self.make_token(kind));
            }
        }

        let mut op1 = [0u8; 4];
        let kind = TokenKind::symbol(ch.encode_utf8(&mut op1))?;
        self.next_char();
        Some(self.make_token(kind))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// 逐个产出 token，EOF 之后结束
    fn next(&mut self) -> Option<Token> {
        if self.current().kind == TokenKind::Eof {
            return None;
        }
        Some(self.advance())
    }
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::source::MemorySource;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut source = MemorySource::new(input);
        Lexer::new(&mut source)
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        let mut source = MemorySource::new(input);
        Lexer::new(&mut source)
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("if else while for break continue function return in foo"),
            vec![KwIf, KwElse, KwWhile, KwFor, KwBreak, KwContinue, KwFunction, KwReturn, KwIn, Id]
        );
        // 标识符可以包含 '.'
        assert_eq!(texts("this.x _a1"), vec!["this.x", "_a1"]);
    }

    #[test]
    fn test_two_char_symbols_first() {
        use TokenKind::*;
        assert_eq!(
            kinds("<= < ++ + += && || != ! ^= %"),
            vec![
                OpLessThanOrEqual,
                OpLessThan,
                OpIncrement,
                OpAdd,
                OpAddAssign,
                OpAnd,
                OpOr,
                OpNotEquals,
                OpNot,
                OpPowAssign,
                OpMod
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(texts("1.5.3"), vec!["1.5", ".3"]);
        assert_eq!(texts("0x1F 0b101 2e10 1.5E-3 3f .5"), vec!["0x1F", "0b101", "2e10", "1.5E-3", "3f", ".5"]);
        // 'e' 后面没有数字时不属于字面量
        assert_eq!(texts("2else"), vec!["2", "else"]);
    }

    #[test]
    fn test_newlines_and_comments() {
        use TokenKind::*;
        let mut source = MemorySource::new("a // c\r\nb /* x */\n");
        let all: Vec<TokenKind> = Lexer::new(&mut source).map(|t| t.kind).collect();
        assert_eq!(
            all,
            vec![Id, Whitespace, Comment, Newline, Id, Whitespace, Comment, Newline]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut source = MemorySource::new("a /* never closed");
        let mut lexer = Lexer::new(&mut source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Comment));

        let diags = lexer.take_diags();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unterminated block comment");
        assert!(diags[0].is_error());
    }

    #[test]
    fn test_invalid_char() {
        assert_eq!(kinds("a @ b"), vec![TokenKind::Id, TokenKind::Invalid, TokenKind::Id]);
    }

    #[test]
    fn test_string_mode_rewinds_queue() {
        let mut source = MemorySource::new("say hello, (a, b) world;");
        let mut lexer = Lexer::new(&mut source);

        assert_eq!(lexer.advance().text, "say");
        // 预读了空白和 hello
        assert_eq!(lexer.lookahead(1).text, "hello");

        lexer.flag_next_as_string(false, true);
        assert_eq!(lexer.advance().kind, TokenKind::Whitespace);
        let s = lexer.advance();
        assert_eq!(s.kind, TokenKind::StringLiteral);
        // 括号内的 ',' 不会结束字符串，非最后参数才以 ',' 结束
        assert_eq!(s.text, "hello, (a, b) world");
        assert_eq!(lexer.advance().kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_string_mode_terminators() {
        let cases = [
            ((true, true), "a, b) rest", "a, b"),
            ((true, false), "a (x, y), b)", "a (x, y)"),
            ((false, true), "a, b; rest", "a, b"),
            ((false, false), "a; b, c", "a; b"),
        ];

        for ((in_call, last_arg), input, expected) in cases {
            let mut source = MemorySource::new(input);
            let mut lexer = Lexer::new(&mut source);
            lexer.flag_next_as_string(in_call, last_arg);
            assert_eq!(lexer.advance().text, expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_empty_string_at_terminator() {
        let mut source = MemorySource::new(");");
        let mut lexer = Lexer::new(&mut source);
        lexer.flag_next_as_string(true, true);
        let s = lexer.advance();
        assert_eq!(s.kind, TokenKind::StringLiteral);
        assert!(s.text.is_empty());
        assert_eq!(lexer.advance().kind, TokenKind::RightParen);
    }

    #[test]
    fn test_eof_repeats() {
        let mut source = MemorySource::new("");
        let mut lexer = Lexer::new(&mut source);
        assert_eq!(lexer.advance().kind, TokenKind::Eof);
        assert_eq!(lexer.current().kind, TokenKind::Eof);
    }
}
