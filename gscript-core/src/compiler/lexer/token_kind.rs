//! GScript Token 类型定义

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum TokenKind {
    // 错误/状态类型
    #[default]
    Invalid,
    Eof,
    Whitespace,
    Newline,
    Comment,

    // 字面量与标识符
    Id,
    NumberLiteral,
    StringLiteral,

    // 关键字
    KwIn,
    KwIf,
    KwElse,
    KwFor,
    KwWhile,
    KwBreak,
    KwContinue,
    KwFunction,
    KwReturn,

    // 标点
    Dot,
    Comma,
    Colon,
    Semicolon,
    Pipe,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // 运算符
    OpTernary,

    OpNot,
    OpAnd,
    OpOr,
    OpEquals,
    OpNotEquals,
    OpLessThan,
    OpLessThanOrEqual,
    OpGreaterThan,
    OpGreaterThanOrEqual,

    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpPow,
    OpMod,

    OpAssign,
    OpAddAssign,
    OpSubAssign,
    OpMulAssign,
    OpDivAssign,
    OpPowAssign,
    OpModAssign,

    OpIncrement,
    OpDecrement,
}

impl TokenKind {
    /// 调试名称（树转储用）
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Invalid => "TokInvalid",
            TokenKind::Eof => "TokEOF",
            TokenKind::Whitespace => "TokWhitespace",
            TokenKind::Newline => "TokNewline",
            TokenKind::Comment => "TokComment",
            TokenKind::Id => "TokId",
            TokenKind::NumberLiteral => "TokNumberLiteral",
            TokenKind::StringLiteral => "TokStringLiteral",
            TokenKind::KwIn => "TokKwIn",
            TokenKind::KwIf => "TokKwIf",
            TokenKind::KwElse => "TokKwElse",
            TokenKind::KwFor => "TokKwFor",
            TokenKind::KwWhile => "TokKwWhile",
            TokenKind::KwBreak => "TokKwBreak",
            TokenKind::KwContinue => "TokKwContinue",
            TokenKind::KwFunction => "TokKwFunction",
            TokenKind::KwReturn => "TokKwReturn",
            TokenKind::Dot => "TokDot",
            TokenKind::Comma => "TokComma",
            TokenKind::Colon => "TokColon",
            TokenKind::Semicolon => "TokSemicolon",
            TokenKind::Pipe => "TokPipe",
            TokenKind::LeftParen => "TokLeftParen",
            TokenKind::RightParen => "TokRightParen",
            TokenKind::LeftBrace => "TokLeftBrace",
            TokenKind::RightBrace => "TokRightBrace",
            TokenKind::LeftBracket => "TokLeftBracket",
            TokenKind::RightBracket => "TokRightBracket",
            TokenKind::OpTernary => "TokOpTernary",
            TokenKind::OpNot => "TokOpNot",
            TokenKind::OpAnd => "TokOpAnd",
            TokenKind::OpOr => "TokOpOr",
            TokenKind::OpEquals => "TokOpEquals",
            TokenKind::OpNotEquals => "TokOpNotEquals",
            TokenKind::OpLessThan => "TokOpLessThan",
            TokenKind::OpLessThanOrEqual => "TokOpLessThanOrEqual",
            TokenKind::OpGreaterThan => "TokOpGreaterThan",
            TokenKind::OpGreaterThanOrEqual => "TokOpGreaterThanOrEqual",
            TokenKind::OpAdd => "TokOpAdd",
            TokenKind::OpSub => "TokOpSub",
            TokenKind::OpMul => "TokOpMul",
            TokenKind::OpDiv => "TokOpDiv",
            TokenKind::OpPow => "TokOpPow",
            TokenKind::OpMod => "TokOpMod",
            TokenKind::OpAssign => "TokOpAssign",
            TokenKind::OpAddAssign => "TokOpAddAssign",
            TokenKind::OpSubAssign => "TokOpSubAssign",
            TokenKind::OpMulAssign => "TokOpMulAssign",
            TokenKind::OpDivAssign => "TokOpDivAssign",
            TokenKind::OpPowAssign => "TokOpPowAssign",
            TokenKind::OpModAssign => "TokOpModAssign",
            TokenKind::OpIncrement => "TokOpIncrement",
            TokenKind::OpDecrement => "TokOpDecrement",
        }
    }

    /// 面向用户的拼写（诊断信息用）
    pub fn spelling(&self) -> &'static str {
        match self {
            TokenKind::Invalid => "invalid",
            TokenKind::Eof => "end of file",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::Comment => "comment",
            TokenKind::Id => "id",
            TokenKind::NumberLiteral => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::KwIn => "in",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwFor => "for",
            TokenKind::KwWhile => "while",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwFunction => "function",
            TokenKind::KwReturn => "return",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Pipe => "|",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::OpTernary => "?",
            TokenKind::OpNot => "!",
            TokenKind::OpAnd => "&&",
            TokenKind::OpOr => "||",
            TokenKind::OpEquals => "==",
            TokenKind::OpNotEquals => "!=",
            TokenKind::OpLessThan => "<",
            TokenKind::OpLessThanOrEqual => "<=",
            TokenKind::OpGreaterThan => ">",
            TokenKind::OpGreaterThanOrEqual => ">=",
            TokenKind::OpAdd => "+",
            TokenKind::OpSub => "-",
            TokenKind::OpMul => "*",
            TokenKind::OpDiv => "/",
            TokenKind::OpPow => "^",
            TokenKind::OpMod => "%",
            TokenKind::OpAssign => "=",
            TokenKind::OpAddAssign => "+=",
            TokenKind::OpSubAssign => "-=",
            TokenKind::OpMulAssign => "*=",
            TokenKind::OpDivAssign => "/=",
            TokenKind::OpPowAssign => "^=",
            TokenKind::OpModAssign => "%=",
            TokenKind::OpIncrement => "++",
            TokenKind::OpDecrement => "--",
        }
    }

    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "in" => TokenKind::KwIn,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "for" => TokenKind::KwFor,
            "while" => TokenKind::KwWhile,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "function" => TokenKind::KwFunction,
            "return" => TokenKind::KwReturn,
            _ => return None,
        };
        Some(kind)
    }

    pub fn symbol(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "." => TokenKind::Dot,
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            ";" => TokenKind::Semicolon,
            "|" => TokenKind::Pipe,
            "(" => TokenKind::LeftParen,
            ")" => TokenKind::RightParen,
            "{" => TokenKind::LeftBrace,
            "}" => TokenKind::RightBrace,
            "[" => TokenKind::LeftBracket,
            "]" => TokenKind::RightBracket,
            "?" => TokenKind::OpTernary,
            "!" => TokenKind::OpNot,
            "&&" => TokenKind::OpAnd,
            "||" => TokenKind::OpOr,
            "==" => TokenKind::OpEquals,
            "!=" => TokenKind::OpNotEquals,
            "<" => TokenKind::OpLessThan,
            "<=" => TokenKind::OpLessThanOrEqual,
            ">" => TokenKind::OpGreaterThan,
            ">=" => TokenKind::OpGreaterThanOrEqual,
            "+" => TokenKind::OpAdd,
            "-" => TokenKind::OpSub,
            "*" => TokenKind::OpMul,
            "/" => TokenKind::OpDiv,
            "^" => TokenKind::OpPow,
            "%" => TokenKind::OpMod,
            "=" => TokenKind::OpAssign,
            "+=" => TokenKind::OpAddAssign,
            "-=" => TokenKind::OpSubAssign,
            "*=" => TokenKind::OpMulAssign,
            "/=" => TokenKind::OpDivAssign,
            "^=" => TokenKind::OpPowAssign,
            "%=" => TokenKind::OpModAssign,
            "++" => TokenKind::OpIncrement,
            "--" => TokenKind::OpDecrement,
            _ => return None,
        };
        Some(kind)
    }

    /// 空白、换行和注释作为 trivia 挂在终结符上，不参与文法判断
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    /// 二元/三元运算符的优先级，越大结合越紧
    pub fn precedence(&self) -> Option<u8> {
        let p = match self {
            TokenKind::KwIn => 15,
            TokenKind::OpMul | TokenKind::OpDiv | TokenKind::OpPow | TokenKind::OpMod => 14,
            TokenKind::OpAdd | TokenKind::OpSub => 13,
            TokenKind::OpLessThan
            | TokenKind::OpLessThanOrEqual
            | TokenKind::OpGreaterThan
            | TokenKind::OpGreaterThanOrEqual => 12,
            TokenKind::OpEquals | TokenKind::OpNotEquals => 11,
            TokenKind::OpAnd => 10,
            TokenKind::OpOr => 9,
            TokenKind::OpTernary => 8,
            TokenKind::OpAssign
            | TokenKind::OpAddAssign
            | TokenKind::OpSubAssign
            | TokenKind::OpMulAssign
            | TokenKind::OpDivAssign
            | TokenKind::OpPowAssign
            | TokenKind::OpModAssign => 7,
            _ => return None,
        };
        Some(p)
    }

    pub fn is_binary_or_ternary(&self) -> bool {
        self.precedence().is_some()
    }

    /// 赋值族和三元运算符右结合
    pub fn is_right_associative(&self) -> bool {
        matches!(self.precedence(), Some(7) | Some(8))
    }

    pub fn is_assignment(&self) -> bool {
        self.precedence() == Some(7)
    }

    pub fn is_unary_prefix(&self) -> bool {
        matches!(
            self,
            TokenKind::OpNot | TokenKind::OpSub | TokenKind::OpIncrement | TokenKind::OpDecrement
        )
    }

    pub fn is_unary_postfix(&self) -> bool {
        matches!(self, TokenKind::OpIncrement | TokenKind::OpDecrement)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spelling())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_table() {
        assert!(TokenKind::OpMul.precedence() > TokenKind::OpAdd.precedence());
        assert!(TokenKind::OpAdd.precedence() > TokenKind::OpLessThan.precedence());
        assert!(TokenKind::OpEquals.precedence() > TokenKind::OpAnd.precedence());
        assert!(TokenKind::OpAnd.precedence() > TokenKind::OpOr.precedence());
        assert!(TokenKind::OpOr.precedence() > TokenKind::OpTernary.precedence());
        assert!(TokenKind::OpTernary.precedence() > TokenKind::OpModAssign.precedence());
        assert_eq!(TokenKind::KwIn.precedence(), Some(15));
        assert_eq!(TokenKind::Comma.precedence(), None);
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(TokenKind::symbol("^="), Some(TokenKind::OpPowAssign));
        assert_eq!(TokenKind::symbol("|"), Some(TokenKind::Pipe));
        assert_eq!(TokenKind::symbol("&"), None);
        assert_eq!(TokenKind::keyword("function"), Some(TokenKind::KwFunction));
        assert_eq!(TokenKind::keyword("func"), None);
    }

    #[test]
    fn test_unary_classes() {
        assert!(TokenKind::OpSub.is_unary_prefix());
        assert!(!TokenKind::OpSub.is_unary_postfix());
        assert!(TokenKind::OpIncrement.is_unary_postfix());
        assert!(TokenKind::OpAssign.is_right_associative());
        assert!(!TokenKind::OpSub.is_right_associative());
    }
}
