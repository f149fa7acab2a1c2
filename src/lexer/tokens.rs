// SheetScript - A sandboxed formula scripting runtime for character sheets
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Token definitions for the SheetScript language.

use logos::Logos;

use super::{numbers, strings};

/// A token in the SheetScript language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // Literals
    /// Number literal (decimal, fractional, exponent or `0x` hex).
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", numbers::decimal)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", numbers::decimal)]
    #[regex(r"0[xX][0-9a-fA-F]+", numbers::hex)]
    Number(f64),
    /// String literal, single or double quoted, escapes already decoded.
    #[regex(r#""([^"\\\n]|\\.)*""#, strings::unescape)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, strings::unescape)]
    String(String),
    /// Identifier (variable or function name). `$` is a valid identifier character.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Declaration keywords
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("function")]
    Function,

    // Control flow keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("throw")]
    Throw,

    // Expression keywords
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    // Arithmetic operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // Comparison operators
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("===")]
    EqualEqualEqual,
    #[token("!==")]
    BangEqualEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,

    // Logical operators
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // Assignment operators
    #[token("=")]
    Equal,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,

    // Punctuation
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
}

impl Token {
    /// Check if this token is a reserved word.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Var
                | Token::Let
                | Token::Const
                | Token::Function
                | Token::If
                | Token::Else
                | Token::While
                | Token::Do
                | Token::For
                | Token::Switch
                | Token::Case
                | Token::Default
                | Token::Break
                | Token::Continue
                | Token::Return
                | Token::Throw
                | Token::New
                | Token::This
                | Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
        )
    }

    /// Check if this token is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
                | Token::PercentAssign
        )
    }

    /// The source text of a fixed token, or a description for literals.
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Number(_) => "number",
            Token::String(_) => "string",
            Token::Identifier(_) => "identifier",
            Token::Var => "var",
            Token::Let => "let",
            Token::Const => "const",
            Token::Function => "function",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::For => "for",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Return => "return",
            Token::Throw => "throw",
            Token::New => "new",
            Token::This => "this",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Undefined => "undefined",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::EqualEqual => "==",
            Token::BangEqual => "!=",
            Token::EqualEqualEqual => "===",
            Token::BangEqualEqual => "!==",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Bang => "!",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Equal => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::PercentAssign => "%=",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Question => "?",
            Token::Dot => ".",
            Token::Ellipsis => "...",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            other => write!(f, "'{}'", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_win_over_identifiers() {
        let mut lex = Token::lexer("let letter");
        assert_eq!(lex.next(), Some(Ok(Token::Let)));
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("letter".to_string()))));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_longest_operator_match() {
        let tokens: Vec<_> = Token::lexer("=== !== ++ += ...").map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::EqualEqualEqual,
                Token::BangEqualEqual,
                Token::PlusPlus,
                Token::PlusAssign,
                Token::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::RightParen.to_string(), "')'");
        assert_eq!(Token::Identifier("x".into()).to_string(), "identifier 'x'");
    }

    #[test]
    fn test_is_keyword() {
        assert!(Token::Function.is_keyword());
        assert!(!Token::Identifier("fn".into()).is_keyword());
        assert!(Token::PercentAssign.is_assignment());
    }
}
