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

//! Lexer module for the SheetScript runtime.
//!
//! This module tokenizes formula source code into a stream of tokens.
//! It handles:
//! - Keywords and identifiers (identifiers may contain `$`)
//! - Number literals (decimal, fractional, exponent, `0x` hex)
//! - String literals in single or double quotes
//! - Operators and punctuation
//! - Line (`//`) and block (`/* */`) comments
//!
//! Token recognition is generated by `logos`; this module turns its output
//! into spanned tokens and classifies lexical failures.

mod numbers;
mod strings;
mod tokens;

pub use numbers::parse_numeric_literal;
pub use tokens::Token;

use logos::Logos;

use crate::error::{ErrorCode, ScriptError, Span};

/// Tokenize source code into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, ScriptError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(Token::Slash) if source[span.end..].starts_with('*') => {
                return Err(ScriptError::at(
                    ErrorCode::UnterminatedComment,
                    "Unterminated block comment",
                    Span::new(span.start, source.len()),
                ));
            }
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(classify_error(lexer.slice(), span)),
        }
    }

    Ok(tokens)
}

/// Turn a slice the lexer could not accept into a located error.
fn classify_error(slice: &str, span: Span) -> ScriptError {
    let mut chars = slice.chars();
    let first = chars.next().unwrap_or_default();

    match first {
        '"' | '\'' => {
            if slice.len() > 1 && slice.ends_with(first) {
                ScriptError::at(
                    ErrorCode::InvalidEscapeSequence,
                    format!("Invalid escape sequence in string literal {}", slice),
                    span,
                )
            } else {
                ScriptError::at(
                    ErrorCode::UnterminatedString,
                    "Unterminated string literal",
                    span,
                )
            }
        }
        c if c.is_ascii_digit() => ScriptError::at(
            ErrorCode::InvalidNumber,
            format!("Invalid number literal '{}'", slice),
            span,
        ),
        c => ScriptError::at(
            ErrorCode::InvalidCharacter,
            format!("Invalid character '{}'", c),
            span,
        ),
    }
}
