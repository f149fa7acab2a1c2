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

//! Parser helper methods for token stream navigation and error handling.
//!
//! This module provides utility methods for the parser including:
//! - Token stream navigation (peek, advance, check)
//! - Token matching and expectation
//! - Line break detection for semicolon-free statements
//! - Nesting depth guarding
//! - Error creation

use super::{Parser, MAX_NESTING_DEPTH};
use crate::error::{ErrorCode, ScriptError, Span};
use crate::lexer::Token;

/// Trait for parser helper operations.
pub trait ParserHelpers<'a> {
    /// Check if we've reached the end of the token stream.
    fn is_at_end(&self) -> bool;

    /// Peek at the current token without advancing.
    fn peek(&self) -> Option<&Token>;

    /// Peek at the current token's span.
    fn peek_span(&self) -> Option<Span>;

    /// Peek at a token ahead by n positions.
    fn peek_ahead(&self, n: usize) -> Option<&Token>;

    /// Get the previous token's span (for error reporting).
    fn previous_span(&self) -> Span;

    /// Span of the current token, or an empty span at the end of input.
    fn current_span(&self) -> Span;

    /// Advance to the next token and return the current one.
    fn advance(&mut self) -> Option<(Token, Span)>;

    /// Check if the current token matches the expected type.
    fn check(&self, expected: &Token) -> bool;

    /// Consume the current token if it matches the expected type.
    fn match_token(&mut self, expected: &Token) -> bool;

    /// Expect the current token to match, or return an error.
    fn expect(&mut self, expected: &Token, message: &str) -> Result<(Token, Span), ScriptError>;

    /// Expect an identifier and return its name.
    fn expect_identifier(&mut self, message: &str) -> Result<(String, Span), ScriptError>;

    /// Consume an optional `;`.
    fn skip_semicolon(&mut self);

    /// Check if a line break separates the previous and the current token.
    fn line_break_before(&self) -> bool;

    /// Run `f` one nesting level deeper, failing if the limit is exceeded.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError>;

    /// Create an error at the current position.
    fn error(&self, code: ErrorCode, message: impl Into<String>) -> ScriptError;

    /// Create an "unexpected token" error for the current position.
    fn unexpected(&self, message: &str) -> ScriptError;
}

impl<'a> ParserHelpers<'a> for Parser<'a> {
    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.position).map(|(_, s)| s.clone())
    }

    fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n).map(|(t, _)| t)
    }

    fn previous_span(&self) -> Span {
        if self.position > 0 {
            self.tokens[self.position - 1].1.clone()
        } else if !self.tokens.is_empty() {
            self.tokens[0].1.clone()
        } else {
            Span::new(0, 0)
        }
    }

    fn current_span(&self) -> Span {
        self.peek_span().unwrap_or_else(|| {
            let end = self.previous_span().end;
            Span::new(end, end)
        })
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        if self.is_at_end() {
            None
        } else {
            let result = self.tokens[self.position].clone();
            self.position += 1;
            Some(result)
        }
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, message: &str) -> Result<(Token, Span), ScriptError> {
        match self.advance_if(expected) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(message)),
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<(String, Span), ScriptError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                let span = self.current_span();
                self.advance();
                Ok((name, span))
            }
            _ => Err(self
                .unexpected(message)
                .with_hint("identifiers start with a letter, '_' or '$'")
                .with_code(ErrorCode::ExpectedIdentifier)),
        }
    }

    fn skip_semicolon(&mut self) {
        self.match_token(&Token::Semicolon);
    }

    fn line_break_before(&self) -> bool {
        let (Some(source), Some(current)) = (self.source, self.peek_span()) else {
            return false;
        };
        if self.position == 0 {
            return false;
        }
        let previous_end = self.previous_span().end;
        source
            .get(previous_end..current.start)
            .is_some_and(|gap| gap.contains('\n'))
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(
                ErrorCode::NestingTooDeep,
                format!("Nesting exceeds the maximum depth of {}", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> ScriptError {
        ScriptError::at(code, message, self.current_span())
    }

    fn unexpected(&self, message: &str) -> ScriptError {
        match self.peek() {
            Some(token) => self.error(
                ErrorCode::UnexpectedToken,
                format!("{}, found {}", message, token),
            ),
            None => self.error(
                ErrorCode::UnexpectedEndOfInput,
                format!("{}, found end of input", message),
            ),
        }
    }
}

impl<'a> Parser<'a> {
    /// Advance past the current token if it matches.
    fn advance_if(&mut self, expected: &Token) -> Option<(Token, Span)> {
        if self.check(expected) {
            self.advance()
        } else {
            None
        }
    }
}
