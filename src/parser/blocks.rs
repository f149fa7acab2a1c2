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

//! Block and function parsing for the parser.
//!
//! This module provides parsing for `{ ... }` blocks and for function
//! declarations and expressions, which share the same syntax.

use std::rc::Rc;

use super::helpers::ParserHelpers;
use super::statements::StatementParser;
use super::Parser;
use crate::ast::{Block, FunctionDecl};
use crate::error::ScriptError;
use crate::lexer::Token;

/// Extension trait for block parsing.
pub trait BlockParser {
    /// Parse a `{ ... }` block, including the braces.
    fn parse_block(&mut self) -> Result<Block, ScriptError>;

    /// Parse statements until a closing brace or the end of input.
    fn parse_block_body(&mut self) -> Result<Block, ScriptError>;

    /// Parse `function name(params) { body }`. The name is optional.
    fn parse_function(&mut self) -> Result<Rc<FunctionDecl>, ScriptError>;

    /// Parse a parenthesized parameter list (after the opening paren).
    fn parse_parameters(&mut self) -> Result<Vec<String>, ScriptError>;
}

impl<'a> BlockParser for Parser<'a> {
    fn parse_block(&mut self) -> Result<Block, ScriptError> {
        let (_, start) = self.expect(&Token::LeftBrace, "Expected '{'")?;
        let body = self.parse_block_body()?;
        let (_, end) = self.expect(&Token::RightBrace, "Expected '}' after block")?;
        Ok(Block::new(body.statements, start.merge(&end)))
    }

    fn parse_block_body(&mut self) -> Result<Block, ScriptError> {
        let start = self.current_span();
        let mut statements = Vec::new();

        while !self.is_at_end() && !self.check(&Token::RightBrace) {
            statements.push(self.parse_statement()?);
        }

        let end = self.previous_span();
        Ok(Block::new(statements, start.merge(&end)))
    }

    fn parse_function(&mut self) -> Result<Rc<FunctionDecl>, ScriptError> {
        let (_, start) = self.expect(&Token::Function, "Expected 'function'")?;

        let name = match self.peek() {
            Some(Token::Identifier(_)) => Some(self.expect_identifier("Expected function name")?.0),
            _ => None,
        };

        self.expect(&Token::LeftParen, "Expected '(' after function name")?;
        let params = self.parse_parameters()?;
        let body = self.nested(|parser| parser.parse_block())?;
        let span = start.merge(&body.span);

        Ok(Rc::new(FunctionDecl::new(name, params, body, span)))
    }

    fn parse_parameters(&mut self) -> Result<Vec<String>, ScriptError> {
        let mut params = Vec::new();

        while !self.check(&Token::RightParen) {
            let (name, _) = self.expect_identifier("Expected parameter name")?;
            params.push(name);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(&Token::RightParen, "Expected ')' after parameters")?;
        Ok(params)
    }
}
