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

//! Statement parsing for the parser.
//!
//! This module dispatches on the leading token of a statement and parses
//! declarations, labeled statements and expression statements. Control
//! flow lives in the `control_flow` module.

use super::blocks::BlockParser;
use super::control_flow::ControlFlowParser;
use super::expressions::ExpressionParser;
use super::helpers::ParserHelpers;
use super::Parser;
use crate::ast::{BindingTarget, DeclKind, Declarator, Statement, StatementKind, VarDecl};
use crate::error::{ErrorCode, ScriptError};
use crate::lexer::Token;

/// Extension trait for statement parsing.
pub trait StatementParser {
    /// Parse a single statement.
    fn parse_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a `var`/`let`/`const` declaration statement.
    fn parse_declaration_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a declaration without its trailing semicolon.
    fn parse_var_decl(&mut self) -> Result<VarDecl, ScriptError>;

    /// Parse a binding target: a name or an object/array pattern.
    fn parse_binding_target(&mut self) -> Result<BindingTarget, ScriptError>;

    /// Parse `label: statement`.
    fn parse_labeled_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse an expression statement.
    fn parse_expression_statement(&mut self) -> Result<Statement, ScriptError>;
}

impl<'a> StatementParser for Parser<'a> {
    fn parse_statement(&mut self) -> Result<Statement, ScriptError> {
        self.nested(|parser| match parser.peek() {
            Some(Token::Semicolon) => {
                let span = parser.current_span();
                parser.advance();
                Ok(Statement::new(StatementKind::Empty, span))
            }
            Some(Token::LeftBrace) => {
                let block = parser.parse_block()?;
                let span = block.span.clone();
                Ok(Statement::new(StatementKind::Block(block), span))
            }
            Some(Token::Var | Token::Let | Token::Const) => parser.parse_declaration_statement(),
            Some(Token::Function) => {
                let decl = parser.parse_function()?;
                let span = decl.span.clone();
                Ok(Statement::new(StatementKind::FunctionDecl(decl), span))
            }
            Some(Token::If) => parser.parse_if_statement(),
            Some(Token::While) => parser.parse_while_statement(),
            Some(Token::Do) => parser.parse_do_while_statement(),
            Some(Token::For) => parser.parse_for_statement(),
            Some(Token::Switch) => parser.parse_switch_statement(),
            Some(Token::Return) => parser.parse_return_statement(),
            Some(Token::Break | Token::Continue) => parser.parse_jump_statement(),
            Some(Token::Throw) => parser.parse_throw_statement(),
            Some(Token::Identifier(_)) if matches!(parser.peek_ahead(1), Some(Token::Colon)) => {
                parser.parse_labeled_statement()
            }
            _ => parser.parse_expression_statement(),
        })
    }

    fn parse_declaration_statement(&mut self) -> Result<Statement, ScriptError> {
        let decl = self.parse_var_decl()?;
        self.skip_semicolon();
        let span = decl.span.clone();
        Ok(Statement::new(StatementKind::VarDecl(decl), span))
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ScriptError> {
        let start = self.current_span();
        let kind = match self.advance() {
            Some((Token::Var, _)) => DeclKind::Var,
            Some((Token::Let, _)) => DeclKind::Let,
            Some((Token::Const, _)) => DeclKind::Const,
            _ => return Err(self.unexpected("Expected 'var', 'let' or 'const'")),
        };

        let mut declarators = Vec::new();
        loop {
            let target_start = self.current_span();
            let target = self.parse_binding_target()?;

            let init = if self.match_token(&Token::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };

            let needs_init = kind == DeclKind::Const
                || !matches!(target, BindingTarget::Identifier(_));
            if init.is_none() && needs_init {
                return Err(ScriptError::at(
                    ErrorCode::MissingInitializer,
                    format!("Missing initializer in {} declaration", kind),
                    target_start.merge(&self.previous_span()),
                ));
            }

            let span = target_start.merge(&self.previous_span());
            declarators.push(Declarator { target, init, span });

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        Ok(VarDecl {
            kind,
            declarators,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_binding_target(&mut self) -> Result<BindingTarget, ScriptError> {
        let (close, is_object) = match self.peek() {
            Some(Token::LeftBrace) => (Token::RightBrace, true),
            Some(Token::LeftBracket) => (Token::RightBracket, false),
            _ => {
                let (name, _) = self.expect_identifier("Expected variable name")?;
                return Ok(BindingTarget::Identifier(name));
            }
        };
        self.advance();

        let mut names = Vec::new();
        while !self.check(&close) {
            let (name, _) = self.expect_identifier("Expected name in pattern")?;
            names.push(name);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&close, "Expected end of pattern")?;

        Ok(if is_object {
            BindingTarget::ObjectPattern(names)
        } else {
            BindingTarget::ArrayPattern(names)
        })
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement, ScriptError> {
        let (label, start) = self.expect_identifier("Expected label")?;
        self.expect(&Token::Colon, "Expected ':' after label")?;
        let body = self.parse_statement()?;
        let span = start.merge(&body.span);
        Ok(Statement::new(
            StatementKind::Labeled {
                label,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ScriptError> {
        let expr = self.parse_expression()?;
        let span = expr.span.clone();
        self.skip_semicolon();
        Ok(Statement::new(StatementKind::Expression(expr), span))
    }
}
