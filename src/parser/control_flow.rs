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

//! Control flow statement parsing for the parser.
//!
//! This module provides parsing for:
//! - if/else statements
//! - while, do-while and C-style for loops
//! - switch statements
//! - return, break, continue and throw

use super::expressions::ExpressionParser;
use super::helpers::ParserHelpers;
use super::statements::StatementParser;
use super::Parser;
use crate::ast::{
    Expr, ForInit, ForStatement, IfStatement, Statement, StatementKind, SwitchCase, SwitchStatement,
    WhileStatement,
};
use crate::error::{ScriptError, Span};
use crate::lexer::Token;

/// Extension trait for control flow parsing.
pub trait ControlFlowParser {
    /// Parse an if statement with optional else branch.
    fn parse_if_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a while loop.
    fn parse_while_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a do-while loop.
    fn parse_do_while_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a C-style for loop.
    fn parse_for_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a switch statement.
    fn parse_switch_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a return statement.
    fn parse_return_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a break or continue statement with optional label.
    fn parse_jump_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse a throw statement.
    fn parse_throw_statement(&mut self) -> Result<Statement, ScriptError>;

    /// Parse `( expression )`.
    fn parse_parenthesized(&mut self, context: &str) -> Result<Expr, ScriptError>;

    /// Check whether the statement ends here without a semicolon.
    fn at_statement_end(&self) -> bool;
}

impl<'a> ControlFlowParser for Parser<'a> {
    fn parse_if_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::If, "Expected 'if'")?;
        let condition = self.parse_parenthesized("if")?;
        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.match_token(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map_or(then_branch.span.clone(), |branch| branch.span.clone());
        Ok(Statement::new(
            StatementKind::If(IfStatement {
                condition,
                then_branch,
                else_branch,
            }),
            start.merge(&end),
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::While, "Expected 'while'")?;
        let condition = self.parse_parenthesized("while")?;
        let body = Box::new(self.parse_statement()?);
        let span = start.merge(&body.span);
        Ok(Statement::new(
            StatementKind::While(WhileStatement { condition, body }),
            span,
        ))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::Do, "Expected 'do'")?;
        let body = Box::new(self.parse_statement()?);
        self.expect(&Token::While, "Expected 'while' after do body")?;
        let condition = self.parse_parenthesized("do-while")?;
        self.skip_semicolon();
        let span = start.merge(&self.previous_span());
        Ok(Statement::new(
            StatementKind::DoWhile(WhileStatement { condition, body }),
            span,
        ))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::For, "Expected 'for'")?;
        self.expect(&Token::LeftParen, "Expected '(' after 'for'")?;

        let init = match self.peek() {
            Some(Token::Semicolon) => None,
            Some(Token::Var | Token::Let | Token::Const) => Some(ForInit::VarDecl(self.parse_var_decl()?)),
            _ => Some(ForInit::Expression(self.parse_expression()?)),
        };
        self.expect(&Token::Semicolon, "Expected ';' after for initializer")?;

        let test = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Token::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(&Token::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Token::RightParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);
        let span = start.merge(&body.span);
        Ok(Statement::new(
            StatementKind::For(ForStatement {
                init,
                test,
                update,
                body,
            }),
            span,
        ))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::Switch, "Expected 'switch'")?;
        let discriminant = self.parse_parenthesized("switch")?;
        self.expect(&Token::LeftBrace, "Expected '{' after switch discriminant")?;

        let mut cases = Vec::new();
        while !self.check(&Token::RightBrace) {
            let case_start = self.current_span();
            let test = if self.match_token(&Token::Case) {
                Some(self.parse_expression()?)
            } else if self.match_token(&Token::Default) {
                None
            } else {
                return Err(self.unexpected("Expected 'case' or 'default'"));
            };
            self.expect(&Token::Colon, "Expected ':' after case label")?;

            let mut consequent = Vec::new();
            while !self.is_at_end()
                && !self.check(&Token::Case)
                && !self.check(&Token::Default)
                && !self.check(&Token::RightBrace)
            {
                consequent.push(self.parse_statement()?);
            }

            let span = case_start.merge(&self.previous_span());
            cases.push(SwitchCase {
                test,
                consequent,
                span,
            });
        }

        let (_, end) = self.expect(&Token::RightBrace, "Expected '}' after switch cases")?;
        Ok(Statement::new(
            StatementKind::Switch(SwitchStatement {
                discriminant,
                cases,
            }),
            start.merge(&end),
        ))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::Return, "Expected 'return'")?;

        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = value.as_ref().map_or(start.clone(), |expr| expr.span.clone());
        self.skip_semicolon();

        Ok(Statement::new(StatementKind::Return(value), start.merge(&end)))
    }

    fn parse_jump_statement(&mut self) -> Result<Statement, ScriptError> {
        let (keyword, start) = match self.advance() {
            Some(token @ (Token::Break, _)) | Some(token @ (Token::Continue, _)) => token,
            _ => return Err(self.unexpected("Expected 'break' or 'continue'")),
        };

        let mut end: Span = start.clone();
        let label = match self.peek() {
            Some(Token::Identifier(name)) if !self.line_break_before() => {
                let name = name.clone();
                end = self.current_span();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.skip_semicolon();

        let kind = if keyword == Token::Break {
            StatementKind::Break(label)
        } else {
            StatementKind::Continue(label)
        };
        Ok(Statement::new(kind, start.merge(&end)))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ScriptError> {
        let (_, start) = self.expect(&Token::Throw, "Expected 'throw'")?;
        let value = self.parse_expression()?;
        let span = start.merge(&value.span);
        self.skip_semicolon();
        Ok(Statement::new(StatementKind::Throw(value), span))
    }

    fn parse_parenthesized(&mut self, context: &str) -> Result<Expr, ScriptError> {
        self.expect(&Token::LeftParen, &format!("Expected '(' after '{}'", context))?;
        let expr = self.parse_expression()?;
        self.expect(&Token::RightParen, &format!("Expected ')' after {} condition", context))?;
        Ok(expr)
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Semicolon) | Some(Token::RightBrace))
            || self.line_break_before()
    }
}
