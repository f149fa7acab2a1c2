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

//! Expression parsing for the parser.
//!
//! This module provides expression parsing functionality:
//! - Assignment (right-associative) and the conditional operator
//! - Precedence climbing for binary and logical operators
//! - Unary, update and `new` expressions
//! - Postfix expressions (member access, calls)
//! - Primary expressions (literals, identifiers, grouping, array/object literals)

use super::blocks::BlockParser;
use super::helpers::ParserHelpers;
use super::Parser;
use crate::ast::{
    AssignOp, BinaryOp, Element, Expr, ExprKind, LogicalOp, Property, PropertyKey, UnaryOp,
    UpdateOp,
};
use crate::error::{ErrorCode, ScriptError, Span};
use crate::lexer::Token;

/// An operator handled by precedence climbing.
#[derive(Debug, Clone, Copy)]
enum InfixOp {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl InfixOp {
    fn precedence(&self) -> u8 {
        match self {
            InfixOp::Logical(LogicalOp::Or) => 1,
            InfixOp::Logical(LogicalOp::And) => 2,
            InfixOp::Binary(op) => op.precedence(),
        }
    }

    fn build(self, left: Expr, right: Expr) -> ExprKind {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            InfixOp::Logical(op) => ExprKind::Logical { left, op, right },
            InfixOp::Binary(op) => ExprKind::Binary { left, op, right },
        }
    }
}

/// Extension trait for expression parsing.
pub trait ExpressionParser {
    /// Parse an expression.
    fn parse_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Parse an assignment expression.
    fn parse_assignment_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Try to parse an assignment operator.
    fn try_parse_assign_op(&mut self) -> Option<AssignOp>;

    /// Parse a conditional (`?:`) expression.
    fn parse_conditional_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Parse binary and logical operators binding at least as tight as `min_precedence`.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expr, ScriptError>;

    /// Parse a unary expression.
    fn parse_unary_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Parse a postfix expression (member access, calls, postfix update).
    fn parse_postfix_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Parse a parenthesized argument list (after the opening paren).
    fn parse_arguments(&mut self) -> Result<(Vec<Element>, Span), ScriptError>;

    /// Parse a single array element or argument, possibly spread.
    fn parse_element(&mut self) -> Result<Element, ScriptError>;

    /// Parse a property name after `.` (identifiers and reserved words).
    fn parse_property_name(&mut self) -> Result<String, ScriptError>;

    /// Parse a primary expression.
    fn parse_primary_expression(&mut self) -> Result<Expr, ScriptError>;

    /// Parse an array literal (after the opening bracket).
    fn parse_array_literal(&mut self, start: Span) -> Result<Expr, ScriptError>;

    /// Parse an object literal (after the opening brace).
    fn parse_object_literal(&mut self, start: Span) -> Result<Expr, ScriptError>;
}

impl<'a> ExpressionParser for Parser<'a> {
    fn parse_expression(&mut self) -> Result<Expr, ScriptError> {
        self.nested(|parser| parser.parse_assignment_expression())
    }

    fn parse_assignment_expression(&mut self) -> Result<Expr, ScriptError> {
        let target = self.parse_conditional_expression()?;

        if let Some(op) = self.try_parse_assign_op() {
            let value = self.parse_expression()?;
            let span = target.span.merge(&value.span);
            return Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(target)
    }

    fn try_parse_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek()? {
            Token::Equal => AssignOp::Assign,
            Token::PlusAssign => AssignOp::AddAssign,
            Token::MinusAssign => AssignOp::SubAssign,
            Token::StarAssign => AssignOp::MulAssign,
            Token::SlashAssign => AssignOp::DivAssign,
            Token::PercentAssign => AssignOp::ModAssign,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_conditional_expression(&mut self) -> Result<Expr, ScriptError> {
        let condition = self.parse_binary_expression(1)?;

        if !self.match_token(&Token::Question) {
            return Ok(condition);
        }

        let consequent = self.parse_expression()?;
        self.expect(&Token::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.parse_expression()?;
        let span = condition.span.merge(&alternate.span);

        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expr, ScriptError> {
        let mut left = self.parse_unary_expression()?;

        while let Some(op) = self.peek().and_then(infix_operator) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let right = self.parse_binary_expression(precedence + 1)?;
            let span = left.span.merge(&right.span);
            left = Expr::new(op.build(left, right), span);
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expr, ScriptError> {
        let start = self.current_span();

        let op = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Negate),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.nested(|parser| parser.parse_unary_expression())?;
            let span = start.merge(&operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let update = match self.peek() {
            Some(Token::PlusPlus) => Some(UpdateOp::Increment),
            Some(Token::MinusMinus) => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let target = self.nested(|parser| parser.parse_unary_expression())?;
            let span = start.merge(&target.span);
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                },
                span,
            ));
        }

        if self.match_token(&Token::New) {
            let callee = self.nested(|parser| parser.parse_primary_expression())?;
            let (args, end) = if self.match_token(&Token::LeftParen) {
                self.parse_arguments()?
            } else {
                (Vec::new(), callee.span.clone())
            };
            return Ok(Expr::new(
                ExprKind::New {
                    callee: Box::new(callee),
                    args,
                },
                start.merge(&end),
            ));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            if self.match_token(&Token::Dot) {
                let name_span = self.current_span();
                let property = self.parse_property_name()?;
                let span = expr.span.merge(&name_span);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                    span,
                );
            } else if self.match_token(&Token::LeftBracket) {
                let index = self.parse_expression()?;
                let (_, end) = self.expect(&Token::RightBracket, "Expected ']' after index")?;
                let span = expr.span.merge(&end);
                expr = Expr::new(
                    ExprKind::ComputedMember {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.match_token(&Token::LeftParen) {
                let (args, end) = self.parse_arguments()?;
                let span = expr.span.merge(&end);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }

        // Postfix update binds only on the same line.
        let update = match self.peek() {
            Some(Token::PlusPlus) => Some(UpdateOp::Increment),
            Some(Token::MinusMinus) => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            if !self.line_break_before() {
                let end = self.current_span();
                self.advance();
                let span = expr.span.merge(&end);
                expr = Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        target: Box::new(expr),
                    },
                    span,
                );
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Element>, Span), ScriptError> {
        let mut args = Vec::new();

        if !self.check(&Token::RightParen) {
            loop {
                args.push(self.parse_element()?);
                if !self.match_token(&Token::Comma) || self.check(&Token::RightParen) {
                    break;
                }
            }
        }

        let (_, end) = self.expect(&Token::RightParen, "Expected ')' after arguments")?;
        Ok((args, end))
    }

    fn parse_element(&mut self) -> Result<Element, ScriptError> {
        if self.match_token(&Token::Ellipsis) {
            Ok(Element::Spread(self.parse_expression()?))
        } else {
            Ok(Element::Expr(self.parse_expression()?))
        }
    }

    fn parse_property_name(&mut self) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(token) if token.is_keyword() => {
                let name = token.as_str().to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(self
                .unexpected("Expected property name")
                .with_code(ErrorCode::ExpectedIdentifier)),
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expr, ScriptError> {
        let span = self.current_span();

        let kind = match self.peek() {
            Some(Token::Number(n)) => ExprKind::NumberLiteral(*n),
            Some(Token::String(s)) => ExprKind::StringLiteral(s.clone()),
            Some(Token::True) => ExprKind::BoolLiteral(true),
            Some(Token::False) => ExprKind::BoolLiteral(false),
            Some(Token::Null) => ExprKind::Null,
            Some(Token::Undefined) => ExprKind::Undefined,
            Some(Token::This) => ExprKind::This,
            Some(Token::Identifier(name)) => ExprKind::Identifier(name.clone()),
            Some(Token::LeftParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                let (_, end) = self.expect(&Token::RightParen, "Expected ')' after expression")?;
                return Ok(Expr::new(inner.kind, span.merge(&end)));
            }
            Some(Token::LeftBracket) => {
                self.advance();
                return self.parse_array_literal(span);
            }
            Some(Token::LeftBrace) => {
                self.advance();
                return self.parse_object_literal(span);
            }
            Some(Token::Function) => {
                let decl = self.parse_function()?;
                let span = decl.span.clone();
                return Ok(Expr::new(ExprKind::Function(decl), span));
            }
            _ => {
                return Err(self
                    .unexpected("Expected expression")
                    .with_code(ErrorCode::ExpectedExpression))
            }
        };

        self.advance();
        Ok(Expr::new(kind, span))
    }

    fn parse_array_literal(&mut self, start: Span) -> Result<Expr, ScriptError> {
        let mut elements = Vec::new();

        while !self.check(&Token::RightBracket) {
            elements.push(self.parse_element()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        let (_, end) = self.expect(&Token::RightBracket, "Expected ']' after array elements")?;
        Ok(Expr::new(ExprKind::Array(elements), start.merge(&end)))
    }

    fn parse_object_literal(&mut self, start: Span) -> Result<Expr, ScriptError> {
        let mut properties = Vec::new();

        while !self.check(&Token::RightBrace) {
            let entry_start = self.current_span();

            if self.match_token(&Token::Ellipsis) {
                properties.push(Property::Spread(self.parse_expression()?));
            } else {
                let key = match self.peek() {
                    Some(Token::String(s)) => {
                        let key = PropertyKey::String(s.clone());
                        self.advance();
                        key
                    }
                    Some(Token::Number(n)) => {
                        let key = PropertyKey::Number(*n);
                        self.advance();
                        key
                    }
                    Some(Token::LeftBracket) => {
                        self.advance();
                        let key = self.parse_expression()?;
                        self.expect(&Token::RightBracket, "Expected ']' after computed key")?;
                        PropertyKey::Computed(Box::new(key))
                    }
                    _ => PropertyKey::Identifier(self.parse_property_name()?),
                };

                let value = if self.match_token(&Token::Colon) {
                    self.parse_expression()?
                } else {
                    // Shorthand `{ name }` is only valid for plain identifiers.
                    match &key {
                        PropertyKey::Identifier(name) => Expr::new(
                            ExprKind::Identifier(name.clone()),
                            entry_start.merge(&self.previous_span()),
                        ),
                        _ => return Err(self.unexpected("Expected ':' after property key")),
                    }
                };

                let span = entry_start.merge(&value.span);
                properties.push(Property::KeyValue { key, value, span });
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        let (_, end) = self.expect(&Token::RightBrace, "Expected '}' after object properties")?;
        Ok(Expr::new(ExprKind::Object(properties), start.merge(&end)))
    }
}

/// Map the current token to an infix operator, if it is one.
fn infix_operator(token: &Token) -> Option<InfixOp> {
    let op = match token {
        Token::PipePipe => InfixOp::Logical(LogicalOp::Or),
        Token::AmpAmp => InfixOp::Logical(LogicalOp::And),
        Token::EqualEqual => InfixOp::Binary(BinaryOp::Equal),
        Token::BangEqual => InfixOp::Binary(BinaryOp::NotEqual),
        Token::EqualEqualEqual => InfixOp::Binary(BinaryOp::StrictEqual),
        Token::BangEqualEqual => InfixOp::Binary(BinaryOp::StrictNotEqual),
        Token::Less => InfixOp::Binary(BinaryOp::Less),
        Token::Greater => InfixOp::Binary(BinaryOp::Greater),
        Token::LessEqual => InfixOp::Binary(BinaryOp::LessEqual),
        Token::GreaterEqual => InfixOp::Binary(BinaryOp::GreaterEqual),
        Token::Plus => InfixOp::Binary(BinaryOp::Add),
        Token::Minus => InfixOp::Binary(BinaryOp::Sub),
        Token::Star => InfixOp::Binary(BinaryOp::Mul),
        Token::Slash => InfixOp::Binary(BinaryOp::Div),
        Token::Percent => InfixOp::Binary(BinaryOp::Mod),
        _ => return None,
    };
    Some(op)
}
