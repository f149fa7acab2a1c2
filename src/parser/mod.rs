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

//! Parser module for the SheetScript runtime.
//!
//! This module parses a token stream into an Abstract Syntax Tree (AST).
//! It uses recursive descent parsing with precedence climbing for binary
//! expressions. Semicolons are optional; a line break only matters after
//! `return`, `break` and `continue`.
//!
//! The parser is deliberately more permissive than the interpreter: it
//! builds nodes for constructs such as `do ... while`, `new` or
//! destructuring so that the interpreter can reject them with a precise
//! error instead of a generic syntax error.
//!
//! # Module Structure
//!
//! - `blocks` - Block and function parsing (BlockParser trait)
//! - `control_flow` - Control flow statement parsing (ControlFlowParser trait)
//! - `expressions` - Expression parsing (ExpressionParser trait)
//! - `helpers` - Token stream navigation and error handling (ParserHelpers trait)
//! - `statements` - Statement parsing (StatementParser trait)

// Submodules
pub mod blocks;
pub mod control_flow;
pub mod expressions;
pub mod helpers;
pub mod statements;

// Internal imports from submodules
use helpers::ParserHelpers;
use statements::StatementParser;

use crate::ast::Program;
use crate::error::{ScriptError, Span};
use crate::lexer::{tokenize, Token};

/// Maximum nesting of statements and expressions before parsing fails.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The parser state.
pub struct Parser<'a> {
    /// The token stream to parse.
    pub(crate) tokens: &'a [(Token, Span)],
    /// Current position in the token stream.
    pub(crate) position: usize,
    /// The source text, used to detect line breaks between tokens.
    pub(crate) source: Option<&'a str>,
    /// Current nesting depth.
    pub(crate) depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given token stream.
    pub fn new(tokens: &'a [(Token, Span)]) -> Self {
        Self {
            tokens,
            position: 0,
            source: None,
            depth: 0,
        }
    }

    /// Create a parser that also knows the source text the tokens came from.
    pub fn with_source(tokens: &'a [(Token, Span)], source: &'a str) -> Self {
        Self {
            source: Some(source),
            ..Self::new(tokens)
        }
    }

    // ========================================
    // Program Parsing
    // ========================================

    /// Parse the complete program.
    pub fn parse(&mut self) -> Result<Program, ScriptError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        let end = self.source.map_or_else(|| self.previous_span().end, str::len);
        Ok(Program::new(body, Span::new(0, end)))
    }
}

/// Parse a token stream into a program AST.
pub fn parse_tokens(tokens: &[(Token, Span)]) -> Result<Program, ScriptError> {
    Parser::new(tokens).parse()
}

/// Tokenize and parse source text into a program AST.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = tokenize(source)?;
    Parser::with_source(&tokens, source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AssignOp, BindingTarget, DeclKind, Element, ExprKind, ForInit, Property, PropertyKey,
        StatementKind,
    };
    use crate::error::ErrorCode;

    /// Parse a single expression statement and return its display form.
    fn parse_expr(source: &str) -> String {
        let program = parse(source).unwrap();
        match &program.body[0].kind {
            StatementKind::Expression(expr) => expr.to_string(),
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    // ========================================
    // Parser Creation Tests
    // ========================================

    #[test]
    fn test_parser_creation() {
        let tokens = vec![];
        let parser = Parser::new(&tokens);
        assert!(parser.is_at_end());
    }

    #[test]
    fn test_parser_peek() {
        let tokens = vec![
            (Token::Number(42.0), Span::new(0, 2)),
            (Token::Plus, Span::new(3, 4)),
        ];
        let parser = Parser::new(&tokens);
        assert_eq!(parser.peek(), Some(&Token::Number(42.0)));
    }

    #[test]
    fn test_parse_tokens_without_source() {
        let tokens = tokenize("1 + 2").unwrap();
        let program = parse_tokens(&tokens).unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.span, Span::new(0, 5));
    }

    // ========================================
    // Expression Parsing Tests
    // ========================================

    #[test]
    fn test_parse_precedence() {
        assert_eq!(parse_expr("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse_expr("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(parse_expr("1 - 2 - 3"), "((1 - 2) - 3)");
    }

    #[test]
    fn test_parse_logical_precedence() {
        assert_eq!(parse_expr("a || b && c"), "(a || (b && c))");
        assert_eq!(parse_expr("a < 1 === b > 2"), "((a < 1) === (b > 2))");
    }

    #[test]
    fn test_parse_conditional() {
        assert_eq!(parse_expr("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
    }

    #[test]
    fn test_parse_assignment_is_right_associative() {
        let program = parse("a = b += 2").unwrap();
        let StatementKind::Expression(expr) = &program.body[0].kind else {
            panic!("Expected expression statement");
        };
        match &expr.kind {
            ExprKind::Assign { op, value, .. } => {
                assert_eq!(*op, AssignOp::Assign);
                assert!(matches!(
                    value.kind,
                    ExprKind::Assign {
                        op: AssignOp::AddAssign,
                        ..
                    }
                ));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_and_update() {
        assert_eq!(parse_expr("-x + !y"), "(-x + !y)");
        assert_eq!(parse_expr("i++"), "i++");
        assert_eq!(parse_expr("--i"), "--i");
    }

    #[test]
    fn test_parse_member_and_call_chain() {
        assert_eq!(parse_expr("Math.max(1, ...xs).foo"), "Math.max(1, ...xs).foo");
        assert_eq!(parse_expr("a[0]"), "a[0]");
    }

    #[test]
    fn test_parse_keyword_property_names() {
        assert_eq!(parse_expr("self.default"), "self.default");
    }

    #[test]
    fn test_parse_array_literal() {
        let program = parse("[1, ...rest]").unwrap();
        let StatementKind::Expression(expr) = &program.body[0].kind else {
            panic!("Expected expression statement");
        };
        let ExprKind::Array(elements) = &expr.kind else {
            panic!("Expected array");
        };
        assert!(matches!(elements[0], Element::Expr(_)));
        assert!(matches!(elements[1], Element::Spread(_)));
    }

    #[test]
    fn test_parse_object_literal() {
        let program = parse("({ a: 1, 'b': 2, c, [d]: 4, 5: 5, ...e })").unwrap();
        let StatementKind::Expression(expr) = &program.body[0].kind else {
            panic!("Expected expression statement");
        };
        let ExprKind::Object(properties) = &expr.kind else {
            panic!("Expected object, got {:?}", expr.kind);
        };
        assert_eq!(properties.len(), 6);
        assert!(matches!(
            &properties[0],
            Property::KeyValue { key: PropertyKey::Identifier(k), .. } if k == "a"
        ));
        assert!(matches!(
            &properties[1],
            Property::KeyValue { key: PropertyKey::String(k), .. } if k == "b"
        ));
        assert!(matches!(
            &properties[2],
            Property::KeyValue { value, .. } if matches!(&value.kind, ExprKind::Identifier(n) if n == "c")
        ));
        assert!(matches!(
            &properties[3],
            Property::KeyValue { key: PropertyKey::Computed(_), .. }
        ));
        assert!(matches!(
            &properties[4],
            Property::KeyValue { key: PropertyKey::Number(_), .. }
        ));
        assert!(matches!(&properties[5], Property::Spread(_)));
    }

    // ========================================
    // Statement Parsing Tests
    // ========================================

    #[test]
    fn test_parse_declarations() {
        let program = parse("let a = 1, b; const c = 2; var d").unwrap();
        assert_eq!(program.body.len(), 3);
        let StatementKind::VarDecl(decl) = &program.body[0].kind else {
            panic!("Expected declaration");
        };
        assert_eq!(decl.kind, DeclKind::Let);
        assert_eq!(decl.declarators.len(), 2);
        assert!(decl.declarators[1].init.is_none());
    }

    #[test]
    fn test_parse_destructuring_patterns() {
        let program = parse("let { a, b } = o; let [x, y] = arr;").unwrap();
        let StatementKind::VarDecl(decl) = &program.body[0].kind else {
            panic!("Expected declaration");
        };
        assert!(matches!(
            &decl.declarators[0].target,
            BindingTarget::ObjectPattern(names) if names.len() == 2
        ));
        let StatementKind::VarDecl(decl) = &program.body[1].kind else {
            panic!("Expected declaration");
        };
        assert!(matches!(
            &decl.declarators[0].target,
            BindingTarget::ArrayPattern(_)
        ));
    }

    #[test]
    fn test_parse_const_requires_initializer() {
        let err = parse("const a;").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingInitializer);
    }

    #[test]
    fn test_parse_function_declaration() {
        let program = parse("function f(x, y) { return x * y; } f(2, 3)").unwrap();
        assert_eq!(program.body.len(), 2);
        let StatementKind::FunctionDecl(decl) = &program.body[0].kind else {
            panic!("Expected function declaration");
        };
        assert_eq!(decl.name.as_deref(), Some("f"));
        assert_eq!(decl.params, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(decl.body.statements.len(), 1);
    }

    #[test]
    fn test_parse_anonymous_function_declaration() {
        let program = parse("function () {}").unwrap();
        let StatementKind::FunctionDecl(decl) = &program.body[0].kind else {
            panic!("Expected function declaration");
        };
        assert!(decl.name.is_none());
    }

    #[test]
    fn test_parse_if_else_chain() {
        let program = parse("if (a) b; else if (c) { d } else e").unwrap();
        let StatementKind::If(stmt) = &program.body[0].kind else {
            panic!("Expected if statement");
        };
        let else_branch = stmt.else_branch.as_ref().unwrap();
        assert!(matches!(else_branch.kind, StatementKind::If(_)));
    }

    #[test]
    fn test_parse_loops() {
        let program =
            parse("while (i < 3) i++; do { i-- } while (i > 0); for (let j = 0; j < 3; j++) {}")
                .unwrap();
        assert!(matches!(program.body[0].kind, StatementKind::While(_)));
        assert!(matches!(program.body[1].kind, StatementKind::DoWhile(_)));
        let StatementKind::For(stmt) = &program.body[2].kind else {
            panic!("Expected for statement");
        };
        assert!(matches!(stmt.init, Some(ForInit::VarDecl(_))));
        assert!(stmt.test.is_some());
        assert!(stmt.update.is_some());
    }

    #[test]
    fn test_parse_empty_for_clauses() {
        let program = parse("for (;;) break;").unwrap();
        let StatementKind::For(stmt) = &program.body[0].kind else {
            panic!("Expected for statement");
        };
        assert!(stmt.init.is_none() && stmt.test.is_none() && stmt.update.is_none());
    }

    #[test]
    fn test_parse_switch() {
        let program = parse("switch (x) { case 1: a; case 2: b; break; default: c }").unwrap();
        let StatementKind::Switch(stmt) = &program.body[0].kind else {
            panic!("Expected switch");
        };
        assert_eq!(stmt.cases.len(), 3);
        assert_eq!(stmt.cases[1].consequent.len(), 2);
        assert!(stmt.cases[2].test.is_none());
    }

    #[test]
    fn test_parse_return_respects_line_break() {
        let program = parse("function f() { return\n1 }").unwrap();
        let StatementKind::FunctionDecl(decl) = &program.body[0].kind else {
            panic!("Expected function declaration");
        };
        assert!(matches!(decl.body.statements[0].kind, StatementKind::Return(None)));
        assert_eq!(decl.body.statements.len(), 2);
    }

    #[test]
    fn test_parse_labels() {
        let program = parse("outer: while (true) { break outer; }").unwrap();
        assert!(matches!(program.body[0].kind, StatementKind::Labeled { .. }));
    }

    #[test]
    fn test_parse_optional_semicolons() {
        let program = parse("let a = 1\nlet b = 2\na + b").unwrap();
        assert_eq!(program.body.len(), 3);
    }

    // ========================================
    // Error Tests
    // ========================================

    #[test]
    fn test_parse_error_missing_paren() {
        let err = parse("f(1, 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedEndOfInput);
    }

    #[test]
    fn test_parse_error_unexpected_token() {
        let err = parse("1 + * 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::ExpectedExpression);
        assert_eq!(err.start(), Some(4));
    }

    #[test]
    fn test_parse_error_nesting_too_deep() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.code, ErrorCode::NestingTooDeep);
    }
}
