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

//! Abstract Syntax Tree (AST) definitions for the SheetScript runtime.
//!
//! This module defines the closed set of node kinds the parser produces.
//! The parser accepts a slightly larger grammar than the interpreter
//! executes; every kind still has a variant here so the interpreter's
//! dispatch stays exhaustive.

mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

use crate::error::Span;

/// A complete parsed script.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order.
    pub body: Vec<Statement>,
    /// The source span of the whole script.
    pub span: Span,
}

impl Program {
    /// Create a new program.
    pub fn new(body: Vec<Statement>, span: Span) -> Self {
        Self { body, span }
    }

    /// Check if the program has no statements.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A block of statements.
#[derive(Debug, Clone)]
pub struct Block {
    /// The statements in this block.
    pub statements: Vec<Statement>,
    /// The source span of this block.
    pub span: Span,
}

impl Block {
    /// Create a new block.
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    /// Create an empty block.
    pub fn empty(span: Span) -> Self {
        Self {
            statements: Vec::new(),
            span,
        }
    }

    /// Check if this block is empty.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_creation() {
        let block = Block::empty(Span::new(0, 2));
        assert!(block.is_empty());
        assert_eq!(block.span.start, 0);
    }

    #[test]
    fn test_block_with_statements() {
        let stmt = Statement::new(StatementKind::Empty, Span::new(1, 2));
        let block = Block::new(vec![stmt], Span::new(0, 3));
        assert!(!block.is_empty());
        assert_eq!(block.statements.len(), 1);
    }

    #[test]
    fn test_program_creation() {
        let program = Program::new(Vec::new(), Span::new(0, 0));
        assert!(program.is_empty());
    }
}
