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

//! Statement AST nodes for the SheetScript runtime.

use std::rc::Rc;

use super::{Block, Expr};
use crate::error::Span;

/// A statement in the SheetScript language.
#[derive(Debug, Clone)]
pub struct Statement {
    /// The kind of statement.
    pub kind: StatementKind,
    /// The source span of this statement.
    pub span: Span,
}

impl Statement {
    /// Create a new statement.
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of statement.
#[derive(Debug, Clone)]
pub enum StatementKind {
    /// A lone `;`.
    Empty,

    /// A `{ ... }` block.
    Block(Block),

    /// An expression statement.
    Expression(Expr),

    /// A return statement.
    Return(Option<Expr>),

    /// A break statement with an optional label.
    Break(Option<String>),

    /// A continue statement with an optional label.
    Continue(Option<String>),

    /// An if statement.
    If(IfStatement),

    /// A `var`, `let` or `const` declaration.
    VarDecl(VarDecl),

    /// A function declaration.
    FunctionDecl(Rc<FunctionDecl>),

    /// A while loop.
    While(WhileStatement),

    /// A do-while loop.
    DoWhile(WhileStatement),

    /// A C-style for loop.
    For(ForStatement),

    /// A switch statement.
    Switch(SwitchStatement),

    /// `label: statement`.
    Labeled { label: String, body: Box<Statement> },

    /// `throw expr`.
    Throw(Expr),
}

impl StatementKind {
    /// The node kind name used in diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            StatementKind::Empty => "EmptyStatement",
            StatementKind::Block(_) => "BlockStatement",
            StatementKind::Expression(_) => "ExpressionStatement",
            StatementKind::Return(_) => "ReturnStatement",
            StatementKind::Break(_) => "BreakStatement",
            StatementKind::Continue(_) => "ContinueStatement",
            StatementKind::If(_) => "IfStatement",
            StatementKind::VarDecl(_) => "VariableDeclaration",
            StatementKind::FunctionDecl(_) => "FunctionDeclaration",
            StatementKind::While(_) => "WhileStatement",
            StatementKind::DoWhile(_) => "DoWhileStatement",
            StatementKind::For(_) => "ForStatement",
            StatementKind::Switch(_) => "SwitchStatement",
            StatementKind::Labeled { .. } => "LabeledStatement",
            StatementKind::Throw(_) => "ThrowStatement",
        }
    }
}

/// The declaration keyword of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    /// Get the keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A variable declaration (`let a = 1, b;`).
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// The declaration keyword.
    pub kind: DeclKind,
    /// The declared bindings.
    pub declarators: Vec<Declarator>,
    /// The source span.
    pub span: Span,
}

/// One binding in a declaration.
#[derive(Debug, Clone)]
pub struct Declarator {
    /// The bound name or pattern.
    pub target: BindingTarget,
    /// Optional initial value.
    pub init: Option<Expr>,
    /// The source span.
    pub span: Span,
}

/// The left-hand side of a declarator.
#[derive(Debug, Clone)]
pub enum BindingTarget {
    /// A simple name.
    Identifier(String),
    /// `{ a, b }` destructuring.
    ObjectPattern(Vec<String>),
    /// `[a, b]` destructuring.
    ArrayPattern(Vec<String>),
}

impl BindingTarget {
    /// The node kind name used in diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            BindingTarget::Identifier(_) => "Identifier",
            BindingTarget::ObjectPattern(_) => "ObjectPattern",
            BindingTarget::ArrayPattern(_) => "ArrayPattern",
        }
    }
}

/// A function declaration or expression.
///
/// Shared behind an `Rc` so function values can hold on to their body after
/// the declaring statement has finished executing.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// The function name (absent for anonymous functions).
    pub name: Option<String>,
    /// Parameter names in order.
    pub params: Vec<String>,
    /// The function body.
    pub body: Block,
    /// The source span.
    pub span: Span,
}

impl FunctionDecl {
    /// Create a new function declaration.
    pub fn new(name: Option<String>, params: Vec<String>, body: Block, span: Span) -> Self {
        Self {
            name,
            params,
            body,
            span,
        }
    }
}

/// An if statement.
#[derive(Debug, Clone)]
pub struct IfStatement {
    /// The condition.
    pub condition: Expr,
    /// The statement run when the condition is truthy.
    pub then_branch: Box<Statement>,
    /// The optional else branch.
    pub else_branch: Option<Box<Statement>>,
}

/// A while or do-while loop.
#[derive(Debug, Clone)]
pub struct WhileStatement {
    /// The loop condition.
    pub condition: Expr,
    /// The loop body.
    pub body: Box<Statement>,
}

/// The initializer clause of a for loop.
#[derive(Debug, Clone)]
pub enum ForInit {
    /// `for (let i = 0; ...)`
    VarDecl(VarDecl),
    /// `for (i = 0; ...)`
    Expression(Expr),
}

/// A C-style for loop.
#[derive(Debug, Clone)]
pub struct ForStatement {
    /// The optional initializer.
    pub init: Option<ForInit>,
    /// The optional loop condition (absent means always true).
    pub test: Option<Expr>,
    /// The optional update expression.
    pub update: Option<Expr>,
    /// The loop body.
    pub body: Box<Statement>,
}

/// A switch statement.
#[derive(Debug, Clone)]
pub struct SwitchStatement {
    /// The value being switched on.
    pub discriminant: Expr,
    /// The cases in source order.
    pub cases: Vec<SwitchCase>,
}

/// A `case` or `default` clause.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// The case value; `None` for `default`.
    pub test: Option<Expr>,
    /// The statements of this clause.
    pub consequent: Vec<Statement>,
    /// The source span.
    pub span: Span,
}
