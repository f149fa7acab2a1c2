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

//! Expression AST nodes for the SheetScript runtime.

use std::rc::Rc;

use super::FunctionDecl;
use crate::error::Span;

/// An expression in the SheetScript language.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The kind of expression.
    pub kind: ExprKind,
    /// The source span of this expression.
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A number literal.
    NumberLiteral(f64),

    /// A string literal.
    StringLiteral(String),

    /// A boolean literal.
    BoolLiteral(bool),

    /// `null`.
    Null,

    /// `undefined`.
    Undefined,

    /// A variable reference.
    Identifier(String),

    /// `this`.
    This,

    /// An array literal.
    Array(Vec<Element>),

    /// An object literal.
    Object(Vec<Property>),

    /// A unary operation.
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `++x`, `x++`, `--x` or `x--`.
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },

    /// An assignment, simple or compound.
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// A binary operation.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// A short-circuiting logical operation.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// `condition ? consequent : alternate`.
    Conditional {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    /// Non-computed member access (`a.b`).
    Member { object: Box<Expr>, property: String },

    /// Computed member access (`a[b]`).
    ComputedMember { object: Box<Expr>, index: Box<Expr> },

    /// A call expression.
    Call { callee: Box<Expr>, args: Vec<Element> },

    /// `new Callee(args)`.
    New { callee: Box<Expr>, args: Vec<Element> },

    /// A function expression.
    Function(Rc<FunctionDecl>),
}

impl ExprKind {
    /// The node kind name used in diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_)
            | ExprKind::Null
            | ExprKind::Undefined => "Literal",
            ExprKind::Identifier(_) => "Identifier",
            ExprKind::This => "ThisExpression",
            ExprKind::Array(_) => "ArrayExpression",
            ExprKind::Object(_) => "ObjectExpression",
            ExprKind::Unary { .. } => "UnaryExpression",
            ExprKind::Update { .. } => "UpdateExpression",
            ExprKind::Assign { .. } => "AssignmentExpression",
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::Logical { .. } => "LogicalExpression",
            ExprKind::Conditional { .. } => "ConditionalExpression",
            ExprKind::Member { .. } | ExprKind::ComputedMember { .. } => "MemberExpression",
            ExprKind::Call { .. } => "CallExpression",
            ExprKind::New { .. } => "NewExpression",
            ExprKind::Function(_) => "FunctionExpression",
        }
    }
}

/// An array element or call argument, possibly spread.
#[derive(Debug, Clone)]
pub enum Element {
    /// A plain expression.
    Expr(Expr),
    /// `...expr`.
    Spread(Expr),
}

/// An entry in an object literal.
#[derive(Debug, Clone)]
pub enum Property {
    /// `key: value` (or the shorthand `key`).
    KeyValue {
        key: PropertyKey,
        value: Expr,
        span: Span,
    },
    /// `...expr`.
    Spread(Expr),
}

/// The key of an object literal entry.
#[derive(Debug, Clone)]
pub enum PropertyKey {
    /// A bare identifier key.
    Identifier(String),
    /// A string literal key.
    String(String),
    /// A number literal key.
    Number(f64),
    /// A computed key (`[expr]`).
    Computed(Box<Expr>),
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOp {
    /// Get the precedence of this operator (higher = binds tighter).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::StrictEqual
            | BinaryOp::StrictNotEqual => 3,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }

    /// Get a string representation of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

/// A short-circuiting logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Get a string representation of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT (`!x`).
    Not,
    /// Numeric conversion (`+x`).
    Plus,
    /// Arithmetic negation (`-x`).
    Negate,
}

impl UnaryOp {
    /// Get a string representation of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
        }
    }
}

/// An increment or decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    /// Get a string representation of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
        }
    }

    /// Get a string representation of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Expr(expr) => write!(f, "{}", expr),
            Element::Spread(expr) => write!(f, "...{}", expr),
        }
    }
}

fn write_list<T: std::fmt::Display>(f: &mut std::fmt::Formatter<'_>, items: &[T]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Binary and logical operations are fully parenthesized so precedence is visible.
impl std::fmt::Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprKind::NumberLiteral(n) => write!(f, "{}", n),
            ExprKind::StringLiteral(s) => write!(f, "{:?}", s),
            ExprKind::BoolLiteral(b) => write!(f, "{}", b),
            ExprKind::Null => write!(f, "null"),
            ExprKind::Undefined => write!(f, "undefined"),
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::This => write!(f, "this"),
            ExprKind::Array(elements) => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            ExprKind::Object(properties) => write!(f, "{{ {} properties }}", properties.len()),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op.as_str(), operand),
            ExprKind::Update { op, prefix, target } => {
                if *prefix {
                    write!(f, "{}{}", op.as_str(), target)
                } else {
                    write!(f, "{}{}", target, op.as_str())
                }
            }
            ExprKind::Assign { op, target, value } => {
                write!(f, "{} {} {}", target, op.as_str(), value)
            }
            ExprKind::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            ExprKind::Logical { left, op, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            ExprKind::Conditional {
                condition,
                consequent,
                alternate,
            } => write!(f, "({} ? {} : {})", condition, consequent, alternate),
            ExprKind::Member { object, property } => write!(f, "{}.{}", object, property),
            ExprKind::ComputedMember { object, index } => write!(f, "{}[{}]", object, index),
            ExprKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::New { callee, args } => {
                write!(f, "new {}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::Function(decl) => match &decl.name {
                Some(name) => write!(f, "function {}({})", name, decl.params.join(", ")),
                None => write!(f, "function ({})", decl.params.join(", ")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::new(ExprKind::NumberLiteral(n), Span::new(0, 1)))
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Less.precedence());
        assert!(BinaryOp::Less.precedence() > BinaryOp::StrictEqual.precedence());
    }

    #[test]
    fn test_compound_assign_ops() {
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert_eq!(AssignOp::AddAssign.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::ModAssign.binary_op(), Some(BinaryOp::Mod));
    }

    #[test]
    fn test_display_binary() {
        let expr = Expr::new(
            ExprKind::Binary {
                left: num(1.0),
                op: BinaryOp::Add,
                right: num(2.5),
            },
            Span::new(0, 7),
        );
        assert_eq!(expr.to_string(), "(1 + 2.5)");
    }

    #[test]
    fn test_node_names() {
        assert_eq!(ExprKind::This.node_name(), "ThisExpression");
        assert_eq!(ExprKind::Null.node_name(), "Literal");
    }
}
