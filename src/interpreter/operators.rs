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

//! Operator semantics.
//!
//! Operators never fail: like JavaScript, mismatched operands coerce and
//! produce `NaN` or `false` instead of an error.

use super::value::Value;
use crate::ast::{BinaryOp, UnaryOp};

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Bool(!operand.is_truthy()),
        UnaryOp::Plus => Value::Number(operand.to_number()),
        UnaryOp::Negate => Value::Number(-operand.to_number()),
    }
}

/// Apply a binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        // `%` on f64 truncates like JavaScript's remainder.
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Equal => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEqual => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEqual => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEqual => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::LessEqual => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::GreaterEqual => Value::Bool(compare(left, right, |o| o.is_ge())),
    }
}

/// `+`: concatenates when either operand is a string or a non-primitive,
/// adds numerically otherwise.
pub fn add(left: &Value, right: &Value) -> Value {
    let concatenates = |v: &Value| matches!(v, Value::String(_)) || !v.is_primitive();
    if concatenates(left) || concatenates(right) {
        Value::String(format!("{}{}", left, right))
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

/// Relational comparison. Two strings compare lexicographically, anything
/// else numerically; `NaN` on either side makes every comparison false.
fn compare(left: &Value, right: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return accept(a.cmp(b));
    }
    left.to_number()
        .partial_cmp(&right.to_number())
        .is_some_and(accept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test_case(BinaryOp::Add, num(1.0), num(2.0), num(3.0) ; "add numbers")]
    #[test_case(BinaryOp::Add, Value::from("a"), num(1.0), Value::from("a1") ; "add string and number")]
    #[test_case(BinaryOp::Add, num(1.0), Value::from("1"), Value::from("11") ; "add number and string")]
    #[test_case(BinaryOp::Add, Value::Bool(true), num(1.0), num(2.0) ; "add bool and number")]
    #[test_case(BinaryOp::Add, Value::Null, num(1.0), num(1.0) ; "add null")]
    #[test_case(BinaryOp::Sub, Value::from("5"), num(2.0), num(3.0) ; "sub coerces strings")]
    #[test_case(BinaryOp::Mul, num(4.0), num(2.5), num(10.0) ; "mul")]
    #[test_case(BinaryOp::Div, num(1.0), num(0.0), num(f64::INFINITY) ; "div by zero")]
    #[test_case(BinaryOp::Mod, num(-7.0), num(3.0), num(-1.0) ; "mod keeps sign")]
    #[test_case(BinaryOp::Less, Value::from("a"), Value::from("b"), Value::Bool(true) ; "string less")]
    #[test_case(BinaryOp::Less, Value::from("10"), num(9.0), Value::Bool(false) ; "mixed less is numeric")]
    #[test_case(BinaryOp::GreaterEqual, num(2.0), num(2.0), Value::Bool(true) ; "greater equal")]
    #[test_case(BinaryOp::Equal, num(1.0), Value::from("1"), Value::Bool(true) ; "loose equal")]
    #[test_case(BinaryOp::StrictEqual, num(1.0), Value::from("1"), Value::Bool(false) ; "strict equal")]
    #[test_case(BinaryOp::StrictNotEqual, Value::Null, Value::Undefined, Value::Bool(true) ; "strict not equal nullish")]
    fn test_binary(op: BinaryOp, left: Value, right: Value, expected: Value) {
        assert_eq!(binary(op, &left, &right), expected);
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let nan = num(f64::NAN);
        assert_eq!(binary(BinaryOp::Less, &nan, &num(1.0)), Value::Bool(false));
        assert_eq!(binary(BinaryOp::GreaterEqual, &nan, &num(1.0)), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Equal, &nan, &nan), Value::Bool(false));
    }

    #[test]
    fn test_add_concatenates_arrays() {
        let array = Value::array(vec![num(1.0), num(2.0)]);
        assert_eq!(add(&array, &num(3.0)), Value::from("1,23"));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Not, &num(0.0)), Value::Bool(true));
        assert_eq!(unary(UnaryOp::Plus, &Value::from("4")), num(4.0));
        assert_eq!(unary(UnaryOp::Negate, &Value::from("4")), num(-4.0));
        assert!(unary(UnaryOp::Plus, &Value::from("x"))
            .as_number()
            .is_some_and(f64::is_nan));
    }
}
