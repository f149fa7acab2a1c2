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

//! Expression evaluation for the interpreter.
//!
//! This module provides expression evaluation:
//! - Literals, identifiers, array and object literals
//! - Unary, update, assignment, binary, logical and conditional operators
//! - Non-computed member access with the forbidden-property guard
//!
//! Calls are delegated to the `calls` module.

use std::collections::BTreeMap;

use super::calls::CallEvaluator;
use super::operators;
use super::scope::ScopeId;
use super::value::Value;
use super::{is_forbidden_property, Execution};
use crate::ast::{
    AssignOp, Element, Expr, ExprKind, LogicalOp, Property, PropertyKey, UpdateOp,
};
use crate::error::{ErrorCode, ScriptError, Span};

/// Extension trait for expression evaluation.
pub trait ExpressionEvaluator {
    /// Evaluate an expression, spending one step.
    fn evaluate(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError>;

    /// Evaluate an expression's kind without spending a step.
    fn evaluate_kind(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError>;

    /// Evaluate array elements or call arguments, expanding spreads.
    fn evaluate_elements(
        &mut self,
        elements: &[Element],
        scope: ScopeId,
    ) -> Result<Vec<Value>, ScriptError>;

    /// Evaluate an object literal.
    fn evaluate_object(
        &mut self,
        properties: &[Property],
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;

    /// Evaluate `++`/`--`.
    fn evaluate_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;

    /// Evaluate `=` and the compound assignment operators.
    fn evaluate_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;

    /// Evaluate `&&` / `||` with short-circuiting.
    fn evaluate_logical(
        &mut self,
        left: &Expr,
        op: LogicalOp,
        right: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;

    /// Evaluate `object.property`.
    fn evaluate_member(
        &mut self,
        object: &Expr,
        property: &str,
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;
}

impl ExpressionEvaluator for Execution {
    fn evaluate(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError> {
        self.tick(&expr.span)?;
        self.evaluate_kind(expr, scope)
            .map_err(|e| e.with_span_if_missing(&expr.span))
    }

    fn evaluate_kind(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError> {
        match &expr.kind {
            ExprKind::NumberLiteral(n) => Ok(Value::Number(*n)),
            ExprKind::StringLiteral(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLiteral(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Undefined => Ok(Value::Undefined),
            ExprKind::Identifier(name) => self.scopes.get(scope, name),
            ExprKind::Array(elements) => {
                let items = self.evaluate_elements(elements, scope)?;
                Ok(Value::array(items))
            }
            ExprKind::Object(properties) => self.evaluate_object(properties, scope),
            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand, scope)?;
                Ok(operators::unary(*op, &value))
            }
            ExprKind::Update { op, prefix, target } => {
                self.evaluate_update(*op, *prefix, target, scope)
            }
            ExprKind::Assign { op, target, value } => {
                self.evaluate_assign(*op, target, value, scope)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left, scope)?;
                let right = self.evaluate(right, scope)?;
                self.charge_string(operators::binary(*op, &left, &right), &expr.span)
            }
            ExprKind::Logical { left, op, right } => {
                self.evaluate_logical(left, *op, right, scope)
            }
            ExprKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate(condition, scope)?.is_truthy() {
                    self.evaluate(consequent, scope)
                } else {
                    self.evaluate(alternate, scope)
                }
            }
            ExprKind::Member { object, property } => {
                self.evaluate_member(object, property, scope)
            }
            ExprKind::ComputedMember { .. } => Err(computed_member_access(&expr.span)),
            ExprKind::Call { callee, args } => self.evaluate_call(callee, args, scope),
            // `this` has no receiver to bind to; host identity never leaks.
            ExprKind::This | ExprKind::New { .. } | ExprKind::Function(_) => {
                Err(ScriptError::at(
                    ErrorCode::UnsupportedNodeKind,
                    format!("{} is not supported", expr.kind.node_name()),
                    expr.span.clone(),
                ))
            }
        }
    }

    fn evaluate_elements(
        &mut self,
        elements: &[Element],
        scope: ScopeId,
    ) -> Result<Vec<Value>, ScriptError> {
        let mut values = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                Element::Expr(expr) => values.push(self.evaluate(expr, scope)?),
                Element::Spread(expr) => match self.evaluate(expr, scope)? {
                    Value::Array(items) => {
                        for item in items.iter() {
                            self.tick(&expr.span)?;
                            values.push(item.clone());
                        }
                    }
                    Value::String(s) => {
                        for c in s.chars() {
                            self.tick(&expr.span)?;
                            values.push(Value::String(c.to_string()));
                        }
                    }
                    other => {
                        return Err(ScriptError::at(
                            ErrorCode::TypeError,
                            format!("Spread of {} is not iterable", other.type_name()),
                            expr.span.clone(),
                        ))
                    }
                },
            }
        }

        Ok(values)
    }

    fn evaluate_object(
        &mut self,
        properties: &[Property],
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        let mut entries = BTreeMap::new();

        for property in properties {
            let (key, value, span) = match property {
                Property::KeyValue { key, value, span } => (key, value, span),
                Property::Spread(expr) => {
                    return Err(ScriptError::at(
                        ErrorCode::UnsupportedNodeKind,
                        "SpreadElement in object literals is not supported",
                        expr.span.clone(),
                    ))
                }
            };

            let name = match key {
                PropertyKey::Identifier(name) | PropertyKey::String(name) => name,
                PropertyKey::Number(_) | PropertyKey::Computed(_) => {
                    return Err(ScriptError::at(
                        ErrorCode::IllegalObjectKey,
                        "Object keys must be identifiers or string literals",
                        span.clone(),
                    ))
                }
            };
            if is_forbidden_property(name) {
                return Err(ScriptError::at(
                    ErrorCode::IllegalObjectKey,
                    format!("Object key '{}' is not allowed", name),
                    span.clone(),
                ));
            }

            let value = self.evaluate(value, scope)?;
            entries.insert(name.clone(), value);
        }

        Ok(Value::object(entries))
    }

    fn evaluate_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        let name = assignment_target(target)?;

        let old = match self.scopes.get(scope, name)? {
            Value::Number(n) => n,
            other => {
                return Err(ScriptError::at(
                    ErrorCode::TypeError,
                    format!(
                        "Cannot apply '{}' to '{}' of type {}",
                        op.as_str(),
                        name,
                        other.type_name()
                    ),
                    target.span.clone(),
                ))
            }
        };

        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.scopes.assign(scope, name, Value::Number(new))?;

        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn evaluate_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        let name = assignment_target(target)?;

        let value = match op.binary_op() {
            None => self.evaluate(value, scope)?,
            Some(binary) => {
                let current = self.scopes.get(scope, name)?;
                let rhs = self.evaluate(value, scope)?;
                self.charge_string(operators::binary(binary, &current, &rhs), &target.span)?
            }
        };

        self.scopes.assign(scope, name, value.clone())?;
        Ok(value)
    }

    fn evaluate_logical(
        &mut self,
        left: &Expr,
        op: LogicalOp,
        right: &Expr,
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        let left = self.evaluate(left, scope)?;
        let short_circuits = match op {
            LogicalOp::And => !left.is_truthy(),
            LogicalOp::Or => left.is_truthy(),
        };
        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(right, scope)
        }
    }

    fn evaluate_member(
        &mut self,
        object: &Expr,
        property: &str,
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        check_property(property)?;
        let object = self.evaluate(object, scope)?;
        get_member(&object, property)
    }
}

/// Reject forbidden property names.
pub(crate) fn check_property(property: &str) -> Result<(), ScriptError> {
    if is_forbidden_property(property) {
        return Err(ScriptError::new(
            ErrorCode::IllegalMemberAccess,
            format!("Access to '{}' is not allowed", property),
        ));
    }
    Ok(())
}

/// Read `object.property`.
pub fn get_member(object: &Value, property: &str) -> Result<Value, ScriptError> {
    check_property(property)?;

    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(ScriptError::new(
                ErrorCode::TypeError,
                format!("Cannot read properties of {} (reading '{}')", object, property),
            ))
        }
        Value::String(s) if property == "length" => Value::Number(s.chars().count() as f64),
        Value::Array(items) if property == "length" => Value::Number(items.len() as f64),
        Value::Object(entries) => entries.get(property).cloned().unwrap_or_default(),
        Value::Host(host) => host.get(property).unwrap_or_default(),
        _ => Value::Undefined,
    };

    Ok(value)
}

/// The identifier an assignment or update writes to.
fn assignment_target(target: &Expr) -> Result<&str, ScriptError> {
    match &target.kind {
        ExprKind::Identifier(name) => Ok(name),
        ExprKind::ComputedMember { .. } => Err(computed_member_access(&target.span)),
        _ => Err(ScriptError::at(
            ErrorCode::IllegalAssignmentTarget,
            format!("Cannot assign to {}", target.kind.node_name()),
            target.span.clone(),
        )),
    }
}

pub(crate) fn computed_member_access(span: &Span) -> ScriptError {
    ScriptError::at(
        ErrorCode::IllegalMemberAccess,
        "Computed member access is not allowed",
        span.clone(),
    )
    .with_hint("use non-computed access such as `object.property`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{Environment, ScriptInterpreter};

    fn run(source: &str) -> Result<Value, ScriptError> {
        ScriptInterpreter::new().run_script(source, &Environment::new())
    }

    // ========================================
    // Literal Tests
    // ========================================

    #[test]
    fn test_literals() {
        assert_eq!(run("'a' + \"b\"").unwrap(), Value::from("ab"));
        assert_eq!(run("null").unwrap(), Value::Null);
        assert_eq!(run("undefined").unwrap(), Value::Undefined);
        assert_eq!(run("0x1F").unwrap(), Value::from(31));
    }

    #[test]
    fn test_array_spread() {
        let value = run("let xs = [2, 3]; [1, ...xs, ...'ab']").unwrap();
        assert_eq!(value.to_string(), "1,2,3,a,b");
        let err = run("[...5]").unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeError);
    }

    #[test]
    fn test_object_literal() {
        let value = run("let c = 3; let o = { a: 1, 'b': 2, c }; o.a + o.b + o.c").unwrap();
        assert_eq!(value, Value::from(6));
        assert_eq!(run("({ a: 1 }).missing").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_object_literal_illegal_keys() {
        for source in ["({ 1: 2 })", "({ [k]: 2 })", "({ __proto__: 1 })", "({ 'constructor': 1 })"] {
            let err = run(source).unwrap_err();
            assert_eq!(err.code, ErrorCode::IllegalObjectKey, "{}", source);
        }
    }

    // ========================================
    // Operator Tests
    // ========================================

    #[test]
    fn test_update_expressions() {
        assert_eq!(run("let i = 1; i++").unwrap(), Value::from(1));
        assert_eq!(run("let i = 1; ++i").unwrap(), Value::from(2));
        assert_eq!(run("let i = 1; i--; i").unwrap(), Value::from(0));
    }

    #[test]
    fn test_update_requires_number() {
        let err = run("let s = 'a'; s++").unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeError);
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(run("let s = 'a'; s += 1; s").unwrap(), Value::from("a1"));
        assert_eq!(run("let n = 10; n -= '4'; n").unwrap(), Value::from(6));
        assert_eq!(run("let n = 3; n *= 2; n /= 4; n").unwrap(), Value::from(1.5));
        assert_eq!(run("let n = 7; n %= 4").unwrap(), Value::from(3));
    }

    #[test]
    fn test_illegal_assignment_targets() {
        let err = run("let o = {}; o.a = 1").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalAssignmentTarget);
        let err = run("1 = 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalAssignmentTarget);
        let err = run("missing = 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::UndefinedVariable);
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(run("0 || 'x'").unwrap(), Value::from("x"));
        assert_eq!(run("'' && missing").unwrap(), Value::from(""));
        assert_eq!(run("1 && 2").unwrap(), Value::from(2));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(run("let a = 3; a > 2 ? 'big' : 'small'").unwrap(), Value::from("big"));
    }

    // ========================================
    // Member Access Tests
    // ========================================

    #[test]
    fn test_length() {
        assert_eq!(run("'héllo'.length").unwrap(), Value::from(5));
        assert_eq!(run("[1, 2, 3].length").unwrap(), Value::from(3));
    }

    #[test]
    fn test_member_of_undefined() {
        let err = run("let u; u.x").unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeError);
    }

    #[test]
    fn test_forbidden_members() {
        for source in ["({}).__proto__", "'a'.constructor", "let o = {}; o.prototype"] {
            let err = run(source).unwrap_err();
            assert_eq!(err.code, ErrorCode::IllegalMemberAccess, "{}", source);
        }
    }

    #[test]
    fn test_computed_member_is_rejected() {
        let err = run("let a = [1]; a[0]").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalMemberAccess);
        assert_eq!(err.start(), Some(13));
    }

    #[test]
    fn test_unsupported_expressions() {
        for source in ["this", "new Foo()", "let f = function () {}"] {
            let err = run(source).unwrap_err();
            assert_eq!(err.code, ErrorCode::UnsupportedNodeKind, "{}", source);
        }
    }

    #[test]
    fn test_get_member_on_host_values() {
        let object = Value::object(BTreeMap::from([("k".to_string(), Value::from(1))]));
        assert_eq!(get_member(&object, "k").unwrap(), Value::from(1));
        assert_eq!(get_member(&Value::from(1), "k").unwrap(), Value::Undefined);
        assert_eq!(
            get_member(&object, "constructor").unwrap_err().code,
            ErrorCode::IllegalMemberAccess
        );
    }
}
