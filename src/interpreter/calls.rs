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

//! Function and method calls.
//!
//! Callees are identifiers bound to interpreted or native functions, or
//! non-computed method calls on objects, host objects, strings and arrays.
//! Interpreted calls are bounded by the call depth limit in addition to the
//! step budget.

use std::rc::Rc;

use super::expressions::{check_property, computed_member_access, ExpressionEvaluator};
use super::scope::ScopeId;
use super::signal::Completion;
use super::statements::StatementExecutor;
use super::value::{format_number, Function, Value};
use super::Execution;
use crate::ast::{DeclKind, Element, Expr, ExprKind};
use crate::error::{ErrorCode, ScriptError};

/// Extension trait for call evaluation.
pub trait CallEvaluator {
    /// Evaluate a call expression.
    fn evaluate_call(
        &mut self,
        callee: &Expr,
        args: &[Element],
        scope: ScopeId,
    ) -> Result<Value, ScriptError>;

    /// Call a function value. `name` is used in error messages.
    fn call_value(&mut self, callee: &Value, name: &str, args: Vec<Value>)
        -> Result<Value, ScriptError>;

    /// Call an interpreted function.
    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>)
        -> Result<Value, ScriptError>;

    /// Call `object.method(args)`.
    fn call_method(
        &mut self,
        object: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError>;
}

impl CallEvaluator for Execution {
    fn evaluate_call(
        &mut self,
        callee: &Expr,
        args: &[Element],
        scope: ScopeId,
    ) -> Result<Value, ScriptError> {
        match &callee.kind {
            ExprKind::Identifier(name) => {
                check_property(name).map_err(|e| e.with_span_if_missing(&callee.span))?;
                let function = self.evaluate(callee, scope)?;
                let args = self.evaluate_elements(args, scope)?;
                let result = self.call_value(&function, name, args)?;
                self.charge_native_result(&function, result, callee)
            }
            ExprKind::Member { object, property } => {
                check_property(property).map_err(|e| e.with_span_if_missing(&callee.span))?;
                let object = self.evaluate(object, scope)?;
                let args = self.evaluate_elements(args, scope)?;
                let result = self
                    .call_method(&object, property, args)
                    .map_err(|e| e.with_span_if_missing(&callee.span))?;
                // Built-in methods such as `join` build strings too.
                self.charge_string(result, &callee.span)
            }
            ExprKind::ComputedMember { .. } => Err(computed_member_access(&callee.span)),
            _ => {
                let function = self.evaluate(callee, scope)?;
                let args = self.evaluate_elements(args, scope)?;
                let result = self.call_value(&function, &callee.to_string(), args)?;
                self.charge_native_result(&function, result, callee)
            }
        }
    }

    fn call_value(
        &mut self,
        callee: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Native(native) => native.invoke(&args),
            _ => Err(ScriptError::new(
                ErrorCode::NotAFunction,
                format!("{} is not a function", name),
            )),
        }
    }

    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        if !self.scopes.contains(function.closure) {
            return Err(ScriptError::new(
                ErrorCode::TypeError,
                format!(
                    "'{}' belongs to another script run and cannot be called",
                    function.name()
                ),
            ));
        }

        let depth = self.call_depth.get();
        if depth >= self.limits.max_call_depth {
            tracing::debug!(
                max_call_depth = self.limits.max_call_depth,
                function = function.name(),
                "call depth exhausted"
            );
            return Err(ScriptError::new(
                ErrorCode::MaxCallDepthExceeded,
                format!(
                    "Maximum call depth of {} exceeded in '{}'",
                    self.limits.max_call_depth,
                    function.name()
                ),
            ));
        }

        let scope = self.scopes.child(function.closure, true);
        let mut args = args.into_iter();
        for param in &function.decl.params {
            // Missing arguments are undefined; extra arguments are ignored.
            let value = args.next().unwrap_or_default();
            self.scopes.define(scope, param, DeclKind::Var, value)?;
        }

        self.call_depth.set(depth + 1);
        let result = self.execute_block(&function.decl.body.statements, scope);
        self.call_depth.set(depth);

        match result? {
            Completion::Return(value) => Ok(value),
            Completion::Normal(_) => Ok(Value::Undefined),
            signal => Err(ScriptError::new(
                ErrorCode::IllegalControlFlow,
                format!("Illegal {} statement in '{}'", signal.describe(), function.name()),
            )),
        }
    }

    fn call_method(
        &mut self,
        object: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        let not_a_function = || {
            ScriptError::new(
                ErrorCode::NotAFunction,
                format!("{}.{} is not a function", object.type_name(), method),
            )
        };

        match object {
            Value::Undefined | Value::Null => Err(ScriptError::new(
                ErrorCode::TypeError,
                format!("Cannot read properties of {} (reading '{}')", object, method),
            )),
            Value::Host(host) => {
                if let Some(result) = host.call(method, &args) {
                    return result;
                }
                match host.get(method) {
                    Some(function) if function.is_callable() => {
                        self.call_value(&function, method, args)
                    }
                    _ => Err(not_a_function()),
                }
            }
            Value::Object(entries) => match entries.get(method) {
                Some(function) if function.is_callable() => {
                    let function = function.clone();
                    self.call_value(&function, method, args)
                }
                _ => Err(not_a_function()),
            },
            Value::String(s) => string_method(s, method, &args).ok_or_else(not_a_function),
            Value::Array(items) => array_method(items, method, &args).ok_or_else(not_a_function),
            _ => Err(not_a_function()),
        }
    }
}

impl Execution {
    /// Strings returned by interpreted functions were already charged when
    /// they were built; native results are charged here.
    fn charge_native_result(
        &mut self,
        function: &Value,
        result: Value,
        callee: &Expr,
    ) -> Result<Value, ScriptError> {
        match function {
            Value::Native(_) => self.charge_string(result, &callee.span),
            _ => Ok(result),
        }
    }
}

/// Built-in string methods.
fn string_method(s: &str, method: &str, args: &[Value]) -> Option<Value> {
    let arg = || args.first().map(|v| v.to_string()).unwrap_or_default();
    let value = match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "includes" => Value::Bool(s.contains(arg().as_str())),
        "startsWith" => Value::Bool(s.starts_with(arg().as_str())),
        "endsWith" => Value::Bool(s.ends_with(arg().as_str())),
        _ => return None,
    };
    Some(value)
}

/// Built-in array methods.
fn array_method(items: &[Value], method: &str, args: &[Value]) -> Option<Value> {
    let needle = args.first().cloned().unwrap_or_default();
    let value = match method {
        "includes" => Value::Bool(items.iter().any(|item| item.same_value_zero(&needle))),
        "indexOf" => {
            let index = items.iter().position(|item| item.strict_equals(&needle));
            Value::Number(index.map_or(-1.0, |i| i as f64))
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    Value::Number(n) => format_number(*n),
                    other => other.to_string(),
                })
                .collect();
            Value::String(parts.join(&separator))
        }
        _ => return None,
    };
    Some(value)
}
