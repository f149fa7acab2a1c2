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

//! The global function and constant table every script starts with.

use std::collections::BTreeMap;

use crate::error::{ErrorCode, ScriptError};
use crate::interpreter::{Environment, Value};

/// Names bound at the top level of every script, besides `Math`.
pub const GLOBAL_FUNCTIONS: [&str; 12] = [
    "abs", "ceil", "floor", "round", "trunc", "min", "max", "clamp", "Number", "String", "Boolean",
    "isNaN",
];

type Unary = fn(f64) -> f64;

/// Single-argument numeric functions shared by `Math` and the global table.
const UNARY_FUNCTIONS: [(&str, Unary); 7] = [
    ("abs", f64::abs),
    ("ceil", f64::ceil),
    ("floor", f64::floor),
    ("round", js_round),
    ("trunc", f64::trunc),
    ("sign", js_sign),
    ("sqrt", f64::sqrt),
];

/// Build the global environment.
pub fn global_environment() -> Environment {
    let mut env = Environment::new();

    for (name, f) in UNARY_FUNCTIONS {
        if GLOBAL_FUNCTIONS.contains(&name) {
            env.insert(name, unary(name, f));
        }
    }
    env.insert("min", Value::native("min", min));
    env.insert("max", Value::native("max", max));
    env.insert("clamp", Value::native("clamp", clamp));
    env.insert(
        "Number",
        Value::native("Number", |args: &[Value]| Ok(Value::Number(number_arg(args, 0)))),
    );
    env.insert(
        "String",
        Value::native("String", |args: &[Value]| {
            Ok(Value::String(
                args.first().map(Value::to_string).unwrap_or_default(),
            ))
        }),
    );
    env.insert(
        "Boolean",
        Value::native("Boolean", |args: &[Value]| {
            Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
        }),
    );
    env.insert(
        "isNaN",
        Value::native("isNaN", |args: &[Value]| {
            Ok(Value::Bool(number_arg(args, 0).is_nan()))
        }),
    );
    env.insert("Math", math_object());

    env
}

/// The `Math` object.
fn math_object() -> Value {
    let mut math = BTreeMap::new();

    for (name, f) in UNARY_FUNCTIONS {
        math.insert(name.to_string(), unary(name, f));
    }
    math.insert("min".to_string(), Value::native("min", min));
    math.insert("max".to_string(), Value::native("max", max));
    math.insert("clamp".to_string(), Value::native("clamp", clamp));
    math.insert(
        "pow".to_string(),
        Value::native("pow", |args: &[Value]| {
            Ok(Value::Number(number_arg(args, 0).powf(number_arg(args, 1))))
        }),
    );
    math.insert("PI".to_string(), Value::Number(std::f64::consts::PI));
    math.insert("E".to_string(), Value::Number(std::f64::consts::E));

    Value::object(math)
}

fn unary(name: &str, f: Unary) -> Value {
    Value::native(name, move |args: &[Value]| Ok(Value::Number(f(number_arg(args, 0)))))
}

/// Argument `index` coerced to a number; missing arguments are `NaN`.
fn number_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

/// Rounds half toward positive infinity.
/// Rounds half up. `n - floor` is exact, unlike `n + 0.5`, which can
/// carry values just below one half over to the next integer.
fn js_round(n: f64) -> f64 {
    if !n.is_finite() {
        return n;
    }
    let floor = n.floor();
    let rounded = if n - floor >= 0.5 { floor + 1.0 } else { floor };
    if rounded == 0.0 {
        0.0f64.copysign(n)
    } else {
        rounded
    }
}

fn js_sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        n
    } else {
        n.signum()
    }
}

fn min(args: &[Value]) -> Result<Value, ScriptError> {
    Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)))
}

fn max(args: &[Value]) -> Result<Value, ScriptError> {
    Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))
}

/// Fold the arguments as numbers; any `NaN` makes the result `NaN`.
fn fold_numbers(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).try_fold(init, |acc, n| {
        if n.is_nan() {
            None
        } else {
            Some(f(acc, n))
        }
    })
    .unwrap_or(f64::NAN)
}

fn clamp(args: &[Value]) -> Result<Value, ScriptError> {
    if args.len() != 3 {
        return Err(ScriptError::new(
            ErrorCode::MalformedCall,
            format!("clamp expects 3 arguments (value, min, max), got {}", args.len()),
        ));
    }
    let (value, low, high) = (number_arg(args, 0), number_arg(args, 1), number_arg(args, 2));
    if value.is_nan() || low.is_nan() || high.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(value.max(low).min(high)))
}
