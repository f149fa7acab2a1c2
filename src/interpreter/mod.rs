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

//! Tree-walking interpreter for SheetScript.
//!
//! The interpreter executes a parsed program against a root scope seeded
//! from an [`Environment`]. Every statement, every expression and every
//! spread element costs one step, and building a string costs one more
//! step per [`STRING_BYTES_PER_STEP`] bytes of the result. A script that
//! exceeds its step budget fails with `MaxStepsExceeded` instead of hanging
//! the host or exhausting its memory.
//!
//! # Module Structure
//!
//! - `calls` - Function, native and method calls (CallEvaluator trait)
//! - `expressions` - Expression evaluation (ExpressionEvaluator trait)
//! - `operators` - Unary and binary operator semantics
//! - `scope` - The scope arena
//! - `signal` - Statement completions (`Completion`)
//! - `statements` - Statement execution (StatementExecutor trait)
//! - `value` - Runtime values and host object traits

// Submodules
pub mod calls;
pub mod expressions;
pub mod operators;
pub mod scope;
pub mod signal;
pub mod statements;
pub mod value;

pub use scope::{Binding, ScopeId, Scopes};
pub use signal::Completion;
pub use value::{format_number, Function, HostObject, NativeFunction, Value};

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use statements::StatementExecutor;

use crate::ast::{DeclKind, Program};
use crate::error::{ErrorCode, ScriptError, Span};
use crate::parser::parse;

/// Default step budget per script run.
pub const DEFAULT_MAX_STEPS: usize = 20_000;

/// Default maximum depth of nested interpreted function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 32;

/// Bytes of a newly built string that cost one additional step.
pub const STRING_BYTES_PER_STEP: usize = 64;

/// Property names that scripts may never read, call or define.
pub const FORBIDDEN_PROPERTIES: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Check whether a property or key name is forbidden.
pub fn is_forbidden_property(name: &str) -> bool {
    FORBIDDEN_PROPERTIES.contains(&name)
}

/// Execution bounds for a single script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of evaluation steps.
    pub max_steps: usize,
    /// Maximum depth of nested interpreted function calls.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Limits {
    /// Set the step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the call depth limit.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

/// The bindings a script starts with. All of them are `const` in the
/// root scope.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Builder form of [`Environment::insert`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Check whether a binding exists.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether the environment is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over the bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }
}

/// Runs scripts with a fixed set of limits.
///
/// Runs started while another run of the same interpreter is active, such
/// as a host object resolving a formula from inside a script, share one
/// call depth counter, so `max_call_depth` bounds the nesting of all of
/// them together. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct ScriptInterpreter {
    limits: Limits,
    call_depth: Rc<Cell<usize>>,
}

impl ScriptInterpreter {
    /// Create an interpreter with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interpreter with the given limits.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            call_depth: Rc::default(),
        }
    }

    /// The configured limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Parse and run `source` against `environment`.
    ///
    /// The result is the value of a top-level `return`, otherwise the value
    /// of the last statement that produced one (`undefined` if none did).
    /// Errors carry the most specific source location available.
    pub fn run_script(&self, source: &str, environment: &Environment) -> Result<Value, ScriptError> {
        let program = parse(source).map_err(|e| e.locate(source))?;
        self.run_program(&program, environment)
            .map_err(|e| e.locate(source))
    }

    /// Run an already parsed program. Errors carry spans but no line/column.
    pub fn run_program(
        &self,
        program: &Program,
        environment: &Environment,
    ) -> Result<Value, ScriptError> {
        Execution::with_call_depth(self.limits, Rc::clone(&self.call_depth))
            .run(program, environment)
    }
}

/// The state of a single script run.
pub struct Execution {
    pub(crate) scopes: Scopes,
    pub(crate) limits: Limits,
    pub(crate) steps: usize,
    pub(crate) call_depth: Rc<Cell<usize>>,
}

impl Execution {
    /// Create a fresh execution with an empty root scope.
    pub fn new(limits: Limits) -> Self {
        Self::with_call_depth(limits, Rc::default())
    }

    /// Create an execution whose interpreted calls count against a shared
    /// call depth counter.
    pub fn with_call_depth(limits: Limits, call_depth: Rc<Cell<usize>>) -> Self {
        Self {
            scopes: Scopes::new(),
            limits,
            steps: 0,
            call_depth,
        }
    }

    /// Number of steps spent so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Seed the root scope and execute the program's top-level statements.
    pub fn run(&mut self, program: &Program, environment: &Environment) -> Result<Value, ScriptError> {
        let root = self.scopes.root();
        for (name, value) in environment.iter() {
            self.scopes.define(root, name, DeclKind::Const, value.clone())?;
        }

        self.hoist_functions(&program.body, root)?;

        let mut last = Value::Undefined;
        for stmt in &program.body {
            match self.execute_statement(stmt, root)? {
                Completion::Normal(Some(value)) => last = value,
                Completion::Normal(None) => {}
                Completion::Return(value) => return Ok(value),
                signal => {
                    return Err(ScriptError::at(
                        ErrorCode::IllegalControlFlow,
                        format!("Illegal {} statement", signal.describe()),
                        stmt.span.clone(),
                    ))
                }
            }
        }

        Ok(last)
    }

    /// Spend one step, failing once the budget is exhausted.
    pub(crate) fn tick(&mut self, span: &Span) -> Result<(), ScriptError> {
        self.spend(1, span)
    }

    /// Charge for a string the script just built, in proportion to its length.
    pub(crate) fn charge_string(
        &mut self,
        value: Value,
        span: &Span,
    ) -> Result<Value, ScriptError> {
        if let Value::String(s) = &value {
            self.spend(s.len() / STRING_BYTES_PER_STEP, span)?;
        }
        Ok(value)
    }

    fn spend(&mut self, steps: usize, span: &Span) -> Result<(), ScriptError> {
        if steps == 0 {
            return Ok(());
        }
        self.steps = self.steps.saturating_add(steps);
        if self.steps > self.limits.max_steps {
            tracing::debug!(max_steps = self.limits.max_steps, "step budget exhausted");
            return Err(ScriptError::at(
                ErrorCode::MaxStepsExceeded,
                format!("Script exceeded the maximum of {} steps", self.limits.max_steps),
                span.clone(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Value, ScriptError> {
        ScriptInterpreter::new().run_script(source, &Environment::new())
    }

    // ========================================
    // Entry Point Tests
    // ========================================

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::from(7));
    }

    #[test]
    fn test_empty_script_is_undefined() {
        assert_eq!(run("").unwrap(), Value::Undefined);
        assert_eq!(run("let a = 1;").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(run("return 5; 6").unwrap(), Value::from(5));
    }

    #[test]
    fn test_last_value_wins() {
        assert_eq!(run("1; 2; let x = 3;").unwrap(), Value::from(2));
    }

    #[test]
    fn test_environment_bindings_are_const() {
        let env = Environment::new().with("base", Value::from(10));
        let interpreter = ScriptInterpreter::new();
        assert_eq!(interpreter.run_script("base * 2", &env).unwrap(), Value::from(20));
        let err = interpreter.run_script("base = 1", &env).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConstantAssignment);
        let err = interpreter.run_script("let base = 1", &env).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyDeclared);
    }

    #[test]
    fn test_syntax_error_is_located() {
        let err = run("let a =\n  ;").unwrap_err();
        assert_eq!(err.name(), "SyntaxError");
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(3));
    }

    #[test]
    fn test_top_level_break_is_illegal() {
        let err = run("break").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalControlFlow);
    }

    // ========================================
    // Limit Tests
    // ========================================

    #[test]
    fn test_infinite_loop_hits_step_budget() {
        let err = run("while (true) {}").unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxStepsExceeded);
        assert_eq!(err.name(), "MaxStepsExceeded");
    }

    #[test]
    fn test_custom_step_budget() {
        let interpreter = ScriptInterpreter::with_limits(Limits::default().with_max_steps(10));
        let err = interpreter
            .run_script("let i = 0; while (i < 100) i++", &Environment::new())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxStepsExceeded);
        assert!(interpreter
            .run_script("1 + 1", &Environment::new())
            .is_ok());
    }

    #[test]
    fn test_execution_counts_steps() {
        let program = parse("1 + 2").unwrap();
        let mut execution = Execution::new(Limits::default());
        execution.run(&program, &Environment::new()).unwrap();
        // One statement, one binary expression, two literals.
        assert_eq!(execution.steps(), 4);
    }

    #[test]
    fn test_spread_elements_cost_steps() {
        let env = Environment::new().with("xs", Value::array(vec![Value::from(1); 5]));
        let mut execution = Execution::new(Limits::default());
        execution.run(&parse("[...xs]").unwrap(), &env).unwrap();
        // Statement, array literal, spread operand and five elements.
        assert_eq!(execution.steps(), 8);

        let mut execution = Execution::new(Limits::default());
        execution
            .run(&parse("[...'abc']").unwrap(), &Environment::new())
            .unwrap();
        assert_eq!(execution.steps(), 6);
    }

    #[test]
    fn test_spread_exhausts_step_budget() {
        let env = Environment::new().with("xs", Value::array(vec![Value::Null; 100]));
        let mut execution = Execution::new(Limits::default().with_max_steps(50));
        let err = execution.run(&parse("[...xs]").unwrap(), &env).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxStepsExceeded);
        assert_eq!(execution.steps(), 51);
    }

    #[test]
    fn test_built_strings_cost_steps_by_length() {
        let long = "x".repeat(STRING_BYTES_PER_STEP);
        let env = Environment::new().with("s", Value::from(long.as_str()));
        let mut execution = Execution::new(Limits::default());
        execution.run(&parse("s + s").unwrap(), &env).unwrap();
        // Four evaluation steps plus two for the 128-byte result.
        assert_eq!(execution.steps(), 6);

        let mut execution = Execution::new(Limits::default());
        execution
            .run(&parse("'a' + 'b'").unwrap(), &Environment::new())
            .unwrap();
        assert_eq!(execution.steps(), 4);
    }

    #[test]
    fn test_nested_runs_share_call_depth() {
        let interpreter = ScriptInterpreter::with_limits(Limits::default().with_max_call_depth(4));
        let inner = interpreter.clone();
        let nested = Value::native("nested", move |_: &[Value]| {
            let source = "function f(n) { return n === 0 ? 0 : f(n - 1); } f(2)";
            inner.run_script(source, &Environment::new())
        });
        let env = Environment::new().with("nested", nested);

        // Three calls inside the nested run fit on their own.
        assert_eq!(
            interpreter.run_script("nested()", &env).unwrap(),
            Value::from(0)
        );

        // Two outer calls leave room for only two more.
        let err = interpreter
            .run_script("function g(n) { return n === 0 ? nested() : g(n - 1); } g(1)", &env)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxCallDepthExceeded);
    }

    #[test]
    fn test_forbidden_properties() {
        assert!(is_forbidden_property("__proto__"));
        assert!(is_forbidden_property("prototype"));
        assert!(!is_forbidden_property("proto"));
    }
}
