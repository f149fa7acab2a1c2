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

//! Statement execution for the interpreter.
//!
//! This module provides statement execution:
//! - Blocks with function hoisting
//! - Variable and function declarations
//! - if, while, for and switch
//! - return, break and continue as completions
//!
//! Node kinds the parser accepts but the runtime does not (labels,
//! do-while, throw, destructuring) fail with `UnsupportedNodeKind`.

use std::rc::Rc;

use super::expressions::ExpressionEvaluator;
use super::scope::ScopeId;
use super::signal::Completion;
use super::value::{Function, Value};
use super::Execution;
use crate::ast::{
    BindingTarget, DeclKind, ForInit, ForStatement, FunctionDecl, IfStatement, Statement,
    StatementKind, SwitchStatement, VarDecl, WhileStatement,
};
use crate::error::{ErrorCode, ScriptError, Span};

/// Extension trait for statement execution.
pub trait StatementExecutor {
    /// Execute a single statement.
    fn execute_statement(&mut self, stmt: &Statement, scope: ScopeId)
        -> Result<Completion, ScriptError>;

    /// Execute a statement list in `scope`, hoisting its function declarations first.
    fn execute_block(
        &mut self,
        statements: &[Statement],
        scope: ScopeId,
    ) -> Result<Completion, ScriptError>;

    /// Define every function declared directly in `statements`.
    fn hoist_functions(&mut self, statements: &[Statement], scope: ScopeId)
        -> Result<(), ScriptError>;

    /// Bind a function declaration in `scope`.
    fn declare_function(
        &mut self,
        decl: &Rc<FunctionDecl>,
        scope: ScopeId,
    ) -> Result<(), ScriptError>;

    /// Execute a `var`, `let` or `const` declaration.
    fn execute_var_decl(&mut self, decl: &VarDecl, scope: ScopeId) -> Result<(), ScriptError>;

    /// Execute an if statement.
    fn execute_if(&mut self, stmt: &IfStatement, scope: ScopeId)
        -> Result<Completion, ScriptError>;

    /// Execute a while loop.
    fn execute_while(
        &mut self,
        stmt: &WhileStatement,
        scope: ScopeId,
    ) -> Result<Completion, ScriptError>;

    /// Execute a for loop with per-iteration `let` bindings.
    fn execute_for(&mut self, stmt: &ForStatement, scope: ScopeId)
        -> Result<Completion, ScriptError>;

    /// Execute a switch statement.
    fn execute_switch(
        &mut self,
        stmt: &SwitchStatement,
        scope: ScopeId,
    ) -> Result<Completion, ScriptError>;
}

/// What a loop does after running its body once.
enum LoopStep {
    Next,
    Exit,
    Propagate(Completion),
}

/// Fold a body completion into the loop's running value.
fn loop_step(completion: Completion, last: &mut Option<Value>) -> LoopStep {
    match completion {
        Completion::Normal(value) => {
            if value.is_some() {
                *last = value;
            }
            LoopStep::Next
        }
        Completion::Continue(None) => LoopStep::Next,
        Completion::Break(None) => LoopStep::Exit,
        other => LoopStep::Propagate(other),
    }
}

fn unsupported(node: &str, span: &Span) -> ScriptError {
    ScriptError::at(
        ErrorCode::UnsupportedNodeKind,
        format!("{} is not supported", node),
        span.clone(),
    )
}

impl StatementExecutor for Execution {
    fn execute_statement(
        &mut self,
        stmt: &Statement,
        scope: ScopeId,
    ) -> Result<Completion, ScriptError> {
        self.tick(&stmt.span)?;

        let result = match &stmt.kind {
            StatementKind::Empty => Ok(Completion::empty()),
            StatementKind::Block(block) => {
                let inner = self.scopes.child(scope, false);
                self.execute_block(&block.statements, inner)
            }
            StatementKind::Expression(expr) => {
                self.evaluate(expr, scope).map(|v| Completion::Normal(Some(v)))
            }
            StatementKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            StatementKind::Break(label) => Ok(Completion::Break(label.clone())),
            StatementKind::Continue(label) => Ok(Completion::Continue(label.clone())),
            StatementKind::If(if_stmt) => self.execute_if(if_stmt, scope),
            StatementKind::VarDecl(decl) => self
                .execute_var_decl(decl, scope)
                .map(|()| Completion::empty()),
            StatementKind::FunctionDecl(decl) => {
                // Hoisted declarations are already bound; this covers
                // declarations outside a statement list (e.g. `if (a) function f() {}`).
                match &decl.name {
                    Some(name) if self.scopes.has_here(scope, name) => Ok(Completion::empty()),
                    _ => self
                        .declare_function(decl, scope)
                        .map(|()| Completion::empty()),
                }
            }
            StatementKind::While(while_stmt) => self.execute_while(while_stmt, scope),
            StatementKind::For(for_stmt) => self.execute_for(for_stmt, scope),
            StatementKind::Switch(switch) => self.execute_switch(switch, scope),
            StatementKind::DoWhile(_)
            | StatementKind::Labeled { .. }
            | StatementKind::Throw(_) => Err(unsupported(stmt.kind.node_name(), &stmt.span)),
        };

        result.map_err(|e| e.with_span_if_missing(&stmt.span))
    }

    fn execute_block(
        &mut self,
        statements: &[Statement],
        scope: ScopeId,
    ) -> Result<Completion, ScriptError> {
        self.hoist_functions(statements, scope)?;

        let mut last = None;
        for stmt in statements {
            let completion = self.execute_statement(stmt, scope)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
            if let Completion::Normal(Some(value)) = completion {
                last = Some(value);
            }
        }

        Ok(Completion::Normal(last))
    }

    fn hoist_functions(
        &mut self,
        statements: &[Statement],
        scope: ScopeId,
    ) -> Result<(), ScriptError> {
        for stmt in statements {
            if let StatementKind::FunctionDecl(decl) = &stmt.kind {
                self.declare_function(decl, scope)?;
            }
        }
        Ok(())
    }

    fn declare_function(
        &mut self,
        decl: &Rc<FunctionDecl>,
        scope: ScopeId,
    ) -> Result<(), ScriptError> {
        let Some(name) = &decl.name else {
            return Err(ScriptError::at(
                ErrorCode::UnsupportedNodeKind,
                "Function declarations require a name",
                decl.span.clone(),
            ));
        };

        let function = Value::Function(Rc::new(Function {
            decl: Rc::clone(decl),
            closure: scope,
        }));
        self.scopes
            .define(scope, name, DeclKind::Var, function)
            .map_err(|e| e.with_span_if_missing(&decl.span))
    }

    fn execute_var_decl(&mut self, decl: &VarDecl, scope: ScopeId) -> Result<(), ScriptError> {
        let target_scope = match decl.kind {
            DeclKind::Var => self.scopes.var_scope(scope),
            DeclKind::Let | DeclKind::Const => scope,
        };

        for declarator in &decl.declarators {
            let name = match &declarator.target {
                BindingTarget::Identifier(name) => name,
                pattern => return Err(unsupported(pattern.node_name(), &declarator.span)),
            };

            let value = match &declarator.init {
                Some(init) => self.evaluate(init, scope)?,
                // `var x;` keeps an existing value.
                None if decl.kind == DeclKind::Var && self.scopes.has_here(target_scope, name) => {
                    continue
                }
                None => Value::Undefined,
            };

            self.scopes
                .define(target_scope, name, decl.kind, value)
                .map_err(|e| e.with_span_if_missing(&declarator.span))?;
        }

        Ok(())
    }

    fn execute_if(&mut self, stmt: &IfStatement, scope: ScopeId) -> Result<Completion, ScriptError> {
        if self.evaluate(&stmt.condition, scope)?.is_truthy() {
            self.execute_statement(&stmt.then_branch, scope)
        } else if let Some(else_branch) = &stmt.else_branch {
            self.execute_statement(else_branch, scope)
        } else {
            Ok(Completion::empty())
        }
    }

    fn execute_while(
        &mut self,
        stmt: &WhileStatement,
        scope: ScopeId,
    ) -> Result<Completion, ScriptError> {
        let mut last = None;

        while self.evaluate(&stmt.condition, scope)?.is_truthy() {
            let completion = self.execute_statement(&stmt.body, scope)?;
            match loop_step(completion, &mut last) {
                LoopStep::Next => {}
                LoopStep::Exit => break,
                LoopStep::Propagate(signal) => return Ok(signal),
            }
        }

        Ok(Completion::Normal(last))
    }

    fn execute_for(&mut self, stmt: &ForStatement, scope: ScopeId) -> Result<Completion, ScriptError> {
        let loop_scope = self.scopes.child(scope, false);

        let per_iteration = match &stmt.init {
            Some(ForInit::VarDecl(decl)) => {
                self.execute_var_decl(decl, loop_scope)?;
                decl.kind == DeclKind::Let
            }
            Some(ForInit::Expression(expr)) => {
                self.evaluate(expr, loop_scope)?;
                false
            }
            None => false,
        };

        // Each iteration sees its own copy of the `let` bindings, so closures
        // created in the body keep the value of their iteration.
        let mut iteration = if per_iteration {
            self.scopes.copy(loop_scope)
        } else {
            loop_scope
        };
        let mut last = None;

        loop {
            if let Some(test) = &stmt.test {
                if !self.evaluate(test, iteration)?.is_truthy() {
                    break;
                }
            }

            let completion = self.execute_statement(&stmt.body, iteration)?;
            match loop_step(completion, &mut last) {
                LoopStep::Next => {}
                LoopStep::Exit => break,
                LoopStep::Propagate(signal) => return Ok(signal),
            }

            if per_iteration {
                iteration = self.scopes.copy(iteration);
            }
            if let Some(update) = &stmt.update {
                self.evaluate(update, iteration)?;
            }
        }

        Ok(Completion::Normal(last))
    }

    fn execute_switch(
        &mut self,
        stmt: &SwitchStatement,
        scope: ScopeId,
    ) -> Result<Completion, ScriptError> {
        let discriminant = self.evaluate(&stmt.discriminant, scope)?;
        let switch_scope = self.scopes.child(scope, false);

        for case in &stmt.cases {
            self.hoist_functions(&case.consequent, switch_scope)?;
        }

        let mut matched = false;
        let mut last = None;

        for case in &stmt.cases {
            // `default` matches when reached without a prior match; once a
            // case matches, execution falls through the following cases.
            if !matched {
                matched = match &case.test {
                    Some(test) => self.evaluate(test, switch_scope)?.strict_equals(&discriminant),
                    None => true,
                };
            }
            if !matched {
                continue;
            }

            for stmt in &case.consequent {
                match self.execute_statement(stmt, switch_scope)? {
                    Completion::Normal(Some(value)) => last = Some(value),
                    Completion::Normal(None) => {}
                    Completion::Break(None) => return Ok(Completion::Normal(last)),
                    abrupt => return Ok(abrupt),
                }
            }
        }

        Ok(Completion::Normal(last))
    }
}
