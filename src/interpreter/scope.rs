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

//! Lexical scopes for the interpreter.
//!
//! Scopes live in an arena owned by a single script run and refer to their
//! parent by index. A closure stores the `ScopeId` of its defining scope, so
//! function values can outlive the statement that declared them without
//! reference cycles. The arena is dropped when the run ends.
//!
//! Every arena has a process-unique id that is part of each `ScopeId`, so a
//! function value that escapes its run is recognized instead of resolving
//! into an unrelated scope of a later run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::value::Value;
use crate::ast::DeclKind;
use crate::error::{ErrorCode, ScriptError};

static NEXT_ARENA: AtomicU64 = AtomicU64::new(0);

/// A scope in a specific arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId {
    arena: u64,
    index: usize,
}

/// A named binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The declaration keyword the binding was created with.
    pub kind: DeclKind,
    /// The current value.
    pub value: Value,
}

/// A single lexical scope.
#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<ScopeId>,
    /// Function and root scopes receive `var` declarations.
    function_boundary: bool,
}

/// The scope arena.
#[derive(Debug)]
pub struct Scopes {
    arena: u64,
    scopes: Vec<Scope>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    /// Create an arena holding only the root scope.
    pub fn new() -> Self {
        Self {
            arena: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            scopes: vec![Scope {
                function_boundary: true,
                ..Scope::default()
            }],
        }
    }

    /// The root scope.
    pub fn root(&self) -> ScopeId {
        self.id(0)
    }

    /// Check whether `scope` belongs to this arena.
    pub fn contains(&self, scope: ScopeId) -> bool {
        scope.arena == self.arena && scope.index < self.scopes.len()
    }

    fn id(&self, index: usize) -> ScopeId {
        ScopeId {
            arena: self.arena,
            index,
        }
    }

    /// Number of scopes created so far.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false: the root scope exists from the start.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Create a child scope. Function bodies pass `function_boundary = true`.
    pub fn child(&mut self, parent: ScopeId, function_boundary: bool) -> ScopeId {
        self.scopes.push(Scope {
            bindings: HashMap::new(),
            parent: Some(parent),
            function_boundary,
        });
        self.id(self.scopes.len() - 1)
    }

    /// Create a sibling of `scope` holding a copy of its bindings.
    ///
    /// Used for per-iteration `let` bindings of `for` loops.
    pub fn copy(&mut self, scope: ScopeId) -> ScopeId {
        let source = &self.scopes[scope.index];
        let copy = Scope {
            bindings: source.bindings.clone(),
            parent: source.parent,
            function_boundary: source.function_boundary,
        };
        self.scopes.push(copy);
        self.id(self.scopes.len() - 1)
    }

    /// The nearest enclosing function (or root) scope, where `var` binds.
    pub fn var_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let frame = &self.scopes[current.index];
            match frame.parent {
                Some(parent) if !frame.function_boundary => current = parent,
                _ => return current,
            }
        }
    }

    /// Define a binding in `scope`.
    ///
    /// Fails with `AlreadyDeclared` if the name already exists in this scope
    /// with a kind other than `var`. Redeclaring a `var` replaces it.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: DeclKind,
        value: Value,
    ) -> Result<(), ScriptError> {
        let bindings = &mut self.scopes[scope.index].bindings;
        if let Some(existing) = bindings.get(name) {
            if existing.kind != DeclKind::Var {
                return Err(ScriptError::new(
                    ErrorCode::AlreadyDeclared,
                    format!("Identifier '{}' has already been declared", name),
                ));
            }
        }
        bindings.insert(name.to_string(), Binding { kind, value });
        Ok(())
    }

    /// Check whether `name` is bound in `scope` itself, ignoring parents.
    pub fn has_here(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.index].bindings.contains_key(name)
    }

    /// Look up `name`, walking outward through parent scopes.
    pub fn get(&self, scope: ScopeId, name: &str) -> Result<Value, ScriptError> {
        self.lookup(scope, name)
            .map(|(id, _)| self.scopes[id.index].bindings[name].value.clone())
            .ok_or_else(|| undefined_variable(name))
    }

    /// Assign to an existing binding, walking outward through parent scopes.
    ///
    /// Never creates a binding.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<(), ScriptError> {
        let (id, kind) = self
            .lookup(scope, name)
            .ok_or_else(|| undefined_variable(name))?;
        if kind == DeclKind::Const {
            return Err(ScriptError::new(
                ErrorCode::ConstantAssignment,
                format!("Assignment to constant variable '{}'", name),
            ));
        }
        if let Some(binding) = self.scopes[id.index].bindings.get_mut(name) {
            binding.value = value;
        }
        Ok(())
    }

    /// Find the scope that binds `name`, with the binding's kind.
    fn lookup(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, DeclKind)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.scopes[id.index];
            if let Some(binding) = frame.bindings.get(name) {
                return Some((id, binding.kind));
            }
            current = frame.parent;
        }
        None
    }
}

fn undefined_variable(name: &str) -> ScriptError {
    ScriptError::new(
        ErrorCode::UndefinedVariable,
        format!("{} is not defined", name),
    )
}
