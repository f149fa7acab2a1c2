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

//! Script resolution for host entities.
//!
//! The resolver is the public entry point for evaluating formulas. It
//! short-circuits plain numeric literals, guards against formulas that
//! reference each other too deeply, memoizes results per provider and
//! script, and never fails: any error is logged and degrades to `""`
//! or `0`. A result that depends on a degraded nested resolution is not
//! cached, since the degradation depends on the depth it was reached at.
//!
//! # Module Structure
//!
//! - `builtins` - The global function and constant table
//! - `cache` - The `ScriptCache` trait and its entity and world implementations
//! - `environment` - Attribute adapters and environment construction

pub mod builtins;
pub mod cache;
pub mod environment;

pub use cache::{CacheError, EntityCache, ScriptCache, WorldCache};
pub use environment::{attribute_binding, attribute_provider_id, AttributeAdapter};

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{ErrorCode, ScriptError};
use crate::interpreter::{format_number, Environment, Limits, ScriptInterpreter, Value};
use crate::lexer::parse_numeric_literal;

/// Default maximum nesting of resolutions.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// A named value of an entity whose formula scripts can reference.
pub trait Attribute {
    /// Identifier, bound in scripts as `$<id>`.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Formula script producing the attribute's value.
    fn formula(&self) -> &str;
}

/// A host object scripts are resolved for.
pub trait Entity {
    /// Identifier, used to build provider ids of attributes.
    fn id(&self) -> &str;

    /// Attributes exposed to scripts.
    fn attributes(&self) -> Vec<Rc<dyn Attribute>>;

    /// The entity's own result cache. Entities without one share the
    /// resolver's world cache.
    fn script_cache(&self) -> Option<Rc<dyn ScriptCache>> {
        None
    }
}

/// What `self` refers to in a resolution, and the key its results are
/// cached under.
#[derive(Debug, Clone)]
pub struct SelfProvider {
    /// Cache key.
    pub id: String,
    /// The value bound as `self`, if any.
    pub value: Option<Value>,
}

impl SelfProvider {
    /// A provider binding `value` as `self`.
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value: Some(value),
        }
    }

    /// A provider that only supplies a cache key.
    pub fn unbound(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum nesting of resolutions.
    pub max_depth: usize,
    /// Limits for every interpreter run.
    pub limits: Limits,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            limits: Limits::default(),
        }
    }
}

impl ResolverConfig {
    /// Set the maximum resolution depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the interpreter limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

struct ResolverState {
    config: ResolverConfig,
    interpreter: ScriptInterpreter,
    globals: Environment,
    world_cache: Rc<WorldCache>,
    depth: Cell<usize>,
    evaluations: Cell<usize>,
    /// Set when a resolution degrades, read by the enclosing one.
    degraded: Cell<bool>,
}

/// Increments the resolution depth for as long as it lives.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    /// Enter one level deeper, or `None` if that would exceed `max`.
    fn enter(depth: &'a Cell<usize>, max: usize) -> Option<Self> {
        let next = depth.get() + 1;
        if next > max {
            return None;
        }
        depth.set(next);
        Some(Self { depth })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Evaluates formula scripts for entities.
///
/// Cloning is cheap and clones share caches, counters and depth.
#[derive(Clone)]
pub struct ScriptResolver {
    state: Rc<ResolverState>,
}

impl Default for ScriptResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptResolver {
    /// Create a resolver with default configuration and an empty world cache.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a resolver with the given configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_world_cache(config, Rc::new(WorldCache::new()))
    }

    /// Create a resolver sharing an existing world cache.
    pub fn with_world_cache(config: ResolverConfig, world_cache: Rc<WorldCache>) -> Self {
        Self {
            state: Rc::new(ResolverState {
                config,
                interpreter: ScriptInterpreter::with_limits(config.limits),
                globals: builtins::global_environment(),
                world_cache,
                depth: Cell::new(0),
                evaluations: Cell::new(0),
                degraded: Cell::new(false),
            }),
        }
    }

    /// The configuration.
    pub fn config(&self) -> ResolverConfig {
        self.state.config
    }

    /// The global table scripts start with.
    pub fn globals(&self) -> &Environment {
        &self.state.globals
    }

    /// The world cache.
    pub fn world_cache(&self) -> &Rc<WorldCache> {
        &self.state.world_cache
    }

    /// Number of times the interpreter has been invoked.
    pub fn evaluations(&self) -> usize {
        self.state.evaluations.get()
    }

    /// Current resolution depth.
    pub fn depth(&self) -> usize {
        self.state.depth.get()
    }

    /// The cache results for `entity` live in.
    pub fn cache_for(&self, entity: Option<&Rc<dyn Entity>>) -> Rc<dyn ScriptCache> {
        match entity.and_then(|entity| entity.script_cache()) {
            Some(cache) => cache,
            None => Rc::clone(&self.state.world_cache) as Rc<dyn ScriptCache>,
        }
    }

    /// Resolve `script` and return its result as a string.
    ///
    /// Never fails: errors are logged and produce `""`.
    #[tracing::instrument(level = "debug", skip_all, fields(provider = %provider.id))]
    pub fn resolve_script(
        &self,
        entity: Option<&Rc<dyn Entity>>,
        provider: &SelfProvider,
        script: &str,
    ) -> String {
        let trimmed = script.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        if let Some(n) = parse_numeric_literal(trimmed) {
            tracing::debug!("numeric literal, skipping interpretation");
            return format_number(n);
        }

        match self.evaluate(entity, provider, script) {
            Ok(result) => result,
            Err(error) => {
                self.state.degraded.set(true);
                tracing::warn!(
                    code = error.code_str(),
                    line = error.line(),
                    column = error.column(),
                    script,
                    "{}",
                    error
                );
                String::new()
            }
        }
    }

    /// Resolve `script` and coerce the result to a number.
    ///
    /// Never fails: errors and non-numeric results are logged and produce `0`.
    pub fn resolve_to_number(
        &self,
        entity: Option<&Rc<dyn Entity>>,
        provider: &SelfProvider,
        script: &str,
    ) -> f64 {
        if let Some(n) = parse_numeric_literal(script.trim()) {
            return n;
        }

        let result = self.resolve_script(entity, provider, script);
        if result.is_empty() {
            return 0.0;
        }

        let n = Value::String(result).to_number();
        if n.is_nan() {
            tracing::warn!(provider = %provider.id, script, "script result is not a number, using 0");
            return 0.0;
        }
        n
    }

    /// Clear the cache `entity` resolves through.
    pub fn clear_cache(&self, entity: Option<&Rc<dyn Entity>>) {
        self.cache_for(entity).clear();
    }

    /// Depth guard, cache lookup and interpretation.
    fn evaluate(
        &self,
        entity: Option<&Rc<dyn Entity>>,
        provider: &SelfProvider,
        script: &str,
    ) -> Result<String, ScriptError> {
        let max_depth = self.state.config.max_depth;
        let Some(_guard) = DepthGuard::enter(&self.state.depth, max_depth) else {
            return Err(ScriptError::new(
                ErrorCode::MaxResolutionDepthExceeded,
                format!("Resolution exceeded the maximum depth of {}", max_depth),
            ));
        };

        let cache = self.cache_for(entity);
        if let Some(hit) = cache.get(&provider.id, script) {
            tracing::debug!("cache hit");
            return Ok(hit);
        }

        let env = environment::build_environment(self, entity, provider);
        self.state.evaluations.set(self.state.evaluations.get() + 1);
        let enclosing = self.state.degraded.replace(false);
        let value = self.state.interpreter.run_script(script, &env);
        let nested_degraded = self.state.degraded.get();
        self.state.degraded.set(enclosing || nested_degraded);
        let result = value?.to_string();

        if nested_degraded {
            tracing::debug!(
                result = %result,
                "evaluated script with degraded dependencies, not caching"
            );
        } else {
            tracing::debug!(result = %result, "evaluated script");
            cache.set(&provider.id, script, result.clone());
        }
        Ok(result)
    }
}
