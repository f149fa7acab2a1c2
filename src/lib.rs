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

//! SheetScript Runtime Library
//!
//! A sandboxed interpreter for formula scripts authored against character
//! sheet data, together with the resolver that memoizes their results.
//!
//! # Modules
//!
//! - [`error`] - Error types and error reporting
//! - [`lexer`] - Tokenization of script source
//! - [`ast`] - Abstract Syntax Tree definitions
//! - [`parser`] - Parsing tokens into an AST
//! - [`interpreter`] - Scopes, values and the tree-walking interpreter
//! - [`resolver`] - Cached, depth-guarded resolution for host entities
//! - [`sheet`] - JSON character sheets
//! - [`watcher`] - File watching for the CLI
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use sheetscript::resolver::{Entity, ScriptResolver, SelfProvider};
//! use sheetscript::sheet::Sheet;
//!
//! let sheet = Sheet::from_json(r#"{
//!     "id": "conan",
//!     "attributes": [{ "id": "str", "formula": "18" }]
//! }"#).unwrap();
//! let entity: Rc<dyn Entity> = Rc::new(sheet);
//!
//! let resolver = ScriptResolver::new();
//! let provider = SelfProvider::unbound("example");
//! let modifier = resolver.resolve_to_number(
//!     Some(&entity),
//!     &provider,
//!     "floor(($str.value - 10) / 2)",
//! );
//! assert_eq!(modifier, 4.0);
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod sheet;
pub mod watcher;

// Re-export commonly used types
pub use ast::Program;
pub use error::{format_error, ErrorCode, Result, ScriptError, SourceLocation, Span};
pub use interpreter::{Environment, Limits, ScriptInterpreter, Value};
pub use lexer::Token;
pub use resolver::{ResolverConfig, ScriptResolver, SelfProvider};

/// The version of the SheetScript runtime.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the runtime.
pub const NAME: &str = "SheetScript";

/// Evaluate a standalone script with the global function table and default
/// limits.
///
/// # Example
///
/// ```
/// let value = sheetscript::evaluate("Math.max(1, 2) * 3").unwrap();
/// assert_eq!(value.to_string(), "6");
/// ```
pub fn evaluate(source: &str) -> std::result::Result<Value, ScriptError> {
    ScriptInterpreter::new().run_script(source, &resolver::builtins::global_environment())
}
