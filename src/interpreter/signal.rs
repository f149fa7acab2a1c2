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

//! Statement completions.
//!
//! Executing a statement yields a `Completion` instead of unwinding:
//! loops consume `Break` and `Continue`, function calls consume `Return`,
//! everything else hands the signal to its caller. Genuine failures travel
//! separately as `ScriptError`.

use super::value::Value;

/// The outcome of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Execution continues. Carries the statement's value, if it has one.
    Normal(Option<Value>),
    /// `return` with its value.
    Return(Value),
    /// `break` with an optional label.
    Break(Option<String>),
    /// `continue` with an optional label.
    Continue(Option<String>),
}

impl Completion {
    /// A normal completion without a value.
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    /// Check whether this completion transfers control.
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// Describe the signal for error messages.
    pub fn describe(&self) -> String {
        match self {
            Completion::Normal(_) => "normal completion".to_string(),
            Completion::Return(_) => "return".to_string(),
            Completion::Break(None) => "break".to_string(),
            Completion::Continue(None) => "continue".to_string(),
            Completion::Break(Some(label)) => format!("break {}", label),
            Completion::Continue(Some(label)) => format!("continue {}", label),
        }
    }
}
