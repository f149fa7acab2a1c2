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

//! Fuzz target for script evaluation.
//!
//! Random scripts run under random limits, both directly and through the
//! resolver. Every run must terminate without panicking.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_interpreter

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheetscript::resolver::builtins::global_environment;
use sheetscript::resolver::{ResolverConfig, ScriptResolver, SelfProvider};
use sheetscript::{Limits, ScriptInterpreter};

#[derive(Arbitrary, Debug)]
struct Input {
    source: String,
    max_steps: u16,
    max_call_depth: u8,
}

fuzz_target!(|input: Input| {
    let limits = Limits::default()
        .with_max_steps(usize::from(input.max_steps))
        .with_max_call_depth(usize::from(input.max_call_depth % 33));

    let _ = ScriptInterpreter::with_limits(limits).run_script(&input.source, &global_environment());

    let resolver = ScriptResolver::with_config(ResolverConfig::default().with_limits(limits));
    let _ = resolver.resolve_script(None, &SelfProvider::unbound("fuzz"), &input.source);
    assert_eq!(resolver.depth(), 0);
});
