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

//! Performance benchmarks for the SheetScript runtime.
//!
//! Run with: cargo bench
//!
//! Results are saved to target/criterion/ with HTML reports.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sheetscript::resolver::builtins::global_environment;
use sheetscript::resolver::{Entity, ScriptResolver, SelfProvider};
use sheetscript::sheet::Sheet;
use sheetscript::ScriptInterpreter;
use std::rc::Rc;

// ============================================================================
// Benchmark Inputs
// ============================================================================

const FORMULA: &str = "floor((18 - 10) / 2) + Math.max(1, 2, 3)";

const LOOP: &str = r#"
let total = 0;
for (let i = 0; i < 200; i++) {
    if (i % 3 === 0) continue;
    total += i;
}
total
"#;

const FUNCTIONS: &str = r#"
function fib(n) {
    if (n < 2) return n;
    return fib(n - 1) + fib(n - 2);
}
fib(12)
"#;

/// A script with `count` statements.
fn generated(count: usize) -> String {
    let mut source = String::from("let acc = 0;\n");
    for i in 0..count {
        source.push_str(&format!("acc += {} * 2 - 1;\n", i));
    }
    source.push_str("acc\n");
    source
}

/// A sheet whose attributes depend on each other in a chain.
fn sheet(length: usize) -> Rc<dyn Entity> {
    let attributes: Vec<String> = (0..length)
        .map(|i| {
            let formula = if i == 0 {
                "10".to_string()
            } else {
                format!("$a{}.value + 1", i - 1)
            };
            format!(r#"{{ "id": "a{}", "formula": "{}" }}"#, i, formula)
        })
        .collect();
    let json = format!(
        r#"{{ "id": "bench", "attributes": [{}] }}"#,
        attributes.join(",")
    );
    Rc::new(Sheet::from_json(&json).unwrap())
}

// ============================================================================
// Lexer and Parser Benchmarks
// ============================================================================

fn bench_frontend(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontend");

    for count in [10, 100, 1000] {
        let source = generated(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("tokenize", count), &source, |b, src| {
            b.iter(|| sheetscript::lexer::tokenize(black_box(src)))
        });
        group.bench_with_input(BenchmarkId::new("parse", count), &source, |b, src| {
            b.iter(|| sheetscript::parser::parse(black_box(src)))
        });
    }

    group.finish();
}

// ============================================================================
// Interpreter Benchmarks
// ============================================================================

fn bench_interpreter(c: &mut Criterion) {
    let interpreter = ScriptInterpreter::new();
    let env = global_environment();

    let mut group = c.benchmark_group("interpreter");

    for (name, source) in [("formula", FORMULA), ("loop", LOOP), ("functions", FUNCTIONS)] {
        group.bench_with_input(BenchmarkId::new("run_script", name), source, |b, src| {
            b.iter(|| interpreter.run_script(black_box(src), &env))
        });
    }

    group.finish();
}

// ============================================================================
// Resolver Benchmarks
// ============================================================================

fn bench_resolver(c: &mut Criterion) {
    let provider = SelfProvider::unbound("bench");
    let mut group = c.benchmark_group("resolver");

    group.bench_function("cold", |b| {
        b.iter(|| {
            let resolver = ScriptResolver::new();
            resolver.resolve_to_number(None, &provider, black_box(FORMULA))
        })
    });

    let warm = ScriptResolver::new();
    warm.resolve_to_number(None, &provider, FORMULA);
    group.bench_function("cached", |b| {
        b.iter(|| warm.resolve_to_number(None, &provider, black_box(FORMULA)))
    });

    group.bench_function("numeric_literal", |b| {
        b.iter(|| warm.resolve_to_number(None, &provider, black_box("42.5")))
    });

    for length in [2, 8, 16] {
        let entity = sheet(length);
        let script = format!("$a{}.value", length - 1);
        group.bench_with_input(BenchmarkId::new("attribute_chain", length), &script, |b, src| {
            b.iter(|| {
                let resolver = ScriptResolver::new();
                resolver.resolve_to_number(Some(&entity), &provider, black_box(src))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_frontend, bench_interpreter, bench_resolver);

criterion_main!(benches);
