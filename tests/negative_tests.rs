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

//! Negative tests for the SheetScript runtime.
//!
//! These tests verify that invalid or unsafe scripts are rejected with the
//! right error code instead of running.

use sheetscript::{lexer, parser, Environment, ErrorCode, ScriptInterpreter};
use test_case::test_case;

fn run_err(source: &str) -> ErrorCode {
    match ScriptInterpreter::new().run_script(source, &Environment::new()) {
        Ok(value) => panic!("Expected an error for {:?}, got {}", source, value),
        Err(err) => err.code,
    }
}

// ============================================================================
// Lexer Error Tests
// ============================================================================

#[test_case("1 # 2", ErrorCode::InvalidCharacter; "hash")]
#[test_case("let a = @", ErrorCode::InvalidCharacter; "at_sign")]
#[test_case("\"abc", ErrorCode::UnterminatedString; "unterminated_string")]
#[test_case(r#""a\qb""#, ErrorCode::InvalidEscapeSequence; "invalid_escape")]
#[test_case("1 /* never closed", ErrorCode::UnterminatedComment; "unterminated_comment")]
fn test_lexer_errors(source: &str, expected: ErrorCode) {
    let err = lexer::tokenize(source).unwrap_err();
    assert_eq!(err.code, expected);
    assert!(err.code.is_syntax_error());
}

// ============================================================================
// Parser Error Tests
// ============================================================================

#[test_case("f(1, 2", ErrorCode::UnexpectedEndOfInput; "unclosed_call")]
#[test_case("1 + * 2", ErrorCode::ExpectedExpression; "missing_operand")]
#[test_case("const a;", ErrorCode::MissingInitializer; "const_without_value")]
fn test_parser_errors(source: &str, expected: ErrorCode) {
    let err = parser::parse(source).unwrap_err();
    assert_eq!(err.code, expected);
    assert_eq!(err.name(), "SyntaxError");
}

#[test]
fn test_nesting_guard() {
    let source = format!("{}1{}", "[".repeat(500), "]".repeat(500));
    let err = parser::parse(&source).unwrap_err();
    assert_eq!(err.code, ErrorCode::NestingTooDeep);
}

// ============================================================================
// Sandbox Tests
// ============================================================================

#[test_case("let o = {}; o.__proto__"; "read_proto")]
#[test_case("let o = {}; o.constructor"; "read_constructor")]
#[test_case("let f = 1; f.prototype"; "read_prototype")]
#[test_case("'x'.constructor"; "string_constructor")]
#[test_case("let o = {}; o.constructor('return 1')"; "call_constructor")]
#[test_case("let o = {}; o['__proto__']"; "computed_proto")]
#[test_case("let a = [1]; a[0]"; "computed_index")]
fn test_illegal_member_access(source: &str) {
    assert_eq!(run_err(source), ErrorCode::IllegalMemberAccess);
}

#[test_case("({ __proto__: 1 })"; "proto_key")]
#[test_case("({ 'constructor': 1 })"; "constructor_key")]
#[test_case("({ prototype: 1 })"; "prototype_key")]
#[test_case("({ 1: 'one' })"; "numeric_key")]
#[test_case("let k = 'a'; ({ [k]: 1 })"; "computed_key")]
fn test_illegal_object_keys(source: &str) {
    assert_eq!(run_err(source), ErrorCode::IllegalObjectKey);
}

#[test_case("this"; "this")]
#[test_case("new Thing()"; "new")]
#[test_case("let f = function () { return 1; }"; "function_expression")]
#[test_case("do { } while (false)"; "do_while")]
#[test_case("throw 1"; "throw")]
#[test_case("outer: while (true) { break outer; }"; "labeled")]
#[test_case("let [a, b] = [1, 2]"; "array_pattern")]
#[test_case("let o = { a: 1 }; ({ ...o })"; "object_spread")]
fn test_unsupported_node_kinds(source: &str) {
    assert_eq!(run_err(source), ErrorCode::UnsupportedNodeKind);
}

// ============================================================================
// Binding Error Tests
// ============================================================================

#[test_case("let a = 1; let a = 2;", ErrorCode::AlreadyDeclared; "let_twice")]
#[test_case("const a = 1; var a = 2;", ErrorCode::AlreadyDeclared; "var_over_const")]
#[test_case("missing", ErrorCode::UndefinedVariable; "undefined_lookup")]
#[test_case("missing = 1", ErrorCode::UndefinedVariable; "undefined_assignment")]
#[test_case("const a = 1; a = 2", ErrorCode::ConstantAssignment; "const_assignment")]
#[test_case("const a = 1; a++", ErrorCode::ConstantAssignment; "const_update")]
#[test_case("let o = {}; o.a = 1", ErrorCode::IllegalAssignmentTarget; "member_target")]
#[test_case("1 = 2", ErrorCode::IllegalAssignmentTarget; "literal_target")]
fn test_binding_errors(source: &str, expected: ErrorCode) {
    assert_eq!(run_err(source), expected);
}

// ============================================================================
// Call and Control Flow Error Tests
// ============================================================================

#[test_case("let x = 1; x()", ErrorCode::NotAFunction; "number_callee")]
#[test_case("undefined()", ErrorCode::NotAFunction; "undefined_callee")]
#[test_case("'a'.repeat(2)", ErrorCode::NotAFunction; "unknown_string_method")]
#[test_case("let u; u.x", ErrorCode::TypeError; "member_of_undefined")]
#[test_case("[...5]", ErrorCode::TypeError; "spread_number")]
#[test_case("continue", ErrorCode::IllegalControlFlow; "top_level_continue")]
#[test_case("function f() { break; } f()", ErrorCode::IllegalControlFlow; "break_in_function")]
#[test_case("while (true) {}", ErrorCode::MaxStepsExceeded; "infinite_loop")]
#[test_case("function f() { return f(); } f()", ErrorCode::MaxCallDepthExceeded; "runaway_recursion")]
fn test_runtime_errors(source: &str, expected: ErrorCode) {
    assert_eq!(run_err(source), expected);
}
