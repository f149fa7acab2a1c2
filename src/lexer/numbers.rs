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

//! Number literal conversion for the lexer.

use logos::Lexer;

use super::Token;

/// Convert a decimal literal (with optional fraction and exponent).
pub(super) fn decimal(lex: &mut Lexer<Token>) -> Option<f64> {
    lex.slice().parse::<f64>().ok()
}

/// Convert a `0x` hexadecimal literal.
pub(super) fn hex(lex: &mut Lexer<Token>) -> Option<f64> {
    parse_hex(&lex.slice()[2..])
}

/// Parse hex digits, rejecting values that do not fit in 64 bits.
fn parse_hex(digits: &str) -> Option<f64> {
    u64::from_str_radix(digits, 16).ok().map(|v| v as f64)
}

/// Parse a complete numeric literal the way the lexer would, with an optional
/// leading sign. Returns `None` for anything else, including surrounding text.
///
/// This is the fast path used to skip interpretation of constant formulas.
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let value = if let Some(digits) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        parse_hex(digits)?
    } else {
        let starts_ok = body
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_digit() || b == b'.');
        let chars_ok = body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
        if !starts_ok || !chars_ok || !body.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse::<f64>().ok()?
    };

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("42", Some(42.0); "integer")]
    #[test_case("1.5", Some(1.5); "fraction")]
    #[test_case(".5", Some(0.5); "leading_dot")]
    #[test_case("-3", Some(-3.0); "negative")]
    #[test_case("+7", Some(7.0); "explicit_plus")]
    #[test_case("2e3", Some(2000.0); "exponent")]
    #[test_case("0x1F", Some(31.0); "hex")]
    #[test_case("inf", None; "infinity_word")]
    #[test_case("NaN", None; "nan_word")]
    #[test_case("1 + 2", None; "expression")]
    #[test_case("-", None; "lone_sign")]
    #[test_case(".", None; "lone_dot")]
    #[test_case("0x", None; "empty_hex")]
    #[test_case("", None; "empty")]
    fn test_parse_numeric_literal(text: &str, expected: Option<f64>) {
        assert_eq!(parse_numeric_literal(text), expected);
    }
}
