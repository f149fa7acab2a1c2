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

//! Error types for the SheetScript runtime.
//!
//! Every failure inside the lexer, parser and interpreter is a [`ScriptError`]:
//! an [`ErrorCode`] from a closed taxonomy, a message, and the most specific
//! source location known at the point the error left the interpreter.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// A source span representing a range in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the length of this span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// Error codes for the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexical errors (S001-S005)
    InvalidCharacter,
    UnterminatedString,
    InvalidEscapeSequence,
    InvalidNumber,
    UnterminatedComment,

    // Syntax errors (S100-S105)
    UnexpectedToken,
    UnexpectedEndOfInput,
    ExpectedExpression,
    ExpectedIdentifier,
    MissingInitializer,
    NestingTooDeep,

    // Runtime errors (R200-R252)
    UnsupportedNodeKind,
    AlreadyDeclared,
    UndefinedVariable,
    ConstantAssignment,
    IllegalAssignmentTarget,
    IllegalMemberAccess,
    IllegalObjectKey,
    NotAFunction,
    MalformedCall,
    TypeError,
    IllegalControlFlow,
    MaxStepsExceeded,
    MaxCallDepthExceeded,
    MaxResolutionDepthExceeded,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl ErrorCode {
    /// Get the short code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCharacter => "S001",
            ErrorCode::UnterminatedString => "S002",
            ErrorCode::InvalidEscapeSequence => "S003",
            ErrorCode::InvalidNumber => "S004",
            ErrorCode::UnterminatedComment => "S005",

            ErrorCode::UnexpectedToken => "S100",
            ErrorCode::UnexpectedEndOfInput => "S101",
            ErrorCode::ExpectedExpression => "S102",
            ErrorCode::ExpectedIdentifier => "S103",
            ErrorCode::MissingInitializer => "S104",
            ErrorCode::NestingTooDeep => "S105",

            ErrorCode::UnsupportedNodeKind => "R200",
            ErrorCode::AlreadyDeclared => "R210",
            ErrorCode::UndefinedVariable => "R211",
            ErrorCode::ConstantAssignment => "R212",
            ErrorCode::IllegalAssignmentTarget => "R213",
            ErrorCode::IllegalMemberAccess => "R220",
            ErrorCode::IllegalObjectKey => "R221",
            ErrorCode::NotAFunction => "R230",
            ErrorCode::MalformedCall => "R231",
            ErrorCode::TypeError => "R232",
            ErrorCode::IllegalControlFlow => "R240",
            ErrorCode::MaxStepsExceeded => "R250",
            ErrorCode::MaxCallDepthExceeded => "R251",
            ErrorCode::MaxResolutionDepthExceeded => "R252",
        }
    }

    /// Get the taxonomy name reported to callers.
    ///
    /// All lexical and syntax errors share the name `SyntaxError`; runtime
    /// errors are named after their code.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCharacter
            | ErrorCode::UnterminatedString
            | ErrorCode::InvalidEscapeSequence
            | ErrorCode::InvalidNumber
            | ErrorCode::UnterminatedComment
            | ErrorCode::UnexpectedToken
            | ErrorCode::UnexpectedEndOfInput
            | ErrorCode::ExpectedExpression
            | ErrorCode::ExpectedIdentifier
            | ErrorCode::MissingInitializer
            | ErrorCode::NestingTooDeep => "SyntaxError",
            ErrorCode::UnsupportedNodeKind => "UnsupportedNodeKind",
            ErrorCode::AlreadyDeclared => "AlreadyDeclared",
            ErrorCode::UndefinedVariable => "UndefinedVariable",
            ErrorCode::ConstantAssignment => "ConstantAssignment",
            ErrorCode::IllegalAssignmentTarget => "IllegalAssignmentTarget",
            ErrorCode::IllegalMemberAccess => "IllegalMemberAccess",
            ErrorCode::IllegalObjectKey => "IllegalObjectKey",
            ErrorCode::NotAFunction => "NotAFunction",
            ErrorCode::MalformedCall => "MalformedCall",
            ErrorCode::TypeError => "TypeError",
            ErrorCode::IllegalControlFlow => "IllegalControlFlow",
            ErrorCode::MaxStepsExceeded => "MaxStepsExceeded",
            ErrorCode::MaxCallDepthExceeded => "MaxCallDepthExceeded",
            ErrorCode::MaxResolutionDepthExceeded => "MaxResolutionDepthExceeded",
        }
    }

    /// Check if this is a lexical or syntax error.
    pub fn is_syntax_error(&self) -> bool {
        self.name() == "SyntaxError"
    }
}

/// A script error with optional source location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {}", .code.name(), .message)]
pub struct ScriptError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The source span where the error occurred, if known.
    pub span: Option<Span>,
    /// Line and column of `span.start`, filled in once the source is known.
    pub location: Option<SourceLocation>,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl ScriptError {
    /// Create a new error without a location.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
            location: None,
            hint: None,
        }
    }

    /// Create a new error at the given span.
    pub fn at(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, message).with_span(span)
    }

    /// Set the span of this error.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the span only if no (more specific) span is known yet.
    pub fn with_span_if_missing(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    /// Add a hint to this error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Replace the code of a syntax error, keeping message and span.
    ///
    /// End-of-input errors keep their code so callers can tell an incomplete
    /// script from a wrong one.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        if self.code != ErrorCode::UnexpectedEndOfInput {
            self.code = code;
        }
        self
    }

    /// Resolve line and column information against the script source.
    pub fn locate(mut self, source: &str) -> Self {
        if self.location.is_none() {
            if let Some(span) = &self.span {
                self.location = Some(SourceLocation::from_offset(source, span.start));
            }
        }
        self
    }

    /// Get the taxonomy name of this error.
    pub fn name(&self) -> &'static str {
        self.code.name()
    }

    /// Get the error code string.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Line number (1-indexed), if located.
    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(|loc| loc.line)
    }

    /// Column number (1-indexed), if located.
    pub fn column(&self) -> Option<usize> {
        self.location.as_ref().map(|loc| loc.column)
    }

    /// Start byte offset, if known.
    pub fn start(&self) -> Option<usize> {
        self.span.as_ref().map(|span| span.start)
    }

    /// End byte offset, if known.
    pub fn end(&self) -> Option<usize> {
        self.span.as_ref().map(|span| span.end)
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Source location with line and column information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// The content of the line.
    pub line_content: String,
}

impl SourceLocation {
    /// Calculate line and column from a byte offset in source code.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];

        let line = before.chars().filter(|&c| c == '\n').count() + 1;

        let last_newline = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[last_newline..].chars().count() + 1;

        let line_end = source[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(source.len());
        let line_content = source[last_newline..line_end].to_string();

        Self {
            line,
            column,
            line_content,
        }
    }
}

/// Convert a byte offset into a char offset, which is what reports index by.
fn char_offset(source: &str, byte_offset: usize) -> usize {
    source
        .char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}

/// Format an error with source context.
pub fn format_error(error: &ScriptError, source: &str, filename: Option<&str>) -> String {
    let filename = filename.unwrap_or("<script>");
    let span = error.span.clone().unwrap_or_else(|| Span::new(0, 0));
    let length = source.chars().count();
    let start = char_offset(source, span.start);
    let end = char_offset(source, span.end)
        .max(start + 1)
        .min(length.max(start));

    let mut report = Report::build(ReportKind::Error, filename, start)
        .with_config(Config::default().with_color(false))
        .with_code(error.code_str())
        .with_message(format!("{}: {}", error.name(), error.message))
        .with_label(Label::new((filename, start..end)).with_message(error.name()));

    if let Some(hint) = &error.hint {
        report = report.with_help(hint);
    }

    let mut buffer = Vec::new();
    match report
        .finish()
        .write((filename, Source::from(source)), &mut buffer)
    {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => format!("error[{}]: {}\n", error.code_str(), error),
    }
}
