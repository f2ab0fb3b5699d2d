//! Unified error types for glang.
//!
//! This module provides the error hierarchy for every phase of processing a
//! script: lexing, parsing, code generation, and run-time dispatch.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LexError        - Tokenization errors, surfaced through the parser
//! ParseError      - Parser errors (with ParseErrorKind), collected in ParseErrors
//! CompileError    - One diagnostic from the parser or code generator
//! CompileErrors   - The aggregate failure of a compile pass
//! RuntimeError    - Dispatch and execution failures
//! ```
//!
//! Compile-time errors are collected rather than returned early, so a single
//! pass reports every independent problem. A non-empty collection is always
//! surfaced as one [`CompileErrors`] value.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis (tokenization).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character that starts no token.
    #[error("Unknown token '{text}'")]
    UnknownToken { text: String, span: Span },

    /// A string literal was not terminated before the end of its line.
    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    /// A block comment was not properly terminated.
    #[error("Unterminated /*")]
    UnterminatedComment { span: Span },

    /// A malformed escape sequence inside a string or quoted identifier.
    #[error("{detail}")]
    InvalidEscape { span: Span, detail: String },

    /// A numeric literal could not be parsed.
    #[error("{detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnknownToken { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The lexer rejected part of the input.
    Lexical,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An expression was expected.
    ExpectedExpression,
    /// The left side of an assignment cannot be assigned to.
    InvalidAssignmentTarget,
    /// Two statements share a line without a separating semicolon.
    MissingSemicolon,
    /// A statement kind that is not allowed in its position.
    InvalidStatement,
    /// A call passes more arguments than the calling convention allows.
    TooManyArguments,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::InvalidAssignmentTarget => "invalid assignment target",
            ParseErrorKind::MissingSemicolon => "missing semicolon",
            ParseErrorKind::InvalidStatement => "invalid statement",
            ParseErrorKind::TooManyArguments => "too many arguments",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("Expected '{expected}', found '{found}'"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("Expected expression, found {found}"),
        )
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, error.span(), error.to_string())
    }
}

/// A collection of parse errors.
///
/// Used when parsing continues after encountering errors,
/// allowing multiple errors to be reported at once.
#[derive(Debug, Clone, Default)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Compile Errors
// ============================================================================

/// A single diagnostic reported by the parser or the code generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{span}: {reason}")]
pub struct CompileError {
    /// Where the problem is.
    pub span: Span,
    /// Human readable description.
    pub reason: String,
}

impl CompileError {
    pub fn new(span: Span, reason: impl Into<String>) -> Self {
        Self {
            span,
            reason: reason.into(),
        }
    }

    /// Format the error with source context for display.
    ///
    /// The header is `:LINE:COL REASON`. When the offending line exists it is
    /// printed with its leading whitespace stripped, followed by a caret row
    /// under the exact column range.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!(":{}:{}", self.span.line, self.span.col);
        if !self.reason.is_empty() {
            output.push(' ');
            output.push_str(&self.reason);
        }

        let line = source
            .lines()
            .nth(self.span.line.saturating_sub(1) as usize)
            .unwrap_or("");
        if line.is_empty() {
            return output;
        }

        let stripped = line.trim_start();
        let stripped_chars = line.chars().count() - stripped.chars().count();
        let line_str = self.span.line.to_string();
        output.push_str(&format!("\n {line_str:>3} | {stripped}\n    "));
        if line_str.len() > 3 {
            output.push_str(&" ".repeat(line_str.len() - 3));
        }
        output.push_str(" | ");
        let indent = (self.span.col as usize).saturating_sub(1 + stripped_chars);
        output.push_str(&" ".repeat(indent));
        output.push_str(&"^".repeat(self.span.len as usize));
        output
    }
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        CompileError::new(error.span, error.message)
    }
}

/// The aggregate failure of a compile pass: every collected diagnostic.
///
/// Any value of this type means the pass produced no usable output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileErrors {
    errors: Vec<CompileError>,
    /// Source text the diagnostics refer to, used for rendering.
    source: Option<String>,
}

impl CompileErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the source text so [`Display`](std::fmt::Display) renders context lines.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    /// Record a diagnostic at `span`.
    pub fn report(&mut self, span: Span, reason: impl Into<String>) {
        self.errors.push(CompileError::new(span, reason));
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = CompileError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<CompileError> {
        self.errors
    }

    /// `Ok(())` when nothing was collected, otherwise the whole collection.
    pub fn into_result(self) -> Result<(), CompileErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ParseErrors> for CompileErrors {
    fn from(errors: ParseErrors) -> Self {
        Self {
            errors: errors.into_iter().map(CompileError::from).collect(),
            source: None,
        }
    }
}

impl<'a> IntoIterator for &'a CompileErrors {
    type Item = &'a CompileError;
    type IntoIter = std::slice::Iter<'a, CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl std::fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compile failed")?;
        for error in &self.errors {
            writeln!(f)?;
            match &self.source {
                Some(source) => write!(f, "{}", error.display_with_source(source))?,
                None => write!(f, ":{}:{} {}", error.span.line, error.span.col, error.reason)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised by the dispatch runtime while executing compiled code.
///
/// None of these are retried or downgraded inside the runtime; they propagate
/// synchronously to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// No candidate accepts the observed call shape.
    #[error("no applicable overload for public fn {target} with args [{}]", .args.join(", "))]
    NoApplicableOverload {
        /// `Owner.name`, or just `Owner` for constructors.
        target: String,
        /// Simple type names of the call shape.
        args: Vec<String>,
    },

    /// No public member of that name exists at all.
    #[error("no such method: public fn {target}")]
    NoSuchMethod { target: String },

    /// A qualified import names both a field and a method or nested type.
    #[error("{}: Ambiguous import", import_display(.path, Some(.target.as_str())))]
    AmbiguousImport { path: Vec<String>, target: String },

    /// No class or member matches an import.
    #[error("{}{}", import_display(.path, .target.as_deref()), reason_suffix(.reason))]
    ImportNotFound {
        path: Vec<String>,
        /// `None` for a star import.
        target: Option<String>,
        reason: Option<String>,
    },

    /// A name is bound neither in the unit's globals nor the default imports.
    #[error("unknown global: {name}")]
    UnknownGlobal { name: String },

    /// The call target is a value that cannot be invoked.
    #[error("Cannot invoke object of type {type_name}")]
    UninvokableTarget { type_name: String },

    /// A member access or invocation on null.
    #[error("{message}")]
    NullTarget { message: String },

    /// A field that does not exist on the receiver.
    #[error("no such field: {}{owner}.{name}", static_prefix(.is_static))]
    NoSuchField {
        owner: String,
        name: String,
        is_static: bool,
    },

    /// Setting a field without a setter.
    #[error("Cannot set final field {owner}.{name}")]
    ReadOnlyField { owner: String, name: String },

    /// A class name the class path cannot resolve.
    #[error("class not found: {name}")]
    ClassNotFound { name: String },

    /// Integer overflow or division by zero inside a builtin.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// A builtin received an argument it cannot handle.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// A unit required at run time failed to compile.
    #[error("{0}")]
    CompileFailed(CompileErrors),

    /// Reading a source file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Compiled code violated an invariant the interpreter relies on.
    #[error("invalid bytecode: {0}")]
    InvalidBytecode(String),
}

impl RuntimeError {
    /// Build a null-target error.
    pub fn null_target(message: impl Into<String>) -> Self {
        RuntimeError::NullTarget {
            message: message.into(),
        }
    }

    /// Whether this error is an import failure, ambiguity included.
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self,
            RuntimeError::ImportNotFound { .. } | RuntimeError::AmbiguousImport { .. }
        )
    }
}

impl From<CompileErrors> for RuntimeError {
    fn from(errors: CompileErrors) -> Self {
        RuntimeError::CompileFailed(errors)
    }
}

fn import_display(path: &[String], target: Option<&str>) -> String {
    let mut out = path.join(".");
    if !out.is_empty() {
        out.push('.');
    }
    out.push_str(target.unwrap_or("*"));
    out
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default()
}

fn static_prefix(is_static: &bool) -> &'static str {
    if *is_static { "static " } else { "" }
}

/// Result alias used throughout the runtime.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_renders_caret_under_column() {
        let source = "var x = 1\n    foo bar\n";
        let error = CompileError::new(Span::new(2, 9, 3), "Multiple statements");
        let rendered = error.display_with_source(source);
        assert_eq!(rendered, ":2:9 Multiple statements\n   2 | foo bar\n     |     ^^^");
    }

    #[test]
    fn compile_error_without_line() {
        let error = CompileError::new(Span::new(5, 1, 1), "oops");
        assert_eq!(error.display_with_source("a"), ":5:1 oops");
    }

    #[test]
    fn compile_errors_aggregate() {
        let mut errors = CompileErrors::new();
        assert!(errors.clone().into_result().is_ok());
        errors.report(Span::new(1, 1, 1), "first");
        errors.report(Span::new(2, 1, 1), "second");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.to_string(), "compile failed\n:1:1 first\n:2:1 second");
    }

    #[test]
    fn parse_errors_convert_to_compile_errors() {
        let mut errors = ParseErrors::new();
        errors.push(ParseError::expected_token(Span::new(1, 4, 1), ";", ")"));
        let converted = CompileErrors::from(errors);
        assert_eq!(converted.iter().next().unwrap().reason, "Expected ';', found ')'");
    }

    #[test]
    fn import_messages() {
        let err = RuntimeError::ImportNotFound {
            path: vec!["a".into(), "b".into()],
            target: None,
            reason: None,
        };
        assert_eq!(err.to_string(), "a.b.*");

        let err = RuntimeError::AmbiguousImport {
            path: vec!["pkg".into(), "Holder".into()],
            target: "x".into(),
        };
        assert_eq!(err.to_string(), "pkg.Holder.x: Ambiguous import");
        assert!(err.is_import_failure());
    }

    #[test]
    fn lex_errors_become_parse_errors() {
        let err: ParseError = LexError::UnterminatedString {
            span: Span::new(1, 2, 1),
        }
        .into();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
        assert_eq!(err.message, "Unterminated string literal");
    }
}
