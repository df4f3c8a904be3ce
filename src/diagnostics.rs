//! Editor-facing diagnostics
//!
//! Converts a [`DslError`] into a serializable diagnostic with a line/column
//! span, suitable for an LSP server or a CLI that echoes the offending line.

use serde::{Deserialize, Serialize};

use crate::error::DslError;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic codes for categorizing issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // =========================================================================
    // Lexical errors
    // =========================================================================
    UnterminatedString,
    UnexpectedCharacter,

    // =========================================================================
    // Syntax errors
    // =========================================================================
    EmptyExpression,
    ExpectedSymbol,
    UnbalancedParens,
    NestingTooDeep,

    // =========================================================================
    // Validation errors
    // =========================================================================
    UnknownSymbol,
    MissingParameter,
    TooManyArguments,
    TypeMismatch,
    DisallowedSymbol,
    ConstraintViolation,

    // =========================================================================
    // Grammar errors
    // =========================================================================
    InvalidGrammar,
}

impl DiagnosticCode {
    pub fn for_error(error: &DslError) -> Self {
        match error {
            DslError::UnterminatedString { .. } => DiagnosticCode::UnterminatedString,
            DslError::UnexpectedCharacter { .. } => DiagnosticCode::UnexpectedCharacter,
            DslError::EmptyExpression { .. } => DiagnosticCode::EmptyExpression,
            DslError::ExpectedSymbol { .. } => DiagnosticCode::ExpectedSymbol,
            DslError::UnmatchedOpenParen { .. } | DslError::UnexpectedCloseParen { .. } => {
                DiagnosticCode::UnbalancedParens
            }
            DslError::MaxDepthExceeded { .. } => DiagnosticCode::NestingTooDeep,
            DslError::UnknownSymbol { .. } => DiagnosticCode::UnknownSymbol,
            DslError::MissingParameter { .. } | DslError::MissingRepeatedParameter { .. } => {
                DiagnosticCode::MissingParameter
            }
            DslError::TooManyArguments { .. } => DiagnosticCode::TooManyArguments,
            DslError::ExpectedIdentifier { .. }
            | DslError::ExpectedNode { .. }
            | DslError::ExpectedLiteral { .. } => DiagnosticCode::TypeMismatch,
            DslError::DisallowedSymbol { .. } => DiagnosticCode::DisallowedSymbol,
            DslError::MissingRootSymbol { .. } => DiagnosticCode::ConstraintViolation,
            DslError::InvalidPattern { .. }
            | DslError::VariadicNotLast { .. }
            | DslError::ReservedSymbol { .. } => DiagnosticCode::InvalidGrammar,
        }
    }
}

/// Source location span, 1-based
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a span from byte offsets into `source`
    pub fn from_byte_offset(source: &str, start: usize, end: usize) -> Self {
        let (start_line, start_col) = byte_to_line_col(source, start);
        let (end_line, end_col) = byte_to_line_col(source, end);
        Self::new(start_line, start_col, end_line, end_col)
    }
}

/// Convert byte offset to line and column (columns count chars, not bytes)
fn byte_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Suggested replacement for a code action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    pub description: String,
    pub replacement: String,
    pub span: SourceSpan,
}

/// A diagnostic message with location, severity, and optional fix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub category: String,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub suggested_fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            category: String::new(),
            message: message.into(),
            span: None,
            suggested_fix: None,
        }
    }

    /// Build a diagnostic for an error raised while parsing `source`
    ///
    /// An unknown symbol with a suggestion spans the symbol name and carries
    /// a fix. Errors without a position (grammar construction, root
    /// constraints) get no span.
    pub fn from_error(error: &DslError, source: &str) -> Self {
        let mut diag = Self::error(DiagnosticCode::for_error(error), error.to_string());
        diag.category = error.category().to_string();

        if let DslError::UnknownSymbol {
            symbol,
            suggestion: Some(suggestion),
            position,
        } = error
        {
            let span = SourceSpan::from_byte_offset(source, *position, position + symbol.len());
            return diag.with_span(span).with_fix(SuggestedFix {
                description: format!("replace '{}' with '{}'", symbol, suggestion),
                replacement: suggestion.clone(),
                span,
            });
        }

        if let Some(position) = error.position() {
            let end = source
                .get(position..)
                .and_then(|rest| rest.chars().next())
                .map_or(position, |c| position + c.len_utf8());
            diag = diag.with_span(SourceSpan::from_byte_offset(source, position, end));
        }
        diag
    }

    /// Add source span
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Add suggested fix
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fix = Some(fix);
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}
