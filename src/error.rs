//! Error handling for the s-expression DSL engine
//!
//! Every failure - lexical, syntactic, semantic, or grammar construction -
//! surfaces as one [`DslError`]. Callers that need to branch use
//! [`DslError::category`] or match on the variant; the `Display` text is the
//! human-readable message.

use std::fmt;

use thiserror::Error;

use crate::grammar::LiteralType;

/// Coarse classification of a [`DslError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised by the lexer
    Lexical,
    /// Raised by the structural parser
    Syntax,
    /// Raised while validating against a grammar
    Semantic,
    /// Raised while constructing a grammar
    Grammar,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Lexical => "lexical",
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Semantic => "semantic",
            ErrorCategory::Grammar => "grammar",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for lexing, parsing, and validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DslError {
    // =========================================================================
    // Lexical errors
    // =========================================================================
    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    // =========================================================================
    // Syntax errors
    // =========================================================================
    #[error("empty expression at position {position}: '(' must be followed by a symbol")]
    EmptyExpression { position: usize },

    #[error("expected symbol name after '(' at position {position}, found {found}")]
    ExpectedSymbol { found: String, position: usize },

    #[error("unmatched '(' at position {position}")]
    UnmatchedOpenParen { position: usize },

    #[error("unexpected ')' at position {position}")]
    UnexpectedCloseParen { position: usize },

    #[error("nesting depth exceeds maximum of {max_depth} at position {position}")]
    MaxDepthExceeded { max_depth: usize, position: usize },

    // =========================================================================
    // Semantic errors
    // =========================================================================
    #[error("unknown symbol '{symbol}' at position {position}{}", suggestion_suffix(.suggestion))]
    UnknownSymbol {
        symbol: String,
        suggestion: Option<String>,
        position: usize,
    },

    #[error("symbol '{symbol}' requires parameter '{parameter}' (position {position})")]
    MissingParameter {
        symbol: String,
        parameter: String,
        position: usize,
    },

    #[error(
        "symbol '{symbol}' requires at least one occurrence of parameter '{parameter}' (position {position})"
    )]
    MissingRepeatedParameter {
        symbol: String,
        parameter: String,
        position: usize,
    },

    #[error("too many arguments for symbol '{symbol}': expected at most {expected}, got {found} (position {position})")]
    TooManyArguments {
        symbol: String,
        expected: usize,
        found: usize,
        position: usize,
    },

    #[error("parameter '{parameter}' of '{symbol}' expects an identifier but got {found} (position {position})")]
    ExpectedIdentifier {
        symbol: String,
        parameter: String,
        found: String,
        position: usize,
    },

    #[error("parameter '{parameter}' of '{symbol}' expects a symbolic node but got {found} (position {position})")]
    ExpectedNode {
        symbol: String,
        parameter: String,
        found: String,
        position: usize,
    },

    #[error(
        "parameter '{parameter}' of '{symbol}' expects one of [{}] but got '{found}' (position {position})",
        .allowed.join(", ")
    )]
    DisallowedSymbol {
        symbol: String,
        parameter: String,
        allowed: Vec<String>,
        found: String,
        position: usize,
    },

    #[error("parameter '{parameter}' of '{symbol}' expects literal type '{expected}' but got {found} (position {position})")]
    ExpectedLiteral {
        symbol: String,
        parameter: String,
        expected: LiteralType,
        found: String,
        position: usize,
    },

    #[error("program must have root symbol '{expected}' but {}", describe_root(.found))]
    MissingRootSymbol {
        expected: String,
        found: Option<String>,
    },

    // =========================================================================
    // Grammar construction errors
    // =========================================================================
    #[error("invalid {rule} pattern '{pattern}': {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },

    #[error("parameter '{parameter}' of symbol '{symbol}' is {cardinality} but is not the last parameter")]
    VariadicNotLast {
        symbol: String,
        parameter: String,
        cardinality: String,
    },

    #[error("symbol '{symbol}' is reserved and may not be redefined")]
    ReservedSymbol { symbol: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

fn describe_root(found: &Option<String>) -> String {
    match found {
        Some(symbol) => format!("found '{}'", symbol),
        None => "found no symbolic root".to_string(),
    }
}

impl DslError {
    /// Which stage raised this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            DslError::UnterminatedString { .. } | DslError::UnexpectedCharacter { .. } => {
                ErrorCategory::Lexical
            }
            DslError::EmptyExpression { .. }
            | DslError::ExpectedSymbol { .. }
            | DslError::UnmatchedOpenParen { .. }
            | DslError::UnexpectedCloseParen { .. }
            | DslError::MaxDepthExceeded { .. } => ErrorCategory::Syntax,
            DslError::UnknownSymbol { .. }
            | DslError::MissingParameter { .. }
            | DslError::MissingRepeatedParameter { .. }
            | DslError::TooManyArguments { .. }
            | DslError::ExpectedIdentifier { .. }
            | DslError::ExpectedNode { .. }
            | DslError::DisallowedSymbol { .. }
            | DslError::ExpectedLiteral { .. }
            | DslError::MissingRootSymbol { .. } => ErrorCategory::Semantic,
            DslError::InvalidPattern { .. }
            | DslError::VariadicNotLast { .. }
            | DslError::ReservedSymbol { .. } => ErrorCategory::Grammar,
        }
    }

    /// Byte offset of the offending token, when the error has one
    pub fn position(&self) -> Option<usize> {
        match self {
            DslError::UnterminatedString { position }
            | DslError::UnexpectedCharacter { position, .. }
            | DslError::EmptyExpression { position }
            | DslError::ExpectedSymbol { position, .. }
            | DslError::UnmatchedOpenParen { position }
            | DslError::UnexpectedCloseParen { position }
            | DslError::MaxDepthExceeded { position, .. }
            | DslError::UnknownSymbol { position, .. }
            | DslError::MissingParameter { position, .. }
            | DslError::MissingRepeatedParameter { position, .. }
            | DslError::TooManyArguments { position, .. }
            | DslError::ExpectedIdentifier { position, .. }
            | DslError::ExpectedNode { position, .. }
            | DslError::DisallowedSymbol { position, .. }
            | DslError::ExpectedLiteral { position, .. } => Some(*position),
            DslError::MissingRootSymbol { .. }
            | DslError::InvalidPattern { .. }
            | DslError::VariadicNotLast { .. }
            | DslError::ReservedSymbol { .. } => None,
        }
    }

    pub fn is_semantic(&self) -> bool {
        self.category() == ErrorCategory::Semantic
    }
}

/// Convenience alias used throughout the crate
pub type DslResult<T> = Result<T, DslError>;
