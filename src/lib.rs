//! S-expression DSL engine
//!
//! Turns DSL source text into a tree of [`Node`]s and, when a [`Grammar`] is
//! supplied, guarantees every node satisfies its symbol's declared contract.
//!
//! ## Pipeline
//!
//! ```text
//! Source ──► Lexer ──► Tokens ──► Parser ──► Vec<Node>
//!                                   │
//!                                   └─ GrammarValidator (optional, per closing paren)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use dsl_sexpr::{parse, parse_with_grammar, Grammar};
//!
//! let nodes = parse("(Q (F fact_sales f) (S (AS f.id order_id)))")?;
//! assert_eq!(nodes[0].symbol(), Some("Q"));
//!
//! let grammar: Grammar = serde_yaml::from_str(GRAMMAR_YAML)?;
//! let nodes = parse_with_grammar("(FACTORY fact_sales f)", &grammar)?;
//! ```
//!
//! Every failure is a [`DslError`]; branch on [`DslError::category`] or the
//! variant, and use [`Diagnostic::from_error`] for line/column reporting.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod validator;

pub use ast::{render_program, LiteralKind, Node};
pub use config::ParserConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, SourceSpan};
pub use error::{DslError, DslResult, ErrorCategory};
pub use grammar::{
    Cardinality, ConstraintKind, GlobalConstraint, Grammar, GrammarDefinition, GrammarSummary,
    LiteralDefinitions, LiteralType, ParameterDefinition, ParameterType, SymbolDefinition,
};
pub use lexer::{tokenize, Lexer, Span, Token, TokenKind};
pub use parser::{parse, parse_with_grammar, Parser};
pub use validator::{GrammarValidator, InvocationSite};
