//! Grammar definition value types
//!
//! Plain data describing a DSL: symbols, their positional parameters, literal
//! and identifier format rules, and whole-tree constraints. These types carry
//! no behaviour beyond construction helpers; [`super::Grammar`] compiles them
//! into a validated, immutable schema.
//!
//! They deserialize from JSON or YAML with camelCase keys:
//!
//! ```yaml
//! formatVersion: "1.0"
//! dsl: { name: query, version: "0.3" }
//! identifier: { pattern: "[a-z_][a-z0-9_.]*" }
//! symbols:
//!   F:
//!     kind: source
//!     parameters:
//!       - { name: table, type: identifier }
//!       - { name: alias, type: identifier }
//! constraints:
//!   - { kind: mustHaveRoot, value: Q }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cardinality::Cardinality;

/// Default rule for bare identifiers; mirrors the lexer's identifier shape
pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"[A-Za-z_][A-Za-z0-9_.\-]*";

// =============================================================================
// GRAMMAR DEFINITION
// =============================================================================

/// Complete, uncompiled grammar definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarDefinition {
    #[serde(default = "default_format_version")]
    pub format_version: String,
    #[serde(default)]
    pub dsl: DslMetadata,
    #[serde(default)]
    pub symbols: BTreeMap<String, SymbolDefinition>,
    #[serde(default)]
    pub literals: LiteralDefinitions,
    #[serde(default)]
    pub identifier: IdentifierRule,
    /// Names that may not be defined as symbols
    #[serde(default)]
    pub reserved_symbols: BTreeSet<String>,
    /// Opaque passthrough, not consulted when parsing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<serde_json::Value>,
    #[serde(default)]
    pub constraints: Vec<GlobalConstraint>,
}

fn default_format_version() -> String {
    "1.0".to_string()
}

impl GrammarDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            format_version: default_format_version(),
            dsl: DslMetadata {
                name: name.into(),
                ..DslMetadata::default()
            },
            symbols: BTreeMap::new(),
            literals: LiteralDefinitions::default(),
            identifier: IdentifierRule::default(),
            reserved_symbols: BTreeSet::new(),
            embedding: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, name: impl Into<String>, symbol: SymbolDefinition) -> Self {
        self.symbols.insert(name.into(), symbol);
        self
    }

    pub fn with_literals(mut self, literals: LiteralDefinitions) -> Self {
        self.literals = literals;
        self
    }

    pub fn with_identifier_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.identifier = IdentifierRule::new(pattern);
        self
    }

    pub fn with_reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved_symbols.insert(name.into());
        self
    }

    pub fn with_constraint(mut self, constraint: GlobalConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_embedding(mut self, embedding: serde_json::Value) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Descriptive DSL metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DslMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
}

// =============================================================================
// SYMBOLS AND PARAMETERS
// =============================================================================

/// Definition of one symbol; parameter order is the positional contract
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolDefinition {
    pub description: String,
    /// Structural classification, e.g. "clause" or "expression"
    pub kind: String,
    pub parameters: Vec<ParameterDefinition>,
}

impl SymbolDefinition {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn param(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// One positional parameter slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Only meaningful for `node` parameters; empty accepts any symbol
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_symbols: Vec<String>,
    #[serde(default)]
    pub cardinality: Cardinality,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            param_type,
            allowed_symbols: Vec::new(),
            cardinality: Cardinality::Required,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Identifier)
    }

    pub fn node(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Node)
    }

    pub fn literal(name: impl Into<String>, literal_type: LiteralType) -> Self {
        Self::new(name, ParameterType::Literal(literal_type))
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn optional(self) -> Self {
        self.with_cardinality(Cardinality::Optional)
    }

    pub fn zero_or_more(self) -> Self {
        self.with_cardinality(Cardinality::ZeroOrMore)
    }

    pub fn one_or_more(self) -> Self {
        self.with_cardinality(Cardinality::OneOrMore)
    }

    pub fn allow<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_symbols.extend(symbols.into_iter().map(Into::into));
        self
    }
}

/// What an argument in a parameter slot must look like
///
/// Serialized as `identifier`, `node`, or `literal(<subtype>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParameterType {
    /// Bare identifier matching the grammar's identifier rule
    Identifier,
    /// Any symbolic node, optionally restricted by `allowed_symbols`
    Node,
    /// Literal whose decoded text matches the grammar's rule for the subtype
    Literal(LiteralType),
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Identifier => f.write_str("identifier"),
            ParameterType::Node => f.write_str("node"),
            ParameterType::Literal(lt) => write!(f, "literal({})", lt),
        }
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "identifier" => return Ok(ParameterType::Identifier),
            "node" => return Ok(ParameterType::Node),
            _ => {}
        }

        s.strip_prefix("literal(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("unknown parameter type '{}'", s))
            .and_then(|inner| inner.trim().parse::<LiteralType>())
            .map(ParameterType::Literal)
    }
}

impl TryFrom<String> for ParameterType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParameterType> for String {
    fn from(value: ParameterType) -> Self {
        value.to_string()
    }
}

// =============================================================================
// LITERAL AND IDENTIFIER RULES
// =============================================================================

/// Literal subtypes a parameter can demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralType {
    String,
    Number,
    Boolean,
    Null,
}

impl LiteralType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralType::String => "string",
            LiteralType::Number => "number",
            LiteralType::Boolean => "boolean",
            LiteralType::Null => "null",
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiteralType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(LiteralType::String),
            "number" => Ok(LiteralType::Number),
            "boolean" => Ok(LiteralType::Boolean),
            "null" => Ok(LiteralType::Null),
            other => Err(format!("unknown literal type '{}'", other)),
        }
    }
}

/// Optional format rule (regex) per literal subtype
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteralDefinitions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null: Option<String>,
}

impl LiteralDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(&self, literal_type: LiteralType) -> Option<&str> {
        match literal_type {
            LiteralType::String => self.string.as_deref(),
            LiteralType::Number => self.number.as_deref(),
            LiteralType::Boolean => self.boolean.as_deref(),
            LiteralType::Null => self.null.as_deref(),
        }
    }

    pub fn with_rule(mut self, literal_type: LiteralType, pattern: impl Into<String>) -> Self {
        let pattern = Some(pattern.into());
        match literal_type {
            LiteralType::String => self.string = pattern,
            LiteralType::Number => self.number = pattern,
            LiteralType::Boolean => self.boolean = pattern,
            LiteralType::Null => self.null = pattern,
        }
        self
    }
}

/// Rule every identifier-typed argument must match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRule {
    pub pattern: String,
}

impl IdentifierRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for IdentifierRule {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTIFIER_PATTERN)
    }
}

// =============================================================================
// GLOBAL CONSTRAINTS
// =============================================================================

/// Whole-tree constraint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    /// The first top-level node must invoke `value`
    MustHaveRoot,
}

/// A rule evaluated once against the whole parse result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConstraint {
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl GlobalConstraint {
    pub fn must_have_root(symbol: impl Into<String>) -> Self {
        Self {
            kind: ConstraintKind::MustHaveRoot,
            scope: None,
            value: symbol.into(),
            data: None,
        }
    }
}
