//! Grammar model for the s-expression DSL
//!
//! A [`GrammarDefinition`] is plain data. [`Grammar::new`] checks it, compiles
//! its regular expressions, and returns an immutable schema that any number of
//! parses may share (it is `Send + Sync` and never mutated after construction).
//!
//! Construction rejects:
//! - a `zeroOrMore`/`oneOrMore` parameter that is not the last of its symbol
//! - a definition for a name listed in `reservedSymbols`
//! - any identifier or literal pattern that does not compile
//!
//! Patterns are anchored, so a rule must match the whole text.

mod cardinality;
mod types;

pub use cardinality::Cardinality;
pub use types::{
    ConstraintKind, DslMetadata, GlobalConstraint, GrammarDefinition, IdentifierRule,
    LiteralDefinitions, LiteralType, ParameterDefinition, ParameterType, SymbolDefinition,
    DEFAULT_IDENTIFIER_PATTERN,
};

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::ast::LiteralKind;
use crate::error::{DslError, DslResult};

/// Minimum Jaro-Winkler similarity for an unknown-symbol suggestion
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Compiled, immutable grammar
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "GrammarDefinition")]
pub struct Grammar {
    definition: GrammarDefinition,
    identifier: Regex,
    literals: LiteralMatchers,
}

#[derive(Debug, Clone, Default)]
struct LiteralMatchers {
    string: Option<Regex>,
    number: Option<Regex>,
    boolean: Option<Regex>,
    null: Option<Regex>,
}

impl LiteralMatchers {
    fn compile(defs: &LiteralDefinitions) -> DslResult<Self> {
        let compile = |lt: LiteralType| {
            defs.rule(lt)
                .map(|p| compile_anchored(&format!("{} literal", lt), p))
                .transpose()
        };

        Ok(Self {
            string: compile(LiteralType::String)?,
            number: compile(LiteralType::Number)?,
            boolean: compile(LiteralType::Boolean)?,
            null: compile(LiteralType::Null)?,
        })
    }

    fn get(&self, literal_type: LiteralType) -> Option<&Regex> {
        match literal_type {
            LiteralType::String => self.string.as_ref(),
            LiteralType::Number => self.number.as_ref(),
            LiteralType::Boolean => self.boolean.as_ref(),
            LiteralType::Null => self.null.as_ref(),
        }
    }
}

fn compile_anchored(rule: &str, pattern: &str) -> DslResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| DslError::InvalidPattern {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl Grammar {
    /// Check and compile a grammar definition
    pub fn new(definition: GrammarDefinition) -> DslResult<Self> {
        check_symbols(&definition)?;

        let identifier = compile_anchored("identifier", &definition.identifier.pattern)?;
        let literals = LiteralMatchers::compile(&definition.literals)?;

        for constraint in &definition.constraints {
            if constraint.kind == ConstraintKind::MustHaveRoot
                && !definition.symbols.contains_key(&constraint.value)
            {
                warn!(
                    root = %constraint.value,
                    "mustHaveRoot names a symbol the grammar does not define"
                );
            }
        }

        info!(
            grammar = %definition.dsl.name,
            symbols = definition.symbols.len(),
            constraints = definition.constraints.len(),
            "compiled grammar"
        );

        Ok(Self {
            definition,
            identifier,
            literals,
        })
    }

    pub fn definition(&self) -> &GrammarDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.dsl.name
    }

    pub fn format_version(&self) -> &str {
        &self.definition.format_version
    }

    pub fn symbols(&self) -> &BTreeMap<String, SymbolDefinition> {
        &self.definition.symbols
    }

    /// Case-sensitive symbol lookup
    pub fn symbol(&self, name: &str) -> Option<&SymbolDefinition> {
        self.definition.symbols.get(name)
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.definition.symbols.contains_key(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.definition.reserved_symbols.contains(name)
    }

    pub fn constraints(&self) -> &[GlobalConstraint] {
        &self.definition.constraints
    }

    /// The root demanded by the first `mustHaveRoot` constraint, if any
    pub fn required_root(&self) -> Option<&str> {
        self.definition
            .constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::MustHaveRoot)
            .map(|c| c.value.as_str())
    }

    pub fn matches_identifier(&self, text: &str) -> bool {
        self.identifier.is_match(text)
    }

    /// Does a literal satisfy the rule for `literal_type`?
    ///
    /// Without a rule for the subtype, strings and numbers must come from the
    /// matching token kind, booleans must read `true`/`false`, and nulls `null`.
    pub fn accepts_literal(&self, literal_type: LiteralType, kind: LiteralKind, value: &str) -> bool {
        if let Some(rule) = self.literals.get(literal_type) {
            return rule.is_match(value);
        }

        match literal_type {
            LiteralType::String => kind == LiteralKind::String,
            LiteralType::Number => kind == LiteralKind::Number,
            LiteralType::Boolean => value == "true" || value == "false",
            LiteralType::Null => value == "null",
        }
    }

    /// Closest defined symbol to an unknown name
    pub fn suggest_symbol(&self, name: &str) -> Option<&str> {
        self.definition
            .symbols
            .keys()
            .map(|candidate| (candidate, strsim::jaro_winkler(name, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .fold(None::<(&String, f64)>, |best, (candidate, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((candidate, score)),
            })
            .map(|(candidate, _)| candidate.as_str())
    }

    /// Generate a summary of the grammar
    pub fn summary(&self) -> GrammarSummary {
        let mut summary = GrammarSummary {
            name: self.name().to_string(),
            symbol_count: self.definition.symbols.len(),
            constraint_count: self.definition.constraints.len(),
            required_root: self.required_root().map(str::to_string),
            ..GrammarSummary::default()
        };

        for param in self.definition.symbols.values().flat_map(|s| &s.parameters) {
            summary.parameter_count += 1;
            match param.cardinality {
                Cardinality::Required => summary.required_count += 1,
                Cardinality::Optional => summary.optional_count += 1,
                Cardinality::ZeroOrMore | Cardinality::OneOrMore => {
                    summary.repetition_count += 1
                }
            }
        }

        summary
    }
}

impl TryFrom<GrammarDefinition> for Grammar {
    type Error = DslError;

    fn try_from(definition: GrammarDefinition) -> Result<Self, Self::Error> {
        Grammar::new(definition)
    }
}

fn check_symbols(definition: &GrammarDefinition) -> DslResult<()> {
    for (name, symbol) in &definition.symbols {
        if definition.reserved_symbols.contains(name) {
            return Err(DslError::ReservedSymbol {
                symbol: name.clone(),
            });
        }

        let last = symbol.parameters.len().saturating_sub(1);
        for (index, param) in symbol.parameters.iter().enumerate() {
            if param.cardinality.is_variadic() && index != last {
                return Err(DslError::VariadicNotLast {
                    symbol: name.clone(),
                    parameter: param.name.clone(),
                    cardinality: param.cardinality.to_string(),
                });
            }

            if param.allowed_symbols.is_empty() {
                continue;
            }
            if param.param_type != ParameterType::Node {
                warn!(
                    symbol = %name,
                    parameter = %param.name,
                    "allowedSymbols is ignored on a parameter that is not of type node"
                );
            }
            for allowed in &param.allowed_symbols {
                if !definition.symbols.contains_key(allowed) {
                    warn!(
                        symbol = %name,
                        parameter = %param.name,
                        allowed = %allowed,
                        "allowedSymbols names an undefined symbol"
                    );
                }
            }
        }
    }
    Ok(())
}

/// Summary information about a grammar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarSummary {
    pub name: String,
    pub symbol_count: usize,
    pub parameter_count: usize,
    pub required_count: usize,
    pub optional_count: usize,
    pub repetition_count: usize,
    pub constraint_count: usize,
    pub required_root: Option<String>,
}
