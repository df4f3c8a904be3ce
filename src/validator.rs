//! Grammar-driven validation of parsed nodes
//!
//! The parser calls [`GrammarValidator::check_invocation`] as each
//! s-expression closes, so children are always checked before their parent,
//! and [`GrammarValidator::check_constraints`] once over the top-level result.
//!
//! # Argument matching
//!
//! Parameter definitions are walked in order, consuming from the argument list:
//!
//! | cardinality  | consumes                   | fails when            |
//! |--------------|----------------------------|-----------------------|
//! | `required`   | exactly one                | nothing left          |
//! | `optional`   | one if available           | never                 |
//! | `oneOrMore`  | everything remaining       | nothing left          |
//! | `zeroOrMore` | everything remaining       | never                 |
//!
//! Arguments left over once every definition is walked are an error.
//!
//! A `node` slot accepts any symbolic node, bare identifiers included, subject
//! only to `allowedSymbols`. A bare identifier in such a slot is not itself
//! checked as an invocation.

use tracing::trace;

use crate::ast::Node;
use crate::error::{DslError, DslResult};
use crate::grammar::{
    Cardinality, ConstraintKind, Grammar, ParameterDefinition, ParameterType, SymbolDefinition,
};

/// Source offsets of one invocation, used for error positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationSite<'a> {
    /// The `(` of the expression, or the start of a bare identifier
    pub open: usize,
    /// Start of the symbol name
    pub symbol: usize,
    /// Start of each argument, parallel to the argument list
    pub args: &'a [usize],
}

impl InvocationSite<'static> {
    /// A site where every error is reported at `position`
    pub const fn at(position: usize) -> Self {
        Self {
            open: position,
            symbol: position,
            args: &[],
        }
    }
}

impl InvocationSite<'_> {
    fn arg(&self, index: usize) -> usize {
        self.args.get(index).copied().unwrap_or(self.open)
    }
}

/// Validates nodes against one grammar
#[derive(Debug, Clone, Copy)]
pub struct GrammarValidator<'g> {
    grammar: &'g Grammar,
}

impl<'g> GrammarValidator<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Check `(symbol args...)` against the symbol's parameter contract
    ///
    /// Unknown symbols are reported at the symbol name, missing parameters at
    /// the opening paren, and argument errors at the offending argument.
    pub fn check_invocation(
        &self,
        symbol: &str,
        args: &[Node],
        site: InvocationSite<'_>,
    ) -> DslResult<()> {
        let definition = self.lookup(symbol, site.symbol)?;
        trace!(symbol, args = args.len(), "checking invocation");

        let mut cursor = 0;
        for param in &definition.parameters {
            let take = param.cardinality.take(args.len() - cursor);

            if take < param.cardinality.min_count() {
                return Err(missing_parameter(symbol, param, site.open));
            }

            for (index, arg) in args.iter().enumerate().skip(cursor).take(take) {
                self.check_argument(symbol, param, arg, site.arg(index))?;
            }
            cursor += take;
        }

        if cursor < args.len() {
            return Err(DslError::TooManyArguments {
                symbol: symbol.to_string(),
                expected: cursor,
                found: args.len(),
                position: site.arg(cursor),
            });
        }

        Ok(())
    }

    /// Check a node appearing at top level
    ///
    /// Parenthesized expressions were already checked when they closed; a
    /// bare identifier is checked as a zero-argument invocation.
    pub fn check_top_level(&self, node: &Node, position: usize) -> DslResult<()> {
        match node.symbol() {
            Some(symbol) if node.is_leaf_symbol() => {
                self.check_invocation(symbol, &[], InvocationSite::at(position))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate every global constraint against the top-level nodes
    pub fn check_constraints(&self, nodes: &[Node]) -> DslResult<()> {
        for constraint in self.grammar.constraints() {
            match constraint.kind {
                ConstraintKind::MustHaveRoot => {
                    let found = nodes.first().and_then(Node::symbol);
                    if found != Some(constraint.value.as_str()) {
                        return Err(DslError::MissingRootSymbol {
                            expected: constraint.value.clone(),
                            found: found.map(str::to_string),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, symbol: &str, position: usize) -> DslResult<&'g SymbolDefinition> {
        self.grammar
            .symbol(symbol)
            .ok_or_else(|| DslError::UnknownSymbol {
                symbol: symbol.to_string(),
                suggestion: self.grammar.suggest_symbol(symbol).map(str::to_string),
                position,
            })
    }

    fn check_argument(
        &self,
        symbol: &str,
        param: &ParameterDefinition,
        arg: &Node,
        position: usize,
    ) -> DslResult<()> {
        match param.param_type {
            ParameterType::Identifier => match arg.symbol() {
                Some(ident) if arg.is_leaf_symbol() && self.grammar.matches_identifier(ident) => {
                    Ok(())
                }
                Some(ident) if arg.is_leaf_symbol() => Err(DslError::ExpectedIdentifier {
                    symbol: symbol.to_string(),
                    parameter: param.name.clone(),
                    found: format!("'{}', which does not match the identifier rule", ident),
                    position,
                }),
                _ => Err(DslError::ExpectedIdentifier {
                    symbol: symbol.to_string(),
                    parameter: param.name.clone(),
                    found: arg.describe(),
                    position,
                }),
            },

            ParameterType::Node => match arg.symbol() {
                Some(child)
                    if !param.allowed_symbols.is_empty()
                        && !param.allowed_symbols.iter().any(|a| a == child) =>
                {
                    Err(DslError::DisallowedSymbol {
                        symbol: symbol.to_string(),
                        parameter: param.name.clone(),
                        allowed: param.allowed_symbols.clone(),
                        found: child.to_string(),
                        position,
                    })
                }
                Some(_) => Ok(()),
                None => Err(DslError::ExpectedNode {
                    symbol: symbol.to_string(),
                    parameter: param.name.clone(),
                    found: arg.describe(),
                    position,
                }),
            },

            ParameterType::Literal(expected) => match arg {
                Node::Literal { kind, value }
                    if self.grammar.accepts_literal(expected, *kind, value) =>
                {
                    Ok(())
                }
                other => Err(DslError::ExpectedLiteral {
                    symbol: symbol.to_string(),
                    parameter: param.name.clone(),
                    expected,
                    found: other.describe(),
                    position,
                }),
            },
        }
    }
}

fn missing_parameter(symbol: &str, param: &ParameterDefinition, position: usize) -> DslError {
    match param.cardinality {
        Cardinality::OneOrMore => DslError::MissingRepeatedParameter {
            symbol: symbol.to_string(),
            parameter: param.name.clone(),
            position,
        },
        _ => DslError::MissingParameter {
            symbol: symbol.to_string(),
            parameter: param.name.clone(),
            position,
        },
    }
}
