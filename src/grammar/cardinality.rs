//! Parameter cardinality
//!
//! Controls how many argument nodes a parameter slot consumes when an
//! argument list is matched against a symbol definition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cardinality constraint for a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    /// Exactly one required
    #[default]
    Required,
    /// Optional, at most one
    Optional,
    /// Any number; absorbs every remaining argument
    ZeroOrMore,
    /// At least one; absorbs every remaining argument
    OneOrMore,
}

impl Cardinality {
    /// Get the minimum required count
    pub fn min_count(&self) -> usize {
        match self {
            Cardinality::Required | Cardinality::OneOrMore => 1,
            Cardinality::Optional | Cardinality::ZeroOrMore => 0,
        }
    }

    /// Get the maximum allowed count (None = unlimited)
    pub fn max_count(&self) -> Option<usize> {
        match self {
            Cardinality::Required | Cardinality::Optional => Some(1),
            Cardinality::OneOrMore | Cardinality::ZeroOrMore => None,
        }
    }

    /// Whether this slot absorbs all remaining arguments
    pub fn is_variadic(&self) -> bool {
        self.max_count().is_none()
    }

    /// How many of `available` arguments this slot takes
    pub fn take(&self, available: usize) -> usize {
        match self.max_count() {
            Some(max) => available.min(max),
            None => available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Required => "required",
            Cardinality::Optional => "optional",
            Cardinality::ZeroOrMore => "zeroOrMore",
            Cardinality::OneOrMore => "oneOrMore",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
