//! Parser configuration
//!
//! Inputs are normally single DSL expressions, but nesting depth is bounded so
//! that hostile input cannot grow the parser's stack without limit.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding [`ParserConfig::max_depth`]
pub const MAX_DEPTH_ENV: &str = "DSL_MAX_PARSE_DEPTH";

/// Default maximum nesting depth of s-expressions
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Deepest allowed `(` nesting; a top-level expression is depth 1
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Create config from the DSL_MAX_PARSE_DEPTH env var or defaults
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MAX_DEPTH_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::default();
        };

        match raw.trim().parse::<usize>() {
            Ok(depth) if depth > 0 => Self::new(depth),
            _ => {
                warn!(
                    value = raw,
                    default = DEFAULT_MAX_DEPTH,
                    "ignoring invalid {}",
                    MAX_DEPTH_ENV
                );
                Self::default()
            }
        }
    }
}
