//! Syntax tree for the s-expression DSL
//!
//! A [`Node`] is either a literal leaf or a symbolic node with an ordered
//! argument list. Nodes own their children exclusively; a parse result is a
//! plain tree with no sharing.
//!
//! ```text
//! (Q (F fact_sales f) (S (AS f.id order_id)))
//!
//! Symbolic Q
//! ├── Symbolic F [Symbolic fact_sales, Symbolic f]
//! └── Symbolic S
//!     └── Symbolic AS [Symbolic f.id, Symbolic order_id]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which token a literal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKind {
    String,
    Number,
}

/// A syntax-tree element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Decoded string content, or the verbatim text of a number
    Literal { kind: LiteralKind, value: String },

    /// `(symbol arg ...)`, or a bare identifier with no arguments
    Symbolic { symbol: String, args: Vec<Node> },
}

impl Node {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    pub fn string(value: impl Into<String>) -> Self {
        Node::Literal {
            kind: LiteralKind::String,
            value: value.into(),
        }
    }

    pub fn number(text: impl Into<String>) -> Self {
        Node::Literal {
            kind: LiteralKind::Number,
            value: text.into(),
        }
    }

    /// A bare identifier (symbolic node without arguments)
    pub fn ident(symbol: impl Into<String>) -> Self {
        Node::Symbolic {
            symbol: symbol.into(),
            args: Vec::new(),
        }
    }

    pub fn call(symbol: impl Into<String>, args: Vec<Node>) -> Self {
        Node::Symbolic {
            symbol: symbol.into(),
            args,
        }
    }

    // =========================================================================
    // PREDICATES
    // =========================================================================

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    /// Symbolic node with no arguments, e.g. `fact_sales` or `(LIMIT)`
    pub fn is_leaf_symbol(&self) -> bool {
        matches!(self, Node::Symbolic { args, .. } if args.is_empty())
    }

    // =========================================================================
    // EXTRACTORS
    // =========================================================================

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Node::Symbolic { symbol, .. } => Some(symbol),
            Node::Literal { .. } => None,
        }
    }

    /// Arguments of a symbolic node; literals have none
    pub fn args(&self) -> &[Node] {
        match self {
            Node::Symbolic { args, .. } => args,
            Node::Literal { .. } => &[],
        }
    }

    /// Decoded literal value
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Literal { value, .. } => Some(value),
            Node::Symbolic { .. } => None,
        }
    }

    pub fn literal_kind(&self) -> Option<LiteralKind> {
        match self {
            Node::Literal { kind, .. } => Some(*kind),
            Node::Symbolic { .. } => None,
        }
    }

    /// Find the first argument invoking `symbol`
    pub fn arg_with_symbol(&self, symbol: &str) -> Option<&Node> {
        self.args().iter().find(|a| a.symbol() == Some(symbol))
    }

    // =========================================================================
    // TREE WALKING
    // =========================================================================

    /// Depth of the tree rooted here; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self.args().iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Total number of nodes in the tree rooted here
    pub fn node_count(&self) -> usize {
        1 + self.args().iter().map(Node::node_count).sum::<usize>()
    }

    /// Pre-order visit of this node and all descendants
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Node),
    {
        visit(self);
        for arg in self.args() {
            arg.walk(visit);
        }
    }

    /// All symbolic nodes (at any depth) whose symbol equals `symbol`
    pub fn find_all<'a>(&'a self, symbol: &str) -> Vec<&'a Node> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if node.symbol() == Some(symbol) {
                found.push(node);
            }
        });
        found
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Node::Literal {
                kind: LiteralKind::String,
                value,
            } => format!("string literal '{}'", value),
            Node::Literal {
                kind: LiteralKind::Number,
                value,
            } => format!("number literal {}", value),
            Node::Symbolic { symbol, args } if args.is_empty() => {
                format!("identifier '{}'", symbol)
            }
            Node::Symbolic { symbol, .. } => format!("expression '({} ...)'", symbol),
        }
    }

    // =========================================================================
    // DSL RENDERING
    // =========================================================================

    /// Render the node back to DSL source
    ///
    /// Bare identifiers render without parens, so `(LIMIT)` comes back as
    /// `LIMIT`; both parse to the same tree.
    pub fn to_dsl_string(&self) -> String {
        match self {
            Node::Literal {
                kind: LiteralKind::String,
                value,
            } => format!("'{}'", escape_string(value)),
            Node::Literal {
                kind: LiteralKind::Number,
                value,
            } => value.clone(),
            Node::Symbolic { symbol, args } if args.is_empty() => symbol.clone(),
            Node::Symbolic { symbol, args } => {
                let mut parts = vec![format!("({}", symbol)];
                parts.extend(args.iter().map(Node::to_dsl_string));
                format!("{})", parts.join(" "))
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dsl_string())
    }
}

/// Render a whole program, one top-level expression per line
pub fn render_program(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(Node::to_dsl_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}
