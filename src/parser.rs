//! Recursive-descent parser for the s-expression DSL
//!
//! Grammar (informal):
//!
//! ```text
//! program := expr*
//! expr    := literal | identifier | sexpr
//! sexpr   := '(' identifier expr* ')'
//! ```
//!
//! Commas may appear between any two expressions and are skipped. With a
//! [`Grammar`] attached, each s-expression is validated as it closes, bare
//! top-level identifiers once they are read, and global constraints once the
//! whole program is parsed.
//!
//! A semantic failure is held until the structural parse completes, so a
//! syntax error anywhere in the input takes precedence. Otherwise the first
//! semantic failure in closing order is reported. No partial tree is returned.

use std::iter::Peekable;
use std::vec;

use tracing::debug;

use crate::ast::Node;
use crate::config::ParserConfig;
use crate::error::{DslError, DslResult};
use crate::grammar::Grammar;
use crate::lexer::{tokenize, Span, Token, TokenKind};
use crate::validator::{GrammarValidator, InvocationSite};

// ============================================================================
// Public API
// ============================================================================

/// Parse source text without a grammar
///
/// `None` is treated like the empty string and yields an empty program.
pub fn parse<'a>(source: impl Into<Option<&'a str>>) -> DslResult<Vec<Node>> {
    Parser::new(tokenize(source)?).parse()
}

/// Parse source text and validate it against `grammar`
pub fn parse_with_grammar<'a>(
    source: impl Into<Option<&'a str>>,
    grammar: &Grammar,
) -> DslResult<Vec<Node>> {
    Parser::new(tokenize(source)?)
        .with_grammar(grammar)
        .parse()
}

/// Single-use parser over one token stream
pub struct Parser<'g> {
    tokens: Peekable<vec::IntoIter<Token>>,
    /// Offset reported for a synthesized end of input
    end: usize,
    depth: usize,
    config: ParserConfig,
    validator: Option<GrammarValidator<'g>>,
    /// First semantic failure, reported once the input is structurally sound
    rejection: Option<DslError>,
}

impl<'g> Parser<'g> {
    /// Create a structural parser; a missing trailing `EndOfInput` is implied
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map_or(0, |t| t.span.end);
        Self {
            tokens: tokens.into_iter().peekable(),
            end,
            depth: 0,
            config: ParserConfig::default(),
            validator: None,
            rejection: None,
        }
    }

    /// Validate against `grammar` while parsing
    pub fn with_grammar(mut self, grammar: &'g Grammar) -> Self {
        self.validator = Some(GrammarValidator::new(grammar));
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Consume the parser, returning every top-level expression in source order
    pub fn parse(mut self) -> DslResult<Vec<Node>> {
        let grammar = self.validator.map(|v| v.grammar());

        match self.parse_program() {
            Ok(nodes) => {
                debug!(
                    nodes = nodes.len(),
                    grammar = grammar.map(Grammar::name),
                    "parsed program"
                );
                Ok(nodes)
            }
            Err(err) => {
                debug!(
                    category = %err.category(),
                    grammar = grammar.map(Grammar::name),
                    error = %err,
                    "rejected program"
                );
                Err(err)
            }
        }
    }

    // ========================================================================
    // Internal parsers
    // ========================================================================

    fn parse_program(&mut self) -> DslResult<Vec<Node>> {
        let mut nodes = Vec::new();

        loop {
            let token = self.next_significant();
            let position = token.position();

            match token.kind {
                TokenKind::EndOfInput => break,
                TokenKind::RightParen => {
                    return Err(DslError::UnexpectedCloseParen { position });
                }
                _ => {
                    let node = self.parse_expr(token)?;
                    self.validate(|v| v.check_top_level(&node, position));
                    nodes.push(node);
                }
            }
        }

        if let Some(err) = self.rejection.take() {
            return Err(err);
        }
        self.validate(|v| v.check_constraints(&nodes));

        match self.rejection.take() {
            Some(err) => Err(err),
            None => Ok(nodes),
        }
    }

    /// Run a grammar check unless one has already failed
    fn validate<F>(&mut self, check: F)
    where
        F: FnOnce(GrammarValidator<'g>) -> DslResult<()>,
    {
        if self.rejection.is_some() {
            return;
        }
        if let Some(validator) = self.validator {
            if let Err(err) = check(validator) {
                self.rejection = Some(err);
            }
        }
    }

    /// Parse one expression starting at `token`
    ///
    /// Callers have already handled `)`, commas and end of input.
    fn parse_expr(&mut self, token: Token) -> DslResult<Node> {
        match token.kind {
            TokenKind::LeftParen => self.parse_sexpr(token.position()),
            TokenKind::String => Ok(Node::string(token.text)),
            TokenKind::Number => Ok(Node::number(token.text)),
            _ => Ok(Node::ident(token.text)),
        }
    }

    /// Parse the rest of an s-expression whose `(` sits at `open`
    fn parse_sexpr(&mut self, open: usize) -> DslResult<Node> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(DslError::MaxDepthExceeded {
                max_depth: self.config.max_depth,
                position: open,
            });
        }

        let name = self.bump();
        let name_position = name.position();
        let symbol = match name.kind {
            TokenKind::Identifier => name.text,
            TokenKind::RightParen => return Err(DslError::EmptyExpression { position: open }),
            TokenKind::EndOfInput => return Err(DslError::UnmatchedOpenParen { position: open }),
            _ => {
                return Err(DslError::ExpectedSymbol {
                    found: name.describe(),
                    position: open,
                })
            }
        };

        let mut args = Vec::new();
        let mut arg_positions = Vec::new();
        loop {
            let token = self.next_significant();
            match token.kind {
                TokenKind::RightParen => break,
                // reported at the innermost paren still open
                TokenKind::EndOfInput => {
                    return Err(DslError::UnmatchedOpenParen { position: open })
                }
                _ => {
                    arg_positions.push(token.position());
                    args.push(self.parse_expr(token)?);
                }
            }
        }
        self.depth -= 1;

        let site = InvocationSite {
            open,
            symbol: name_position,
            args: &arg_positions,
        };
        self.validate(|v| v.check_invocation(&symbol, &args, site));

        Ok(Node::call(symbol, args))
    }

    // ========================================================================
    // Token stream
    // ========================================================================

    fn bump(&mut self) -> Token {
        self.tokens.next().unwrap_or_else(|| {
            Token::new(TokenKind::EndOfInput, "", Span::new(self.end, self.end))
        })
    }

    fn next_significant(&mut self) -> Token {
        while self
            .tokens
            .next_if(|t| t.kind == TokenKind::Comma)
            .is_some()
        {}
        self.bump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarDefinition, ParameterDefinition, SymbolDefinition};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_tree_shape() {
        let nodes =
            parse("(Q (F fact_sales f) (S (AS f.id order_id) (AS f.amount total)))").unwrap();
        assert_eq!(nodes.len(), 1);

        let q = &nodes[0];
        assert_eq!(q.symbol(), Some("Q"));
        assert_eq!(q.args().len(), 2);

        let f = &q.args()[0];
        assert_eq!(f.symbol(), Some("F"));
        assert_eq!(
            f.args(),
            &[Node::ident("fact_sales"), Node::ident("f")]
        );

        let s = &q.args()[1];
        assert_eq!(s.symbol(), Some("S"));
        assert_eq!(
            s.args(),
            &[
                Node::call("AS", vec![Node::ident("f.id"), Node::ident("order_id")]),
                Node::call("AS", vec![Node::ident("f.amount"), Node::ident("total")]),
            ]
        );
    }

    #[test]
    fn test_mixed_top_level() {
        let nodes = parse("'hello' 42 name (CALL x)").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::string("hello"),
                Node::number("42"),
                Node::ident("name"),
                Node::call("CALL", vec![Node::ident("x")]),
            ]
        );
    }

    #[test]
    fn test_empty_and_none_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse(None::<&str>).unwrap().is_empty());
        assert!(parse("  \n\t").unwrap().is_empty());
    }

    #[test]
    fn test_commas_are_skipped() {
        let with = parse("(F, a, b,), (G c)").unwrap();
        let without = parse("(F a b) (G c)").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_comma_in_symbol_position() {
        let err = parse("(, F)").unwrap_err();
        assert!(matches!(err, DslError::ExpectedSymbol { position: 0, .. }));
    }

    #[test]
    fn test_empty_expression() {
        let err = parse("(F ())").unwrap_err();
        assert_eq!(err, DslError::EmptyExpression { position: 3 });
        assert!(err.to_string().contains("empty expression"));
    }

    #[test]
    fn test_literal_in_symbol_position() {
        let err = parse("('F' a)").unwrap_err();
        assert!(err.to_string().contains("found string 'F'"));
        let err = parse("((F))").unwrap_err();
        assert!(matches!(err, DslError::ExpectedSymbol { .. }));
    }

    #[test]
    fn test_unmatched_open_reports_innermost() {
        assert_eq!(
            parse("(Q (F a").unwrap_err(),
            DslError::UnmatchedOpenParen { position: 3 }
        );
        assert_eq!(
            parse("(Q (F a)").unwrap_err(),
            DslError::UnmatchedOpenParen { position: 0 }
        );
        assert_eq!(
            parse("(").unwrap_err(),
            DslError::UnmatchedOpenParen { position: 0 }
        );
    }

    #[test]
    fn test_unexpected_close() {
        assert_eq!(
            parse("(F a))").unwrap_err(),
            DslError::UnexpectedCloseParen { position: 5 }
        );
        assert_eq!(
            parse(")").unwrap_err(),
            DslError::UnexpectedCloseParen { position: 0 }
        );
    }

    #[test]
    fn test_lex_errors_propagate() {
        assert!(matches!(
            parse("(F 'open").unwrap_err(),
            DslError::UnterminatedString { position: 3 }
        ));
        assert!(matches!(
            parse("(F #)").unwrap_err(),
            DslError::UnexpectedCharacter { character: '#', .. }
        ));
    }

    #[test]
    fn test_max_depth() {
        let config = ParserConfig::new(3);

        let ok = Parser::new(tokenize("(A (B (C x)))").unwrap())
            .with_config(config)
            .parse();
        assert!(ok.is_ok());

        let err = Parser::new(tokenize("(A (B (C (D x))))").unwrap())
            .with_config(config)
            .parse()
            .unwrap_err();
        assert_eq!(
            err,
            DslError::MaxDepthExceeded {
                max_depth: 3,
                position: 9
            }
        );
    }

    #[test]
    fn test_depth_resets_between_siblings() {
        let nodes = Parser::new(tokenize("(A (B x)) (A (B y)) (A (B z))").unwrap())
            .with_config(ParserConfig::new(2))
            .parse()
            .unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_tokens_without_end_marker() {
        let tokens = vec![
            Token::new(TokenKind::LeftParen, "(", Span::new(0, 1)),
            Token::new(TokenKind::Identifier, "F", Span::new(1, 2)),
            Token::new(TokenKind::RightParen, ")", Span::new(2, 3)),
        ];
        let nodes = Parser::new(tokens).parse().unwrap();
        assert_eq!(nodes, vec![Node::ident("F")]);

        assert!(Parser::new(Vec::new()).parse().unwrap().is_empty());
    }

    fn factory_grammar() -> Grammar {
        Grammar::new(
            GrammarDefinition::new("parser-test").with_symbol(
                "FACTORY",
                SymbolDefinition::new("source")
                    .param(ParameterDefinition::identifier("table"))
                    .param(ParameterDefinition::identifier("alias")),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_grammar_errors_carry_open_paren_position() {
        let grammar = factory_grammar();
        let err = parse_with_grammar("  (FACTORY t)", &grammar).unwrap_err();
        assert_eq!(
            err,
            DslError::MissingParameter {
                symbol: "FACTORY".into(),
                parameter: "alias".into(),
                position: 2
            }
        );
    }

    #[test]
    fn test_grammar_errors_point_at_arguments() {
        let grammar = factory_grammar();

        let err = parse_with_grammar("(FACTORY fact_sales 'f')", &grammar).unwrap_err();
        assert!(matches!(err, DslError::ExpectedIdentifier { position: 20, .. }));

        let err = parse_with_grammar("(FACTORY t,\n  a, x)", &grammar).unwrap_err();
        assert!(matches!(err, DslError::TooManyArguments { position: 17, .. }));
    }

    #[test]
    fn test_grammar_checks_bare_top_level_identifier() {
        let grammar = factory_grammar();
        let err = parse_with_grammar("'note' FACTORY", &grammar).unwrap_err();
        assert!(matches!(
            err,
            DslError::MissingParameter { position: 7, .. }
        ));

        let err = parse_with_grammar("fact_sales", &grammar).unwrap_err();
        assert!(err.to_string().contains("unknown symbol 'fact_sales'"));
    }

    #[test]
    fn test_syntax_errors_precede_semantic_errors() {
        let grammar = factory_grammar();
        // UNKNOWN closes first, but the stray paren still wins
        let err = parse_with_grammar("(UNKNOWN a) )", &grammar).unwrap_err();
        assert_eq!(err, DslError::UnexpectedCloseParen { position: 12 });

        let err = parse_with_grammar("(FACTORY t) (FACTORY t a", &grammar).unwrap_err();
        assert_eq!(err, DslError::UnmatchedOpenParen { position: 12 });
    }

    #[test]
    fn test_first_semantic_error_wins() {
        let grammar = factory_grammar();
        let err = parse_with_grammar("(UNKNOWN a) (FACTORY t)", &grammar).unwrap_err();
        assert!(matches!(err, DslError::UnknownSymbol { position: 1, .. }));

        // children close before their parent
        let err = parse_with_grammar("(FACTORY (NOPE) t)", &grammar).unwrap_err();
        assert!(matches!(err, DslError::UnknownSymbol { ref symbol, .. } if symbol == "NOPE"));
    }
}
