//! Grammar-validated parsing against a warehouse query grammar.

mod common;

use std::sync::Arc;

use common::{init_tracing, warehouse_definition, warehouse_grammar};
use dsl_sexpr::{
    parse_with_grammar, Diagnostic, DiagnosticCode, DslError, ErrorCategory, GlobalConstraint,
    Grammar, GrammarDefinition, LiteralType, Node, ParameterDefinition, Parser, ParserConfig,
    SymbolDefinition,
};
use pretty_assertions::assert_eq;

#[test]
fn missing_required_parameter_names_it() {
    init_tracing();
    let grammar = warehouse_grammar();

    let err = parse_with_grammar("(FACTORY fact_sales)", &grammar).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Semantic);
    assert!(err.to_string().contains("alias"), "got: {}", err);
}

#[test]
fn zero_or_more_absorbs_all_arguments() {
    let grammar = warehouse_grammar();

    let nodes = parse_with_grammar("(AGGREGATOR col1 col2 col3)", &grammar).unwrap();
    assert_eq!(nodes[0].args().len(), 3);

    let nodes = parse_with_grammar("(AGGREGATOR)", &grammar).unwrap();
    assert!(nodes[0].args().is_empty());
}

#[test]
fn one_or_more_needs_an_occurrence() {
    let grammar = warehouse_grammar();

    let err = parse_with_grammar("(SELECTOR)", &grammar).unwrap_err();
    assert!(err
        .to_string()
        .contains("requires at least one occurrence of parameter 'columns'"));

    assert!(parse_with_grammar("(SELECTOR a, b)", &grammar).is_ok());
}

#[test]
fn disallowed_child_lists_allowed_symbols() {
    let grammar = warehouse_grammar();

    let err = parse_with_grammar("(NESTED (SELECTOR col1))", &grammar).unwrap_err();
    match &err {
        DslError::DisallowedSymbol { allowed, found, .. } => {
            assert!(allowed.iter().any(|s| s == "FACTORY"));
            assert_eq!(found, "SELECTOR");
        }
        other => panic!("expected DisallowedSymbol, got {:?}", other),
    }
    assert!(err.to_string().contains("FACTORY"));
}

#[test]
fn must_have_root_constraint() {
    let definition = warehouse_definition().with_constraint(GlobalConstraint::must_have_root("NESTED"));
    let grammar = Grammar::new(definition).unwrap();

    let err = parse_with_grammar("(FACTORY fact_sales f)", &grammar).unwrap_err();
    assert!(err.to_string().contains("must have root symbol 'NESTED'"));

    let nodes = parse_with_grammar("(NESTED (FACTORY fact_sales f) (LIMITER 10))", &grammar).unwrap();
    assert_eq!(nodes[0].symbol(), Some("NESTED"));
    assert_eq!(nodes[0].find_all("FACTORY").len(), 1);
}

#[test]
fn literal_rules_and_kinds() {
    let grammar = warehouse_grammar();

    assert!(parse_with_grammar("(LIMITER 10 'top ten')", &grammar).is_ok());

    let err = parse_with_grammar("(LIMITER 'ten')", &grammar).unwrap_err();
    assert!(matches!(
        err,
        DslError::ExpectedLiteral {
            expected: LiteralType::Number,
            ..
        }
    ));

    // no coercion: an identifier is never a literal
    let err = parse_with_grammar("(LIMITER ten)", &grammar).unwrap_err();
    assert!(err.to_string().contains("expects literal type 'number'"));
}

#[test]
fn literal_is_never_an_identifier() {
    let grammar = warehouse_grammar();

    let err = parse_with_grammar("(FACTORY 'fact_sales' f)", &grammar).unwrap_err();
    assert!(matches!(err, DslError::ExpectedIdentifier { ref parameter, .. } if parameter == "table"));

    // the grammar's identifier rule is stricter than the lexer
    let err = parse_with_grammar("(FACTORY FactSales f)", &grammar).unwrap_err();
    assert!(matches!(err, DslError::ExpectedIdentifier { .. }));
}

#[test]
fn unknown_symbol_suggests_closest() {
    let grammar = warehouse_grammar();

    let source = "(NESTED\n  (FACTORI fact_sales f))";
    let err = parse_with_grammar(source, &grammar).unwrap_err();
    assert!(err.to_string().contains("unknown symbol 'FACTORI'"));
    assert!(err.to_string().contains("did you mean 'FACTORY'?"));

    let diag = Diagnostic::from_error(&err, source);
    assert_eq!(diag.code, DiagnosticCode::UnknownSymbol);
    let span = diag.span.unwrap();
    assert_eq!((span.start_line, span.start_col), (2, 4));
}

#[test]
fn bare_symbol_in_node_slot_is_only_checked_against_allowed() {
    let grammar = warehouse_grammar();

    assert!(parse_with_grammar("(NESTED FACTORY)", &grammar).is_ok());
    let wrapped = parse_with_grammar("(NESTED (FACTORY))", &grammar).unwrap_err();
    assert!(matches!(wrapped, DslError::MissingParameter { .. }));

    assert_eq!(
        parse_with_grammar("(NESTED AGGREGATOR)", &grammar).unwrap_err(),
        DslError::DisallowedSymbol {
            symbol: "NESTED".into(),
            parameter: "child".into(),
            allowed: vec!["FACTORY".into(), "LIMITER".into()],
            found: "AGGREGATOR".into(),
            position: 8,
        }
    );
}

#[test]
fn unrestricted_node_slot_accepts_any_identifier() {
    let definition = warehouse_definition().with_symbol(
        "WRAP",
        SymbolDefinition::new("container").param(ParameterDefinition::node("inner")),
    );
    let grammar = Grammar::new(definition).unwrap();

    let nodes = parse_with_grammar("(WRAP x)", &grammar).unwrap();
    assert_eq!(nodes[0].args()[0].symbol(), Some("x"));
    assert!(parse_with_grammar("(WRAP (AGGREGATOR))", &grammar).is_ok());
    assert!(matches!(
        parse_with_grammar("(WRAP 'x')", &grammar).unwrap_err(),
        DslError::ExpectedNode { position: 6, .. }
    ));
}

#[test]
fn argument_errors_point_at_the_argument() {
    let grammar = warehouse_grammar();

    let source = "(FACTORY 'fact_sales' f)";
    let err = parse_with_grammar(source, &grammar).unwrap_err();
    assert!(matches!(err, DslError::ExpectedIdentifier { position: 9, .. }));

    let diag = Diagnostic::from_error(&err, source);
    assert_eq!(diag.span.map(|s| s.start_col), Some(10));
}

#[test]
fn programmatic_grammar_matches_yaml() {
    let built = GrammarDefinition::new("warehouse")
        .with_identifier_pattern("[a-z_][a-z0-9_.]*")
        .with_symbol(
            "FACTORY",
            SymbolDefinition::new("source")
                .param(ParameterDefinition::identifier("table"))
                .param(ParameterDefinition::identifier("alias")),
        );
    let built = Grammar::new(built).unwrap();
    let loaded = warehouse_grammar();

    let source = "(FACTORY fact_sales f)";
    assert_eq!(
        parse_with_grammar(source, &built).unwrap(),
        parse_with_grammar(source, &loaded).unwrap()
    );
    assert_eq!(
        built.symbol("FACTORY"),
        loaded.symbol("FACTORY"),
    );
}

#[test]
fn grammar_deserializes_from_json() {
    let json = r#"{
        "dsl": { "name": "tiny" },
        "symbols": {
            "PING": { "kind": "command", "parameters": [
                { "name": "host", "type": "identifier" },
                { "name": "count", "type": "literal(number)", "cardinality": "optional" }
            ]}
        },
        "constraints": [ { "kind": "mustHaveRoot", "value": "PING" } ]
    }"#;
    let grammar: Grammar = serde_json::from_str(json).unwrap();
    assert_eq!(grammar.required_root(), Some("PING"));

    let nodes = parse_with_grammar("(PING localhost 3)", &grammar).unwrap();
    assert_eq!(nodes[0].args()[1], Node::number("3"));
}

#[test]
fn reserved_symbols_cannot_be_defined() {
    let definition = warehouse_definition().with_symbol("SELECT", SymbolDefinition::new("clause"));
    let err = Grammar::new(definition).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Grammar);
    assert!(err.to_string().contains("'SELECT' is reserved"));
}

#[test]
fn summary_counts_parameters() {
    let summary = warehouse_grammar().summary();
    assert_eq!(summary.name, "warehouse");
    assert_eq!(summary.symbol_count, 5);
    assert_eq!(summary.parameter_count, 7);
    assert_eq!(summary.required_count, 3);
    assert_eq!(summary.optional_count, 1);
    assert_eq!(summary.repetition_count, 3);
    assert_eq!(summary.required_root, None);
}

#[test]
fn depth_limit_applies_under_grammar() {
    let grammar = warehouse_grammar();
    let tokens = dsl_sexpr::tokenize("(NESTED (FACTORY t a))").unwrap();

    let err = Parser::new(tokens)
        .with_grammar(&grammar)
        .with_config(ParserConfig::new(1))
        .parse()
        .unwrap_err();
    assert!(matches!(err, DslError::MaxDepthExceeded { max_depth: 1, position: 8 }));
}

#[test]
fn shared_grammar_across_threads() {
    init_tracing();
    let grammar = Arc::new(warehouse_grammar());

    std::thread::scope(|scope| {
        for i in 0..8 {
            let grammar = Arc::clone(&grammar);
            scope.spawn(move || {
                let source = format!("(AGGREGATOR c{} d{})", i, i);
                let nodes = parse_with_grammar(source.as_str(), &grammar).unwrap();
                assert_eq!(nodes[0].args().len(), 2);
                assert!(parse_with_grammar("(FACTORY t)", &grammar).is_err());
            });
        }
    });
}
