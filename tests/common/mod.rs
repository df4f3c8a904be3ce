//! Shared helpers for integration tests

#![allow(dead_code)]

use dsl_sexpr::{Grammar, GrammarDefinition};

pub const WAREHOUSE_GRAMMAR: &str = r#"
formatVersion: "1.0"
dsl:
  name: warehouse
  description: Query plans over warehouse tables
  version: "0.1"
identifier:
  pattern: "[a-z_][a-z0-9_.]*"
literals:
  number: "-?\\d+(\\.\\d+)?"
reservedSymbols: [SELECT]
symbols:
  FACTORY:
    kind: source
    parameters:
      - { name: table, type: identifier }
      - { name: alias, type: identifier }
  AGGREGATOR:
    kind: clause
    parameters:
      - { name: columns, type: identifier, cardinality: zeroOrMore }
  SELECTOR:
    kind: clause
    parameters:
      - { name: columns, type: identifier, cardinality: oneOrMore }
  LIMITER:
    kind: clause
    parameters:
      - { name: count, type: "literal(number)" }
      - { name: label, type: "literal(string)", cardinality: optional }
  NESTED:
    kind: container
    parameters:
      - name: child
        type: node
        cardinality: zeroOrMore
        allowedSymbols: [FACTORY, LIMITER]
"#;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dsl_sexpr=debug")
        .with_test_writer()
        .try_init();
}

pub fn warehouse_definition() -> GrammarDefinition {
    serde_yaml::from_str(WAREHOUSE_GRAMMAR).expect("warehouse grammar parses")
}

pub fn warehouse_grammar() -> Grammar {
    Grammar::new(warehouse_definition()).expect("warehouse grammar compiles")
}
