use std::collections::HashMap;
use std::fs;

use kira_zonemap::rules::{Expr, NO_MATCH, RuleError, load_rules, parse_rules};
use tempfile::TempDir;

const RULES_YAML: &str = r#"
cancer_definition:
  csPCa:
    - criteria: "gg1 + gg2 >= 7"
      result: 1
    - criteria: "gg1 == 3 and ccl >= 6"
      result: 1
    - criteria: "True"
      result: 0
  any_cancer:
    - criteria: "gg1 > 0"
      result: 1
  flagged:
    - criteria: "gg1 >= 4"
      result: true
"#;

fn record(gg1: f64, gg2: f64, ccl: f64) -> HashMap<String, f64> {
    HashMap::from([
        ("gg1".to_string(), gg1),
        ("gg2".to_string(), gg2),
        ("ccl".to_string(), ccl),
    ])
}

#[test]
fn first_matching_rule_wins() {
    let book = parse_rules(RULES_YAML).unwrap();
    assert_eq!(book.len(), 3);
    let cs = book.require("csPCa").unwrap();
    assert_eq!(cs.len(), 3);

    assert_eq!(cs.evaluate(&record(4.0, 3.0, 2.0)).unwrap(), "1");
    assert_eq!(cs.evaluate(&record(3.0, 3.0, 8.0)).unwrap(), "1");
    assert_eq!(cs.evaluate(&record(3.0, 3.0, 2.0)).unwrap(), "0");
    assert!(cs.is_positive(&record(4.0, 4.0, 1.0)).unwrap());
    assert!(!cs.is_positive(&record(3.0, 3.0, 1.0)).unwrap());
}

#[test]
fn no_match_renders_sentinel() {
    let book = parse_rules(RULES_YAML).unwrap();
    let any = book.require("any_cancer").unwrap();
    assert_eq!(any.evaluate(&record(-99.0, -99.0, -99.0)).unwrap(), NO_MATCH);
    assert!(!any.is_positive(&record(-99.0, -99.0, -99.0)).unwrap());
}

#[test]
fn boolean_results_are_not_positive() {
    let book = parse_rules(RULES_YAML).unwrap();
    let flagged = book.require("flagged").unwrap();
    assert_eq!(flagged.evaluate(&record(5.0, 5.0, 5.0)).unwrap(), "True");
    assert!(!flagged.is_positive(&record(5.0, 5.0, 5.0)).unwrap());
}

#[test]
fn unknown_definition_is_an_error() {
    let book = parse_rules(RULES_YAML).unwrap();
    assert!(matches!(
        book.require("missing"),
        Err(RuleError::UnknownDefinition(name)) if name == "missing"
    ));
    assert_eq!(
        book.names().collect::<Vec<_>>(),
        vec!["any_cancer", "csPCa", "flagged"]
    );
}

#[test]
fn expression_operators() {
    let r = record(3.0, 4.0, 10.0);
    let eval = |src: &str| Expr::parse(src).unwrap().eval(&r).unwrap();
    assert_eq!(eval("gg1 + gg2 * 2"), 11.0);
    assert_eq!(eval("(gg1 + gg2) * 2"), 14.0);
    assert_eq!(eval("-gg1 + 1"), -2.0);
    assert_eq!(eval("ccl % 4"), 2.0);
    assert_eq!(eval("gg1 < gg2 < ccl"), 1.0);
    assert_eq!(eval("gg1 < gg2 > ccl"), 0.0);
    assert_eq!(eval("not gg1 == 3"), 0.0);
    assert_eq!(eval("gg1 == 3 && gg2 != 3"), 1.0);
    assert_eq!(eval("gg1 == 9 || ccl >= 10"), 1.0);
    assert_eq!(eval("!(gg1 >= 4) and true"), 1.0);
}

#[test]
fn remainder_follows_divisor_sign() {
    let r = record(-99.0, 7.0, 0.0);
    let eval = |src: &str| Expr::parse(src).unwrap().eval(&r).unwrap();
    assert_eq!(eval("gg1 % 2"), 1.0);
    assert_eq!(eval("gg1 % 2 == 1"), 1.0);
    assert_eq!(eval("gg2 % -3"), -2.0);
    assert_eq!(eval("-gg2 % 3"), 2.0);
    assert_eq!(eval("gg1 % 3"), 0.0);
}

#[test]
fn zero_divisor_is_an_error() {
    let r = record(4.0, 0.0, 6.0);
    for src in ["ccl / gg2 > 1", "gg1 % gg2 == 0", "ccl / (gg1 - 4)"] {
        let err = Expr::parse(src).unwrap().eval(&r).unwrap_err();
        assert!(matches!(err, RuleError::DivisionByZero), "{}", src);
    }
    assert_eq!(Expr::parse("ccl / 4").unwrap().eval(&r).unwrap(), 1.5);

    let book = parse_rules(
        "cancer_definition:\n  ratio:\n    - criteria: \"ccl / gg2 > 1\"\n      result: 1\n",
    )
    .unwrap();
    assert!(book.require("ratio").unwrap().evaluate(&r).is_err());
}

#[test]
fn expression_reports_fields() {
    let e = Expr::parse("gg1 >= 4 or (gg1 + gg2 >= 7 and ccl > 6)").unwrap();
    assert_eq!(e.fields(), vec!["ccl", "gg1", "gg2"]);
    assert_eq!(e.source(), "gg1 >= 4 or (gg1 + gg2 >= 7 and ccl > 6)");
}

#[test]
fn unknown_field_fails_evaluation() {
    let e = Expr::parse("psa > 10").unwrap();
    let err = e.eval(&record(1.0, 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, RuleError::UnknownField(name) if name == "psa"));
}

#[test]
fn malformed_expressions_are_rejected() {
    assert!(matches!(Expr::parse("gg1 >= "), Err(RuleError::Parse { .. })));
    assert!(matches!(Expr::parse("(gg1 > 1"), Err(RuleError::Parse { .. })));
    assert!(matches!(Expr::parse("gg1 $ 2"), Err(RuleError::Lex { .. })));
    assert!(Expr::parse("gg1 2").is_err());
}

#[test]
fn rule_file_with_bad_criteria_fails_to_load() {
    let yaml = r#"
cancer_definition:
  broken:
    - criteria: "gg1 >="
      result: 1
"#;
    let err = parse_rules(yaml).unwrap_err();
    assert!(format!("{:#}", err).contains("broken"));
}

#[test]
fn loads_rules_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rules.yml");
    fs::write(&path, RULES_YAML).unwrap();
    let book = load_rules(&path).unwrap();
    assert!(book.get("csPCa").is_some());
    assert!(load_rules(&tmp.path().join("none.yml")).is_err());
}
