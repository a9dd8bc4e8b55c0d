//! Cancer definitions as ordered, first-match criteria rules.

mod expr;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

pub use expr::Expr;

/// Rendered result when no rule matches.
pub const NO_MATCH: &str = "-99";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("cannot tokenize '{expr}': {message}")]
    Lex { expr: String, message: String },

    #[error("cannot parse '{expr}': {message}")]
    Parse { expr: String, message: String },

    #[error("unknown field '{0}' in criteria")]
    UnknownField(String),

    #[error("division by zero in criteria")]
    DivisionByZero,

    #[error("unknown cancer definition '{0}'")]
    UnknownDefinition(String),
}

#[derive(Debug, Deserialize)]
struct RawRule {
    criteria: String,
    result: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    cancer_definition: BTreeMap<String, Vec<RawRule>>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub criteria: Expr,
    pub result: String,
}

/// Ordered rules of one cancer definition.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Result of the first rule whose criteria hold, or [`NO_MATCH`].
    pub fn evaluate(&self, record: &HashMap<String, f64>) -> Result<&str, RuleError> {
        for rule in &self.rules {
            if rule.criteria.is_true(record)? {
                return Ok(&rule.result);
            }
        }
        Ok(NO_MATCH)
    }

    pub fn is_positive(&self, record: &HashMap<String, f64>) -> Result<bool, RuleError> {
        Ok(self.evaluate(record)? == "1")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    definitions: BTreeMap<String, RuleSet>,
}

impl RuleBook {
    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.definitions.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&RuleSet, RuleError> {
        self.get(name)
            .ok_or_else(|| RuleError::UnknownDefinition(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, rules: RuleSet) {
        self.definitions.insert(name.into(), rules);
    }
}

pub fn load_rules(path: &Path) -> Result<RuleBook> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    parse_rules(&content).with_context(|| format!("invalid rules file {}", path.display()))
}

pub fn parse_rules(content: &str) -> Result<RuleBook> {
    let raw: RawRuleFile = serde_yaml::from_str(content).context("rules YAML is malformed")?;
    let mut book = RuleBook::default();
    for (name, raw_rules) in raw.cancer_definition {
        let mut rules = Vec::with_capacity(raw_rules.len());
        for raw_rule in raw_rules {
            let criteria = Expr::parse(&raw_rule.criteria)
                .with_context(|| format!("cancer definition '{}'", name))?;
            rules.push(Rule {
                criteria,
                result: render_result(&raw_rule.result),
            });
        }
        book.insert(name, RuleSet::new(rules));
    }
    Ok(book)
}

fn render_result(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Null => NO_MATCH.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| NO_MATCH.to_string()),
    }
}
