//! Criteria expressions over named numeric fields.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or      := and (("or" | "||") and)*
//! and     := not (("and" | "&&") not)*
//! not     := ("not" | "!") not | compare
//! compare := sum (cmp_op sum)*          chained: a < b < c
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/" | "%") unary)*
//! unary   := "-" unary | atom
//! atom    := number | ident | "True" | "False" | "(" or ")"
//! ```
//!
//! Booleans evaluate to 1.0 / 0.0; any non-zero value is truthy.

use std::collections::HashMap;

use crate::rules::RuleError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Num(f64),
    Field(String),
    Neg(Box<Node>),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Arith(ArithOp, Box<Node>, Box<Node>),
    Compare(Box<Node>, Vec<(CmpOp, Node)>),
}

/// A compiled criteria expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    root: Node,
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, RuleError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            source,
        };
        let root = parser.or_expr()?;
        if let Some(tok) = parser.peek() {
            return Err(RuleError::Parse {
                expr: source.to_string(),
                message: format!("unexpected trailing token {:?}", tok),
            });
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, record: &HashMap<String, f64>) -> Result<f64, RuleError> {
        eval(&self.root, record)
    }

    pub fn is_true(&self, record: &HashMap<String, f64>) -> Result<bool, RuleError> {
        Ok(self.eval(record)? != 0.0)
    }

    /// Field names referenced by the expression.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_fields(&self.root, &mut out);
        out.sort();
        out.dedup();
        out
    }
}

fn collect_fields(node: &Node, out: &mut Vec<String>) {
    match node {
        Node::Num(_) => {}
        Node::Field(name) => out.push(name.clone()),
        Node::Neg(n) | Node::Not(n) => collect_fields(n, out),
        Node::And(a, b) | Node::Or(a, b) | Node::Arith(_, a, b) => {
            collect_fields(a, out);
            collect_fields(b, out);
        }
        Node::Compare(first, rest) => {
            collect_fields(first, out);
            for (_, n) in rest {
                collect_fields(n, out);
            }
        }
    }
}

const TWO_CHAR_OPS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];
const ONE_CHAR_OPS: [&str; 8] = ["<", ">", "+", "-", "*", "/", "%", "!"];

fn tokenize(src: &str) -> Result<Vec<Token>, RuleError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| RuleError::Lex {
                expr: src.to_string(),
                message: format!("invalid number '{}'", text),
            })?;
            tokens.push(Token::Num(value));
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if let Some(op) = TWO_CHAR_OPS.iter().find(|op| **op == pair) {
                tokens.push(Token::Op(op));
                i += 2;
                continue;
            }
        }
        let single = c.to_string();
        if let Some(op) = ONE_CHAR_OPS.iter().find(|op| **op == single) {
            tokens.push(Token::Op(op));
            i += 1;
            continue;
        }
        return Err(RuleError::Lex {
            expr: src.to_string(),
            message: format!("unexpected character '{}' at {}", c, i),
        });
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn error(&self, message: impl Into<String>) -> RuleError {
        RuleError::Parse {
            expr: self.source.to_string(),
            message: message.into(),
        }
    }

    fn eat_op(&mut self, ops: &[&str]) -> Option<&'static str> {
        if let Some(Token::Op(op)) = self.peek() {
            if ops.contains(op) {
                let op = *op;
                self.pos += 1;
                return Some(op);
            }
        }
        None
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if let Some(Token::Ident(id)) = self.peek() {
            if id == word {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn or_expr(&mut self) -> Result<Node, RuleError> {
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or") || self.eat_op(&["||"]).is_some() {
            let rhs = self.and_expr()?;
            lhs = Node::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Node, RuleError> {
        let mut lhs = self.not_expr()?;
        while self.eat_keyword("and") || self.eat_op(&["&&"]).is_some() {
            let rhs = self.not_expr()?;
            lhs = Node::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Node, RuleError> {
        if self.eat_keyword("not") || self.eat_op(&["!"]).is_some() {
            let inner = self.not_expr()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Node, RuleError> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        while let Some(op) = self.eat_op(&["==", "!=", "<=", ">=", "<", ">"]) {
            let cmp = match op {
                "==" => CmpOp::Eq,
                "!=" => CmpOp::Ne,
                "<=" => CmpOp::Le,
                ">=" => CmpOp::Ge,
                "<" => CmpOp::Lt,
                _ => CmpOp::Gt,
            };
            rest.push((cmp, self.sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Node::Compare(Box::new(first), rest))
        }
    }

    fn sum(&mut self) -> Result<Node, RuleError> {
        let mut lhs = self.product()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let rhs = self.product()?;
            let op = if op == "+" { ArithOp::Add } else { ArithOp::Sub };
            lhs = Node::Arith(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Node, RuleError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let rhs = self.unary()?;
            let op = match op {
                "*" => ArithOp::Mul,
                "/" => ArithOp::Div,
                _ => ArithOp::Rem,
            };
            lhs = Node::Arith(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, RuleError> {
        if self.eat_op(&["-"]).is_some() {
            let inner = self.unary()?;
            return Ok(Node::Neg(Box::new(inner)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Node, RuleError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Node::Num(v)),
            Some(Token::Ident(id)) => match id.as_str() {
                "True" | "true" => Ok(Node::Num(1.0)),
                "False" | "false" => Ok(Node::Num(0.0)),
                "and" | "or" | "not" => Err(self.error(format!("unexpected keyword '{}'", id))),
                _ => Ok(Node::Field(id)),
            },
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            Some(tok) => Err(self.error(format!("unexpected token {:?}", tok))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

fn truthy(v: f64) -> bool {
    v != 0.0
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Remainder taking the sign of the divisor, so `-99 % 2 == 1`.
fn floored_rem(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }
}

fn eval(node: &Node, record: &HashMap<String, f64>) -> Result<f64, RuleError> {
    Ok(match node {
        Node::Num(v) => *v,
        Node::Field(name) => *record
            .get(name)
            .ok_or_else(|| RuleError::UnknownField(name.clone()))?,
        Node::Neg(n) => -eval(n, record)?,
        Node::Not(n) => bool_value(!truthy(eval(n, record)?)),
        Node::And(a, b) => bool_value(truthy(eval(a, record)?) && truthy(eval(b, record)?)),
        Node::Or(a, b) => bool_value(truthy(eval(a, record)?) || truthy(eval(b, record)?)),
        Node::Arith(op, a, b) => {
            let (x, y) = (eval(a, record)?, eval(b, record)?);
            match op {
                ArithOp::Add => x + y,
                ArithOp::Sub => x - y,
                ArithOp::Mul => x * y,
                ArithOp::Div | ArithOp::Rem if y == 0.0 => {
                    return Err(RuleError::DivisionByZero);
                }
                ArithOp::Div => x / y,
                ArithOp::Rem => floored_rem(x, y),
            }
        }
        Node::Compare(first, rest) => {
            let mut lhs = eval(first, record)?;
            for (op, node) in rest {
                let rhs = eval(node, record)?;
                let ok = match op {
                    CmpOp::Eq => lhs == rhs,
                    CmpOp::Ne => lhs != rhs,
                    CmpOp::Lt => lhs < rhs,
                    CmpOp::Le => lhs <= rhs,
                    CmpOp::Gt => lhs > rhs,
                    CmpOp::Ge => lhs >= rhs,
                };
                if !ok {
                    return Ok(0.0);
                }
                lhs = rhs;
            }
            1.0
        }
    })
}
