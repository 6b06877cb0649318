//! Boolean conditions over field paths.
//!
//! ```text
//! preprocessing.normalization_type == 'zscore' and analysis_method.supervised_learning
//! not (reference.year == 2016 or reference.year == 2017)
//! ```
//!
//! A bare path holds when any of its leaves is truthy (a non-empty string,
//! `true`, a non-zero number). `path == lit` holds when any leaf equals the
//! literal and `path != lit` when none does. `not` binds tighter than `and`,
//! which binds tighter than `or`. A leading `paper.` on a path is ignored.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::field::Scalar;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r#"^\s*(?:(?P<op>==|!=|\(|\))|'(?P<single>[^']*)'|"(?P<double>[^"]*)"|(?P<num>-?\d+(?:\.\d+)?)|(?P<word>[A-Za-z_][A-Za-z0-9_.]*))"#
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Eq,
    Ne,
    And,
    Or,
    Not,
    Literal(Scalar),
    Path(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Truthy(String),
    Equals(String, Scalar),
    NotEquals(String, Scalar),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn parse(input: &str) -> Result<Condition> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            len: input.len(),
        };
        let condition = parser.or()?;
        if let Some((offset, token)) = parser.tokens.get(parser.pos) {
            return Err(invalid(*offset, format!("unexpected {:?}", token)));
        }
        Ok(condition)
    }

    /// Evaluates the condition on `doc`. `and` and `or` short-circuit, so a
    /// path in an unevaluated branch is never resolved.
    pub fn matches(&self, doc: &Document) -> Result<bool> {
        match self {
            Condition::Truthy(path) => any_leaf(doc, path, truthy),
            Condition::Equals(path, literal) => any_leaf(doc, path, |leaf| same(leaf, literal)),
            Condition::NotEquals(path, literal) => {
                Ok(!any_leaf(doc, path, |leaf| same(leaf, literal))?)
            }
            Condition::Not(inner) => Ok(!inner.matches(doc)?),
            Condition::And(lhs, rhs) => Ok(lhs.matches(doc)? && rhs.matches(doc)?),
            Condition::Or(lhs, rhs) => Ok(lhs.matches(doc)? || rhs.matches(doc)?),
        }
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Condition::parse(s)
    }
}

fn any_leaf(doc: &Document, path: &str, mut pred: impl FnMut(&Scalar) -> bool) -> Result<bool> {
    for leaf in doc.resolve(path) {
        if pred(&leaf?) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn truthy(leaf: &Scalar) -> bool {
    match leaf {
        Scalar::Str(s) => !s.is_empty(),
        Scalar::Bool(b) => *b,
        Scalar::Int(i) => *i != 0,
        Scalar::Float(x) => *x != 0.0,
    }
}

// Integers and floats compare by numeric value.
fn same(leaf: &Scalar, literal: &Scalar) -> bool {
    match (leaf, literal) {
        (Scalar::Int(i), Scalar::Float(x)) | (Scalar::Float(x), Scalar::Int(i)) => *i as f64 == *x,
        _ => leaf == literal,
    }
}

fn invalid(offset: usize, reason: impl Into<String>) -> Error {
    Error::InvalidFilter {
        offset,
        reason: reason.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while !input[pos..].trim().is_empty() {
        let rest = &input[pos..];
        let start = pos + rest.len() - rest.trim_start().len();
        let caps = TOKEN_RE
            .captures(rest)
            .ok_or_else(|| invalid(start, "unrecognized input"))?;
        let whole = caps.get(0).map_or(0, |m| m.end());
        let token = if let Some(op) = caps.name("op") {
            match op.as_str() {
                "==" => Token::Eq,
                "!=" => Token::Ne,
                "(" => Token::Open,
                _ => Token::Close,
            }
        } else if let Some(s) = caps.name("single").or_else(|| caps.name("double")) {
            Token::Literal(Scalar::Str(s.as_str().to_string()))
        } else if let Some(num) = caps.name("num") {
            let text = num.as_str();
            match text.parse::<i64>() {
                Ok(i) => Token::Literal(Scalar::Int(i)),
                Err(_) => Token::Literal(Scalar::Float(
                    text.parse().map_err(|_| invalid(start, format!("bad number {}", text)))?,
                )),
            }
        } else {
            match caps.name("word").map_or("", |w| w.as_str()) {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "true" | "True" => Token::Literal(Scalar::Bool(true)),
                "false" | "False" => Token::Literal(Scalar::Bool(false)),
                word => Token::Path(word.strip_prefix("paper.").unwrap_or(word).to_string()),
            }
        };
        tokens.push((start, token));
        pos += whole;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |(o, _)| *o)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Result<Condition> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            lhs = Condition::Or(Box::new(lhs), Box::new(self.and()?));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Condition> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            lhs = Condition::And(Box::new(lhs), Box::new(self.unary()?));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Condition> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Condition::Not(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Condition> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Open) => {
                let inner = self.or()?;
                let offset = self.offset();
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(invalid(offset, "expected ')'")),
                }
            }
            Some(Token::Path(path)) => match self.peek() {
                Some(Token::Eq) | Some(Token::Ne) => {
                    let negate = self.next() == Some(Token::Ne);
                    let literal = self.literal()?;
                    Ok(if negate {
                        Condition::NotEquals(path, literal)
                    } else {
                        Condition::Equals(path, literal)
                    })
                }
                _ => Ok(Condition::Truthy(path)),
            },
            Some(token) => Err(invalid(offset, format!("expected a field path, found {:?}", token))),
            None => Err(invalid(offset, "unexpected end of condition")),
        }
    }

    fn literal(&mut self) -> Result<Scalar> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Literal(value)) => Ok(value),
            _ => Err(invalid(offset, "expected a literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKey;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    fn path(p: &str) -> Box<Condition> {
        Box::new(Condition::Truthy(p.to_string()))
    }

    fn paper() -> Document {
        Document::from_value(
            DocumentKey::new("2016", "p.json"),
            "p.json",
            json!({
                "version": "2.0",
                "reference": {"title": "T", "year": 2016, "authors": [{"author": "Ada"}, {"author": "Bo"}]},
                "preprocessing": {"normalization_type": "zscore"},
                "analysis_method": {"supervised_learning": true, "unsupervised_learning": false}
            }),
            SchemaRegistry::global(),
        )
        .unwrap()
    }

    fn holds(condition: &str) -> bool {
        Condition::parse(condition).unwrap().matches(&paper()).unwrap()
    }

    #[test]
    fn precedence_is_not_and_or() {
        assert_eq!(
            Condition::parse("a or not b and c").unwrap(),
            Condition::Or(path("a"), Box::new(Condition::And(Box::new(Condition::Not(path("b"))), path("c"))))
        );
        assert_eq!(
            Condition::parse("(a or b) and c").unwrap(),
            Condition::And(Box::new(Condition::Or(path("a"), path("b"))), path("c"))
        );
    }

    #[test]
    fn literals_and_prefix() {
        assert_eq!(
            Condition::parse("paper.reference.year == 2016").unwrap(),
            Condition::Equals("reference.year".to_string(), Scalar::Int(2016))
        );
        assert_eq!(
            Condition::parse(r#"x != "a b""#).unwrap(),
            Condition::NotEquals("x".to_string(), Scalar::from("a b"))
        );
        assert_eq!(
            Condition::parse("x == 0.5").unwrap(),
            Condition::Equals("x".to_string(), Scalar::Float(0.5))
        );
        assert_eq!(
            Condition::parse("x == True").unwrap(),
            Condition::Equals("x".to_string(), Scalar::Bool(true))
        );
    }

    #[test]
    fn malformed_conditions_report_offsets() {
        for (input, at) in [("a and", 5), ("(a or b", 7), ("a == b", 5), ("a b", 2), ("a ~ b", 2), ("== 1", 0)] {
            match Condition::parse(input).unwrap_err() {
                Error::InvalidFilter { offset, .. } => assert_eq!(offset, at, "{}", input),
                other => panic!("unexpected error for {}: {}", input, other),
            }
        }
    }

    #[test]
    fn evaluates_against_documents() {
        assert!(holds("preprocessing.normalization_type == 'zscore' and analysis_method.supervised_learning"));
        assert!(!holds("analysis_method.unsupervised_learning"));
        assert!(holds("not analysis_method.unsupervised_learning"));
        assert!(holds("reference.authors.author == 'Bo'"));
        assert!(!holds("reference.authors.author != 'Bo'"));
        assert!(holds("reference.year == 2016.0"));
        assert!(!holds("preprocessing.flows"));
        assert!(holds("reference.year == 1999 or (reference.title and not result.summary)"));
    }

    #[test]
    fn unknown_fields_fail_only_when_reached() {
        let doc = paper();
        let condition = Condition::parse("reference.year == 2016 or reference.pages").unwrap();
        assert!(condition.matches(&doc).unwrap());
        let condition = Condition::parse("reference.pages or reference.year == 2016").unwrap();
        assert!(matches!(condition.matches(&doc).unwrap_err(), Error::UnknownField { .. }));
    }
}
