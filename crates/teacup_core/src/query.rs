//! Search string parsing.
//!
//! A raw query such as `hello world since:2020-01-01 by:alice` is split on
//! whitespace. Tokens starting with one of the recognised `key:` prefixes
//! become operators; everything else is a free-text term matched against the
//! article body.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Since,
    Until,
    By,
    Title,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Since, Operator::Until, Operator::By, Operator::Title];

    pub fn key(self) -> &'static str {
        match self {
            Operator::Since => "since",
            Operator::Until => "until",
            Operator::By => "by",
            Operator::Title => "title",
        }
    }

    /// Value carried by `token` if it is `key:value` for this operator.
    fn value_of(self, token: &str) -> Option<&str> {
        token.strip_prefix(self.key())?.strip_prefix(':')
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Never empty; holds a single `""` when the query had no free text.
    pub search_terms: Vec<String>,
    pub operators: BTreeMap<Operator, String>,
}

impl ParsedQuery {
    pub fn get(&self, operator: Operator) -> Option<&str> {
        self.operators.get(&operator).map(String::as_str)
    }

    /// True when the query carries no free text and no operators.
    pub fn is_blank(&self) -> bool {
        self.operators.is_empty() && self.search_terms.iter().all(|t| t.is_empty())
    }
}

impl Default for ParsedQuery {
    fn default() -> Self {
        Self {
            search_terms: vec![String::new()],
            operators: BTreeMap::new(),
        }
    }
}

impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.search_terms.iter().filter(|t| !t.is_empty()).cloned();
        let operators = self.operators.iter().map(|(op, value)| format!("{}:{}", op, value));
        let parts: Vec<String> = terms.chain(operators).collect();
        f.write_str(&parts.join(" "))
    }
}

/// Split a raw search string into free-text terms and operators.
///
/// Any input is accepted. Operator values are kept verbatim (everything after
/// the first colon) and are not validated; a repeated operator keeps its last
/// value.
pub fn parse(raw: &str) -> ParsedQuery {
    let mut search_terms = Vec::new();
    let mut operators = BTreeMap::new();

    for token in raw.split_whitespace() {
        let matched = Operator::ALL
            .iter()
            .find_map(|op| op.value_of(token).map(|value| (*op, value)));

        match matched {
            Some((op, value)) => {
                operators.insert(op, value.to_string());
            }
            None => search_terms.push(token.to_string()),
        }
    }

    if search_terms.is_empty() {
        search_terms.push(String::new());
    }

    ParsedQuery { search_terms, operators }
}
