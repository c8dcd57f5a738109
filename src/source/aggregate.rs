//! Text-format aggregate values
//!
//! `option (google.api.http) = { post: "/v1/users" body: "*" };` in source,
//! and the same body as `aggregate_value` of an uninterpreted option.

use super::parser::{ProtoParser, Rule};
use super::SourceError;
use crate::model::RestBinding;
use pest::iterators::Pair;
use pest::Parser as _;

/// A value inside an aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateValue {
    /// String (unquoted), number or identifier
    Scalar(String),
    /// Nested `{ ... }` message
    Message(Vec<AggregateEntry>),
    /// `[ ... ]` list
    List(Vec<AggregateValue>),
}

impl AggregateValue {
    /// Scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AggregateValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// One `key: value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateEntry {
    /// Field name (or `[extension.name]`)
    pub key: String,
    /// Value
    pub value: AggregateValue,
}

/// Parse a bare aggregate body such as `get: "/v1/x" body: "*"`
pub fn parse_aggregate(text: &str) -> Result<Vec<AggregateEntry>, SourceError> {
    let root = ProtoParser::parse(Rule::aggregate_text, text)
        .map_err(|e| SourceError::Parse {
            path: "<aggregate>".to_string(),
            message: e.to_string(),
        })?
        .next()
        .ok_or_else(|| SourceError::Parse {
            path: "<aggregate>".to_string(),
            message: "empty aggregate".to_string(),
        })?;

    Ok(root
        .into_inner()
        .filter(|p| p.as_rule() == Rule::aggregate_entry)
        .map(entry)
        .collect())
}

/// Entries of an `aggregate` pair
pub(crate) fn entries(aggregate: Pair<Rule>) -> Vec<AggregateEntry> {
    aggregate
        .into_inner()
        .filter(|p| p.as_rule() == Rule::aggregate_entry)
        .map(entry)
        .collect()
}

fn entry(pair: Pair<Rule>) -> AggregateEntry {
    let mut key = String::new();
    let mut value = AggregateValue::Scalar(String::new());
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::agg_key => key = inner.as_str().to_string(),
            Rule::agg_value => value = self::value(inner),
            _ => {}
        }
    }
    AggregateEntry { key, value }
}

/// Convert an `agg_value` or `constant` pair
pub(crate) fn value(pair: Pair<Rule>) -> AggregateValue {
    let Some(inner) = pair.into_inner().next() else {
        return AggregateValue::Scalar(String::new());
    };
    match inner.as_rule() {
        Rule::aggregate => AggregateValue::Message(entries(inner)),
        Rule::list_lit => AggregateValue::List(inner.into_inner().map(value).collect()),
        Rule::strings => AggregateValue::Scalar(
            inner
                .into_inner()
                .map(|literal| unquote(literal.as_str()))
                .collect(),
        ),
        _ => AggregateValue::Scalar(inner.as_str().to_string()),
    }
}

/// Strip the quotes of a string literal and resolve simple escapes
fn unquote(literal: &str) -> String {
    let body = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Build a REST binding from the entries of a `google.api.http` aggregate
pub fn rest_binding_from_aggregate(entries: &[AggregateEntry]) -> Option<RestBinding> {
    let lookup = |entries: &[AggregateEntry], key: &str| -> Option<String> {
        entries
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.as_str())
            .map(str::to_string)
    };

    let custom = entries
        .iter()
        .find(|e| e.key == "custom")
        .and_then(|e| match &e.value {
            AggregateValue::Message(inner) => Some((lookup(inner, "kind")?, lookup(inner, "path")?)),
            _ => None,
        });

    RestBinding::from_entries(
        entries
            .iter()
            .filter_map(|e| e.value.as_str().map(|v| (e.key.as_str(), v))),
        custom,
    )
}
