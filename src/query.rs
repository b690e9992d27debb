//! Query-string parsing and serialization.
//!
//! The codec is pluggable: [`crate::RouterOptions`] accepts custom
//! `parse_query`/`stringify_query` functions, and every full path the
//! crate produces is re-derivable through the configured pair. The default
//! codec lives here.
//!
//! Keys are stored in a `BTreeMap` so serialization is deterministic
//! regardless of insertion order.

use std::collections::BTreeMap;

/// A single query value.
///
/// Mirrors the three shapes an addressable location can carry: a bare key
/// (`?flag`), a key with a value (`?page=2`) and a repeated key
/// (`?tag=a&tag=b`, where individual repetitions may themselves be bare).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Key present without a value: `?flag`
    Null,
    /// Key with a single value: `?page=2`
    Text(String),
    /// Repeated key: `?tag=a&tag&tag=b` (a bare repetition is `None`)
    List(Vec<Option<String>>),
}

/// A parsed query string.
pub type Query = BTreeMap<String, QueryValue>;

/// Signature of a pluggable query parser.
pub type ParseQuery = fn(&str) -> Query;

/// Signature of a pluggable query serializer. Must emit a leading `?` for
/// a non-empty query and an empty string otherwise.
pub type StringifyQuery = fn(&Query) -> String;

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(value) => value.into_owned(),
        // Malformed escape: keep the raw text.
        Err(_) => raw.to_string(),
    }
}

/// Parses a raw query string into a [`Query`] map.
///
/// Accepts an optional leading `?`, `#` or `&`. Repeated keys accumulate
/// into [`QueryValue::List`] in encounter order.
///
/// # Examples
///
/// ```
/// use waymark::query::{parse_query, QueryValue};
///
/// let query = parse_query("?page=2&flag&tag=a&tag=b");
/// assert_eq!(query.get("page"), Some(&QueryValue::Text("2".into())));
/// assert_eq!(query.get("flag"), Some(&QueryValue::Null));
/// assert_eq!(
///     query.get("tag"),
///     Some(&QueryValue::List(vec![Some("a".into()), Some("b".into())]))
/// );
/// ```
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    let raw = raw.trim_start_matches(['?', '#', '&']);
    if raw.is_empty() {
        return query;
    }

    for param in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match param.split_once('=') {
            Some((key, value)) => (decode(key), Some(decode(value))),
            None => (decode(param), None),
        };

        match query.entry(key) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(match value {
                    Some(text) => QueryValue::Text(text),
                    None => QueryValue::Null,
                });
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let mut list = match std::mem::replace(existing, QueryValue::Null) {
                    QueryValue::List(list) => list,
                    QueryValue::Text(text) => vec![Some(text)],
                    QueryValue::Null => vec![None],
                };
                list.push(value);
                *existing = QueryValue::List(list);
            }
        }
    }

    query
}

/// Serializes a [`Query`] back into a string, with a leading `?` when the
/// query is non-empty.
///
/// Deterministic: keys are emitted in `BTreeMap` order, so a round trip
/// through [`parse_query`] reproduces the same string.
///
/// # Examples
///
/// ```
/// use waymark::query::{parse_query, stringify_query};
///
/// let query = parse_query("b=2&a=1");
/// assert_eq!(stringify_query(&query), "?a=1&b=2");
/// assert_eq!(stringify_query(&parse_query("")), "");
/// ```
pub fn stringify_query(query: &Query) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (key, value) in query {
        let key = urlencoding::encode(key).into_owned();
        match value {
            QueryValue::Null => parts.push(key),
            QueryValue::Text(text) => {
                parts.push(format!("{}={}", key, urlencoding::encode(text)))
            }
            QueryValue::List(list) => {
                for item in list {
                    match item {
                        Some(text) => {
                            parts.push(format!("{}={}", key, urlencoding::encode(text)))
                        }
                        None => parts.push(key.clone()),
                    }
                }
            }
        }
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Parses `search` with the supplied parser and overlays `extra` on top
/// (extra entries win over parsed ones).
pub fn resolve_query(search: &str, extra: Option<&Query>, parse: ParseQuery) -> Query {
    let mut query = parse(search);
    if let Some(extra) = extra {
        for (key, value) in extra {
            query.insert(key.clone(), value.clone());
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("?").is_empty());
    }

    #[test]
    fn test_parse_decodes() {
        let query = parse_query("name=caf%C3%A9");
        assert_eq!(query.get("name"), Some(&QueryValue::Text("café".into())));
    }

    #[test]
    fn test_parse_malformed_escape_kept_raw() {
        let query = parse_query("v=%zz");
        assert_eq!(query.get("v"), Some(&QueryValue::Text("%zz".into())));
    }

    #[test]
    fn test_round_trip() {
        let original = parse_query("a=1&b&c=x&c=y");
        let reparsed = parse_query(&stringify_query(&original));
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_resolve_query_extra_wins() {
        let mut extra = Query::new();
        extra.insert("page".into(), QueryValue::Text("9".into()));
        let query = resolve_query("page=1&sort=asc", Some(&extra), parse_query);
        assert_eq!(query.get("page"), Some(&QueryValue::Text("9".into())));
        assert_eq!(query.get("sort"), Some(&QueryValue::Text("asc".into())));
    }
}
