//! Path template compilation.
//!
//! Turns a normalized path template into a compiled matcher (a regular
//! expression) plus an ordered list of capture keys. Segment syntax:
//!
//! - `:name` — required dynamic segment
//! - `:name?` — optional dynamic segment
//! - `*` / `*name` — wildcard, captures the rest of the path
//! - anything else — static text
//!
//! The same segment walk also powers [`fill_params`], the inverse
//! operation used for named-route navigation, redirects and aliases.

use std::collections::HashMap;
use std::collections::HashSet;

use regex::Regex;

use crate::error::RouterError;

/// Param name used for captures that carry no declared name (a bare `*`).
pub const PATH_MATCH: &str = "pathMatch";

/// One capture slot of a compiled pattern, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    /// Declared segment name; `None` for a bare wildcard.
    pub name: Option<String>,
    /// Whether the segment may be absent from a matching path.
    pub optional: bool,
}

/// Per-record compilation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    /// Case-sensitive matching. Defaults to insensitive.
    pub sensitive: bool,
    /// Require an exact trailing-slash match. Defaults to lenient.
    pub strict: bool,
}

/// A compiled path template: matcher plus ordered capture keys.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    regex: Regex,
    keys: Vec<PatternKey>,
    source: String,
}

impl RoutePattern {
    /// Compiles a normalized path template.
    ///
    /// Duplicate segment names within one template are a non-fatal
    /// diagnostic; the pattern still compiles and the captures zip with
    /// the keys positionally.
    ///
    /// # Examples
    ///
    /// ```
    /// use waymark::pattern::{PatternOptions, RoutePattern};
    ///
    /// let pattern = RoutePattern::compile("/user/:id", PatternOptions::default());
    /// let captures = pattern.captures("/user/42").unwrap();
    /// assert_eq!(captures, vec![Some("42".to_string())]);
    /// assert_eq!(pattern.keys()[0].name.as_deref(), Some("id"));
    /// ```
    pub fn compile(path: &str, options: PatternOptions) -> Self {
        let mut source = String::new();
        let mut keys: Vec<PatternKey> = Vec::new();

        if !options.sensitive {
            source.push_str("(?i)");
        }
        source.push('^');

        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            // Root template: matches "" and "/".
            source.push_str("/?$");
        } else {
            for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
                match segment.chars().next() {
                    Some('*') => {
                        let name = &segment[1..];
                        keys.push(PatternKey {
                            name: (!name.is_empty()).then(|| name.to_string()),
                            optional: false,
                        });
                        source.push_str("/?(.*?)");
                    }
                    Some(':') if segment.ends_with('?') => {
                        let name = &segment[1..segment.len() - 1];
                        keys.push(PatternKey {
                            name: Some(name.to_string()),
                            optional: true,
                        });
                        source.push_str("(?:/([^/]+))?");
                    }
                    Some(':') => {
                        let name = &segment[1..];
                        keys.push(PatternKey {
                            name: Some(name.to_string()),
                            optional: false,
                        });
                        source.push_str("/([^/]+)");
                    }
                    _ => {
                        source.push('/');
                        source.push_str(&regex::escape(segment));
                    }
                }
            }
            if options.strict {
                source.push('$');
            } else {
                source.push_str("/?$");
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for key in keys.iter().filter_map(|k| k.name.as_deref()) {
            if !seen.insert(key) {
                tracing::warn!(template = path, param = key, "duplicate param key in path template");
            }
        }

        // The source is built from escaped fragments and fixed grammar, so
        // compilation cannot fail for any template input.
        let regex = Regex::new(&source).unwrap_or_else(|_| Regex::new("^$").unwrap());

        Self {
            regex,
            keys,
            source: path.to_string(),
        }
    }

    /// Tests a concrete path and extracts raw capture values.
    ///
    /// Returns one entry per key, in template order; an unmatched optional
    /// segment yields `None`. Values are raw (not percent-decoded).
    pub fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(path)?;
        Some(
            (1..=self.keys.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// The ordered capture keys declared by the template.
    pub fn keys(&self) -> &[PatternKey] {
        &self.keys
    }

    /// Names of the non-optional keys, used for param inheritance.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|k| !k.optional)
            .filter_map(|k| k.name.as_deref())
    }

    /// The template this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Fills a path template with concrete param values.
///
/// The inverse of matching: `:name` and `*name` slots are substituted from
/// `params` (a bare `*` reads the reserved `pathMatch` param), optional
/// segments without a value are dropped, static segments pass through.
/// A missing required param is a deterministic error; the caller decides
/// how to degrade.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use waymark::pattern::fill_params;
///
/// let mut params = HashMap::new();
/// params.insert("id".to_string(), "42".to_string());
/// assert_eq!(fill_params("/user/:id", &params).unwrap(), "/user/42");
/// assert!(fill_params("/user/:id", &HashMap::new()).is_err());
/// ```
pub fn fill_params(
    template: &str,
    params: &HashMap<String, String>,
) -> Result<String, RouterError> {
    let trimmed = template.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let mut parts: Vec<String> = Vec::new();
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        match segment.chars().next() {
            Some('*') => {
                let name = if segment.len() > 1 { &segment[1..] } else { PATH_MATCH };
                let value = params.get(name).ok_or_else(|| RouterError::MissingParam {
                    name: name.to_string(),
                    template: template.to_string(),
                })?;
                parts.push(value.clone());
            }
            Some(':') if segment.ends_with('?') => {
                let name = &segment[1..segment.len() - 1];
                if let Some(value) = params.get(name) {
                    parts.push(value.clone());
                }
            }
            Some(':') => {
                let name = &segment[1..];
                let value = params.get(name).ok_or_else(|| RouterError::MissingParam {
                    name: name.to_string(),
                    template: template.to_string(),
                })?;
                parts.push(value.clone());
            }
            _ => parts.push(segment.to_string()),
        }
    }

    if parts.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", parts.join("/")))
    }
}
