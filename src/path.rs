//! Path utilities for resolution and normalization
//!
//! All functions are **pure**: given same input, always produce same output
//! with no side effects.

/// Resolves a relative path against a base path.
///
/// - An absolute path (leading `/`) wins outright.
/// - A query (`?`) or hash (`#`) fragment is appended to the base.
/// - Otherwise the relative segments are applied on top of the base,
///   honoring `.` and `..` steps. With `append` the base keeps its last
///   segment; without it the last segment is replaced.
///
/// # Examples
///
/// ```
/// use waymark::path::resolve_path;
///
/// assert_eq!(resolve_path("/aaa", "/bbb", false), "/aaa");
/// assert_eq!(resolve_path("?aaa", "/bbb", false), "/bbb?aaa");
/// assert_eq!(resolve_path("aaa", "/bbb", true), "/bbb/aaa");
/// assert_eq!(resolve_path("aaa", "/bbb", false), "/aaa");
/// assert_eq!(resolve_path("../ccc", "/aaa/bbb", true), "/aaa/ccc");
/// ```
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?') | Some('#') => return format!("{}{}", base, relative),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();

    // Drop the trailing segment when not appending, or when the base ends
    // with a slash (last segment is empty).
    if !append || stack.last().is_some_and(|s| s.is_empty()) {
        stack.pop();
    }

    for segment in relative.trim_start_matches('/').split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            other => stack.push(other),
        }
    }

    // Ensure a leading slash.
    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }

    stack.join("/")
}

/// Splits a raw path into its path, query and hash components.
///
/// The query is returned without its leading `?`; the hash keeps its `#`.
///
/// # Examples
///
/// ```
/// use waymark::path::parse_path;
///
/// let (path, query, hash) = parse_path("/tool/?a=1#/map");
/// assert_eq!(path, "/tool/");
/// assert_eq!(query, "a=1");
/// assert_eq!(hash, "#/map");
/// ```
pub fn parse_path(path: &str) -> (String, String, String) {
    let mut path = path;
    let mut hash = "";
    let mut query = "";

    if let Some(idx) = path.find('#') {
        hash = &path[idx..];
        path = &path[..idx];
    }

    if let Some(idx) = path.find('?') {
        query = &path[idx + 1..];
        path = &path[..idx];
    }

    (path.to_string(), query.to_string(), hash.to_string())
}

/// Collapses doubled separators to a single one.
///
/// # Examples
///
/// ```
/// use waymark::path::clean_path;
///
/// assert_eq!(clean_path("/users//42"), "/users/42");
/// ```
pub fn clean_path(path: &str) -> String {
    path.replace("//", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(resolve_path("/x/y", "/a/b", false), "/x/y");
        assert_eq!(resolve_path("/x/y", "/a/b", true), "/x/y");
    }

    #[test]
    fn test_resolve_query_and_hash() {
        assert_eq!(resolve_path("?q=1", "/a/b", false), "/a/b?q=1");
        assert_eq!(resolve_path("#frag", "/a/b", false), "/a/b#frag");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_path("c", "/a/b", false), "/a/c");
        assert_eq!(resolve_path("c", "/a/b", true), "/a/b/c");
        assert_eq!(resolve_path("c", "/a/b/", false), "/a/b/c");
        assert_eq!(resolve_path("../c", "/a/b", true), "/a/c");
        assert_eq!(resolve_path("./c", "/a/b", true), "/a/b/c");
    }

    #[test]
    fn test_parse_path_plain() {
        let (path, query, hash) = parse_path("/users/42");
        assert_eq!(path, "/users/42");
        assert_eq!(query, "");
        assert_eq!(hash, "");
    }

    #[test]
    fn test_parse_path_query_only() {
        let (path, query, hash) = parse_path("/users?sort=asc&page=2");
        assert_eq!(path, "/users");
        assert_eq!(query, "sort=asc&page=2");
        assert_eq!(hash, "");
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/a//b"), "/a/b");
        assert_eq!(clean_path("/a/b"), "/a/b");
    }
}
