use axum::http::Method;
use regex::Regex;
use std::sync::Arc;

use crate::middleware::Guard;
use crate::routing::RouterError;

/// One registered (method, pattern) -> action mapping with its resolved guard
/// chain. Immutable once registered; patterns are compiled here, never on the
/// request path.
pub struct Route<A> {
    pub method: Method,
    pub pattern: String,
    pub(crate) regex: Regex,
    /// Placeholder names in declaration order; actions receive the captured
    /// values positionally in this order.
    pub(crate) param_names: Vec<String>,
    pub(crate) action: A,
    pub(crate) guards: Vec<Arc<dyn Guard>>,
}

impl<A> Route<A> {
    pub(crate) fn new(
        method: Method,
        pattern: &str,
        action: A,
        guards: Vec<Arc<dyn Guard>>,
    ) -> Result<Self, RouterError> {
        let (regex, param_names) = compile_pattern(pattern)?;
        Ok(Self {
            method,
            pattern: pattern.to_string(),
            regex,
            param_names,
            action,
            guards,
        })
    }
}

/// Compile a `/segment/{name}` pattern into an anchored regex. Literal
/// segments are escaped so no regex metacharacters are user-exposed; each
/// `{name}` becomes a named capture matching any run of non-separator
/// characters. Trailing slashes are significant: `/products` and `/products/`
/// compile to different regexes.
pub(crate) fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), RouterError> {
    if !pattern.starts_with('/') {
        return Err(RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must start with '/'".to_string(),
        });
    }

    let mut source = String::from("^");
    let mut names: Vec<String> = Vec::new();

    for segment in pattern[1..].split('/') {
        source.push('/');
        if let Some(name) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            if !is_valid_param_name(name) {
                return Err(RouterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("invalid placeholder name '{}'", name),
                });
            }
            if names.iter().any(|n| n == name) {
                return Err(RouterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("duplicate placeholder name '{}'", name),
                });
            }
            source.push_str(&format!("(?P<{}>[^/]+)", name));
            names.push(name.to_string());
        } else {
            source.push_str(&regex::escape(segment));
        }
    }
    source.push('$');

    Ok((Regex::new(&source)?, names))
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_literal_pattern() {
        let (regex, names) = compile_pattern("/products").unwrap();
        assert!(names.is_empty());
        assert!(regex.is_match("/products"));
        assert!(!regex.is_match("/products/"));
        assert!(!regex.is_match("/products/1"));
    }

    #[test]
    fn compiles_placeholder_pattern() {
        let (regex, names) = compile_pattern("/product/{id}").unwrap();
        assert_eq!(names, vec!["id"]);
        let captures = regex.captures("/product/42").unwrap();
        assert_eq!(&captures["id"], "42");
        assert!(!regex.is_match("/product/42/edit"));
    }

    #[test]
    fn multiple_placeholders_capture_in_order() {
        let (regex, names) = compile_pattern("/admin/products/{id}/{action}").unwrap();
        assert_eq!(names, vec!["id", "action"]);
        let captures = regex.captures("/admin/products/7/edit").unwrap();
        assert_eq!(&captures["id"], "7");
        assert_eq!(&captures["action"], "edit");
    }

    #[test]
    fn escapes_regex_metacharacters_in_literals() {
        let (regex, _) = compile_pattern("/a.b").unwrap();
        assert!(regex.is_match("/a.b"));
        assert!(!regex.is_match("/aXb"));
    }

    #[test]
    fn trailing_slash_is_significant() {
        let (with_slash, _) = compile_pattern("/products/").unwrap();
        assert!(with_slash.is_match("/products/"));
        assert!(!with_slash.is_match("/products"));
    }

    #[test]
    fn root_pattern_matches_only_root() {
        let (regex, _) = compile_pattern("/").unwrap();
        assert!(regex.is_match("/"));
        assert!(!regex.is_match("/x"));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(compile_pattern("products").is_err());
        assert!(compile_pattern("/p/{1bad}").is_err());
        assert!(compile_pattern("/p/{id}/{id}").is_err());
        assert!(compile_pattern("/p/{}").is_err());
    }
}
