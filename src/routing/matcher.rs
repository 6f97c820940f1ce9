//! Route matching
//!
//! Selects the best route for a request path from an application's route
//! table. Patterns only match when their segment count equals the request's;
//! among full matches the highest count of literal segments wins, and equal
//! scores keep the pattern registered last.

use crate::routing::pattern::RoutePattern;
use crate::routing::table::RouteTable;
use std::collections::HashMap;
use thiserror::Error;

/// A successful route match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Handler identifier of the winning pattern
    pub handler: String,
    /// Parameters bound from the pattern's variable segments
    pub params: HashMap<String, String>,
    /// Count of literal segments matched
    pub specificity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No pattern in the table matches the path. The caller decides the next
    /// step: path-based handler resolution, a not-found handler, or a 404.
    #[error("no route matches '{path}'")]
    NotFound { path: String },
}

/// Find the best-matching route for a request path
///
/// The path is normalized (leading/trailing slashes trimmed), the
/// application's base URI prefix is stripped, and the remainder is matched
/// segment-wise against every pattern in the table.
///
/// # Examples
/// ```
/// use polyhost::routing::{match_route, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.insert("blog", "/blog/$id[1,2,3]");
/// let matched = match_route(&table, "/blog/2", "/").unwrap();
/// assert_eq!(matched.handler, "blog");
/// assert_eq!(matched.params["id"], "2");
/// ```
pub fn match_route(
    table: &RouteTable,
    request_path: &str,
    base_uri: &str,
) -> Result<RouteMatch, RouteError> {
    let relative = strip_base_uri(request_path, base_uri);
    let request: Vec<&str> = split_segments(&relative);

    let mut best: Option<(usize, &str, &RoutePattern)> = None;
    for (handler, patterns) in table.entries() {
        for pattern in patterns {
            if let Some(specificity) = pattern.match_segments(&request) {
                // ">=" keeps the last pattern seen on equal scores
                if best.map_or(true, |(s, _, _)| specificity >= s) {
                    best = Some((specificity, handler, pattern));
                }
            }
        }
    }

    let Some((specificity, handler, pattern)) = best else {
        return Err(RouteError::NotFound {
            path: request_path.to_string(),
        });
    };

    let params = pattern
        .bind(&request)
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    Ok(RouteMatch {
        handler: handler.to_string(),
        params,
        specificity,
    })
}

/// Strip the application's base URI from a request path and normalize it.
///
/// An empty or unset base URI counts as `/`.
pub fn strip_base_uri(request_path: &str, base_uri: &str) -> String {
    let trimmed = request_path.trim_matches('/');
    let base = base_uri.trim_matches('/');
    if base.is_empty() {
        return trimmed.to_string();
    }

    if trimmed == base {
        String::new()
    } else {
        trimmed
            .strip_prefix(&format!("{base}/"))
            .unwrap_or(trimmed)
            .to_string()
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: &[(&str, &str)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (handler, pattern) in routes {
            table.insert(handler, pattern);
        }
        table
    }

    #[test]
    fn literal_match_beats_variable() {
        let table = table(&[("show", "/user/$id"), ("new", "/user/new")]);
        let matched = match_route(&table, "/user/new", "/").unwrap();
        assert_eq!(matched.handler, "new");
        assert_eq!(matched.specificity, 2);
    }

    #[test]
    fn binds_parameters() {
        let table = table(&[("blog", "/blog/$id/$page")]);
        let matched = match_route(&table, "/blog/42/3", "/").unwrap();
        assert_eq!(matched.params["id"], "42");
        assert_eq!(matched.params["page"], "3");
    }

    #[test]
    fn last_registered_wins_on_equal_specificity() {
        // Both patterns match /user/42 with one literal each; the pattern
        // registered last must win.
        let table = table(&[("by-id", "/user/$id"), ("by-name", "/user/$name")]);
        let matched = match_route(&table, "/user/42", "/").unwrap();
        assert_eq!(matched.handler, "by-name");
        assert_eq!(matched.params["name"], "42");
    }

    #[test]
    fn enumerated_values_constrain_the_match() {
        let table = table(&[("lang", "/lang/$code[en,nl]")]);
        let matched = match_route(&table, "/lang/en", "/").unwrap();
        assert_eq!(matched.params["code"], "en");
        assert!(matches!(
            match_route(&table, "/lang/fr", "/"),
            Err(RouteError::NotFound { .. })
        ));
    }

    #[test]
    fn enumerated_failure_falls_through_to_next_candidate() {
        let table = table(&[("known", "/lang/$code[en,nl]"), ("any", "/lang/$code")]);
        let matched = match_route(&table, "/lang/fr", "/").unwrap();
        assert_eq!(matched.handler, "any");
    }

    #[test]
    fn no_prefix_matching() {
        let table = table(&[("blog", "/blog/$id")]);
        assert!(match_route(&table, "/blog/1/extra", "/").is_err());
        assert!(match_route(&table, "/blog", "/").is_err());
    }

    #[test]
    fn base_uri_is_stripped_before_matching() {
        let table = table(&[("item", "/item/$id")]);
        let matched = match_route(&table, "/shop/item/7", "/shop").unwrap();
        assert_eq!(matched.params["id"], "7");
    }

    #[test]
    fn empty_base_uri_defaults_to_root() {
        let table = table(&[("item", "/item/$id")]);
        let matched = match_route(&table, "/item/7", "").unwrap();
        assert_eq!(matched.handler, "item");
    }

    #[test]
    fn root_path_matches_root_pattern() {
        let table = table(&[("home", "/")]);
        let matched = match_route(&table, "/", "/").unwrap();
        assert_eq!(matched.handler, "home");
        assert_eq!(matched.specificity, 0);
    }

    #[test]
    fn later_pattern_of_the_same_handler_wins() {
        let mut table = RouteTable::new();
        table.insert("blog", "/blog/$id");
        table.insert("blog", "/blog/$slug");
        let matched = match_route(&table, "/blog/hello", "/").unwrap();
        assert_eq!(matched.params["slug"], "hello");
        assert!(!matched.params.contains_key("id"));
    }
}
