//! Reverse URL rewriting
//!
//! The functional inverse of route matching: internally generated links
//! (handler path plus query parameters) are rewritten to the external form
//! declared by the application's route patterns. Links that do not
//! correspond to a declared route pass through unchanged; malformed input is
//! returned as-is, never an error.

use crate::routing::pattern::Segment;
use crate::routing::table::RouteTable;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Rewrite an internal URL to its external, routed form
///
/// The application's base URI is prefixed onto the result and a single
/// leading `/` is guaranteed, also for URLs that pass through unrewritten.
///
/// # Examples
/// ```
/// use polyhost::routing::{rewrite::rewrite, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.insert("blog", "/blog/$id[1,2,3]");
/// assert_eq!(rewrite(&table, "/", None, "blog?id=2"), "/blog/2");
/// ```
pub fn rewrite(table: &RouteTable, base_uri: &str, language: Option<&str>, url: &str) -> String {
    let rewritten = rewrite_routes(table, language, url);

    let base = base_uri.trim_matches('/');
    let joined = if base.is_empty() {
        rewritten
    } else {
        format!("{base}/{}", rewritten.trim_matches('/'))
    };

    // Relative URIs are not supported; force a leading slash
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Rewrite every absolute `href`/`src`/`action` attribute in an HTML document
pub fn rewrite_html(
    table: &RouteTable,
    base_uri: &str,
    language: Option<&str>,
    html: &str,
) -> String {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    let re = ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"(?i)\b(href|src|action)="/([^"]*)""#).expect("attribute pattern is valid")
    });

    re.replace_all(html, |caps: &Captures| {
        let uri = rewrite(table, base_uri, language, &caps[2]);
        format!("{}=\"{uri}\"", &caps[1])
    })
    .into_owned()
}

/// Rewrite every `url(...)` reference in a CSS document
pub fn rewrite_css(
    table: &RouteTable,
    base_uri: &str,
    language: Option<&str>,
    css: &str,
) -> String {
    static URL_REF: OnceLock<Regex> = OnceLock::new();
    let re = URL_REF
        .get_or_init(|| Regex::new(r"(?i)url\(([^)]*)\)").expect("url pattern is valid"));

    re.replace_all(css, |caps: &Captures| {
        let target = caps[1].replace("../", "");
        format!("url({})", rewrite(table, base_uri, language, &target))
    })
    .into_owned()
}

/// Rewrite the path portion of a URL against the route table.
///
/// Returns the path without a leading slash; the original URL when no
/// declared route corresponds to it.
fn rewrite_routes(table: &RouteTable, language: Option<&str>, url: &str) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };

    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    let mut params = parse_query(query);

    // The active language is always a known parameter
    if let Some(language) = language {
        if !params.iter().any(|(name, _)| name == "language") {
            params.push(("language".to_string(), language.to_string()));
        }
    }

    if path.is_empty() {
        return url.to_string();
    }
    let handler_id = path.trim_start_matches('/');

    // The handler identifier is the path itself, or its index variant
    let index_variant = format!("{handler_id}/index");
    let Some(patterns) = table.get(handler_id).or_else(|| table.get(&index_variant)) else {
        return url.to_string();
    };

    // A pattern matches when every literal counts and every variable is
    // satisfied by a present (and allowed) parameter; the last full match
    // wins, mirroring the matcher's tie-break.
    let mut selected = None;
    for pattern in patterns {
        let satisfied = pattern
            .segments()
            .iter()
            .filter(|segment| match segment {
                Segment::Literal(_) => true,
                Segment::Variable { name, allowed } => params
                    .iter()
                    .find(|(param, _)| param == name)
                    .is_some_and(|(_, value)| match allowed {
                        Some(values) => values.iter().any(|v| v == value),
                        None => true,
                    }),
            })
            .count();

        if satisfied == pattern.len() {
            selected = Some(pattern);
        }
    }

    let Some(pattern) = selected else {
        return url.to_string();
    };

    let mut rewritten = String::new();
    for segment in pattern.segments() {
        rewritten.push('/');
        match segment {
            Segment::Literal(text) => rewritten.push_str(text),
            Segment::Variable { name, .. } => {
                if let Some(value) = take_param(&mut params, name) {
                    rewritten.push_str(&value);
                }
            }
        }
    }
    let mut rewritten = rewritten.trim_start_matches('/').to_string();

    // Parameters not consumed by the pattern survive as a query string
    if !params.is_empty() {
        let leftover: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        rewritten.push('?');
        rewritten.push_str(&leftover.join("&"));
    }

    if let Some(fragment) = fragment {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }

    rewritten
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };

    // Allow &amp; instead of &
    query
        .replace("&amp;", "&")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn take_param(params: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let index = params.iter().position(|(param, _)| param == name)?;
    Some(params.remove(index).1)
}
