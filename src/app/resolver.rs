//! Application resolution
//!
//! Maps an inbound (hostname, path) pair to one configured application.
//! Exact hostname matches are tried first, then wildcard patterns; the
//! surviving candidates are ranked by matched-hostname length and base-URI
//! length so the most specific application wins.

use crate::app::Application;
use std::sync::Arc;
use thiserror::Error;

/// A resolved application candidate
///
/// Carries the matched hostname string and the request URI relative to the
/// application's base URI; the application itself is shared, not cloned.
#[derive(Debug, Clone)]
pub struct HostMatch {
    pub application: Arc<Application>,
    /// The configured hostname entry that matched (the wildcard pattern
    /// itself for wildcard matches)
    pub matched_hostname: String,
    /// Request URI with the application's base URI stripped
    pub relative_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No configured application matches the hostname/path pair
    #[error("no application found for '{0}'")]
    UnknownApplication(String),
}

/// Resolve the application for a request
///
/// Stages, each only entered when the previous one produced no candidates:
///
/// 1. exact hostname match against every application's hostname list;
/// 2. wildcard match (`*` spans any run of characters, `?` one character) —
///    one candidate per matching wildcard pattern.
///
/// Candidates whose base URI is not a prefix of the request path are
/// discarded; the rest are ranked by (matched-hostname length, base-URI
/// length), largest first, later candidates winning exact ties.
pub fn detect(
    hostname: &str,
    request_uri: &str,
    applications: &[Arc<Application>],
) -> Result<HostMatch, ResolveError> {
    let hostname = effective_hostname(hostname);

    // Exact matches
    let mut candidates: Vec<(Arc<Application>, String)> = Vec::new();
    for application in applications {
        if application.config.hostnames.iter().any(|h| h == hostname) {
            candidates.push((Arc::clone(application), hostname.to_string()));
        }
    }

    // Wildcards only when nothing matched exactly
    if candidates.is_empty() {
        for application in applications {
            for pattern in &application.config.hostnames {
                if pattern.contains('*') && hostname_matches(pattern, hostname) {
                    candidates.push((Arc::clone(application), pattern.clone()));
                }
            }
        }
    }

    let mut best: Option<((usize, usize), HostMatch)> = None;
    for (application, matched_hostname) in candidates {
        let base_uri = application.config.base_uri().to_string();
        if !request_uri.starts_with(&base_uri) {
            continue;
        }

        let relative_uri = if base_uri == "/" {
            request_uri.to_string()
        } else {
            request_uri
                .strip_prefix(&base_uri)
                .unwrap_or(request_uri)
                .to_string()
        };

        // ">=" keeps the candidate seen last on equal specificity
        let key = (matched_hostname.len(), base_uri.len());
        if best.as_ref().map_or(true, |(k, _)| key >= *k) {
            best = Some((
                key,
                HostMatch {
                    application,
                    matched_hostname,
                    relative_uri,
                },
            ));
        }
    }

    match best {
        Some((_, matched)) => Ok(matched),
        None => Err(ResolveError::UnknownApplication(hostname.to_string())),
    }
}

/// Normalize a host header value: a forwarding proxy may send a comma
/// separated list, in which case the last entry wins.
#[must_use]
pub fn effective_hostname(raw: &str) -> &str {
    raw.rsplit(',').next().unwrap_or(raw).trim()
}

/// Match a hostname against a configured pattern with shell-glob semantics
///
/// `*` matches any run of characters (including none), `?` exactly one.
#[must_use]
pub fn hostname_matches(pattern: &str, hostname: &str) -> bool {
    glob_match(pattern.as_bytes(), hostname.as_bytes())
}

fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((b'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((byte, rest)) => text.first() == Some(byte) && glob_match(rest, &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{parse_app_config, Application};

    fn app(name: &str, hostnames: &[&str], base_uri: &str) -> Arc<Application> {
        let config = parse_app_config(&format!(
            "hostnames = [{}]\nbase_uri = \"{base_uri}\"",
            hostnames
                .iter()
                .map(|h| format!("\"{h}\""))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .unwrap();
        Arc::new(Application::new(name, format!("/apps/{name}"), config))
    }

    #[test]
    fn wildcard_semantics() {
        assert!(hostname_matches("*.example.com", "foo.example.com"));
        assert!(hostname_matches("*.example.com", "a.b.example.com"));
        assert!(!hostname_matches("*.example.com", "example.com"));
        assert!(!hostname_matches("*.example.com", "example.org"));
        assert!(hostname_matches("host?.example.com", "host1.example.com"));
    }

    #[test]
    fn exact_match_resolves() {
        let apps = vec![app("main", &["example.com"], "/")];
        let matched = detect("example.com", "/", &apps).unwrap();
        assert_eq!(matched.application.name, "main");
        assert_eq!(matched.matched_hostname, "example.com");
    }

    #[test]
    fn unknown_hostname_fails() {
        let apps = vec![app("main", &["example.com"], "/")];
        let err = detect("other.com", "/", &apps).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownApplication("other.com".to_string())
        );
    }

    #[test]
    fn exact_beats_wildcard() {
        let apps = vec![
            app("wild", &["*.example.com"], "/"),
            app("www", &["www.example.com"], "/"),
        ];
        let matched = detect("www.example.com", "/", &apps).unwrap();
        assert_eq!(matched.application.name, "www");
    }

    #[test]
    fn wildcard_used_when_no_exact_match() {
        let apps = vec![
            app("wild", &["*.example.com"], "/"),
            app("www", &["www.example.com"], "/"),
        ];
        let matched = detect("foo.example.com", "/", &apps).unwrap();
        assert_eq!(matched.application.name, "wild");
        assert_eq!(matched.matched_hostname, "*.example.com");
    }

    #[test]
    fn longer_base_uri_wins_for_matching_prefix() {
        let apps = vec![
            app("site", &["example.com"], "/"),
            app("shop", &["example.com"], "/shop"),
        ];

        let matched = detect("example.com", "/shop/item/1", &apps).unwrap();
        assert_eq!(matched.application.name, "shop");
        assert_eq!(matched.relative_uri, "/item/1");

        let matched = detect("example.com", "/blog/1", &apps).unwrap();
        assert_eq!(matched.application.name, "site");
        assert_eq!(matched.relative_uri, "/blog/1");
    }

    #[test]
    fn base_uri_must_prefix_the_path() {
        let apps = vec![app("shop", &["example.com"], "/shop")];
        assert!(detect("example.com", "/other", &apps).is_err());
    }

    #[test]
    fn forwarded_host_list_uses_the_last_entry() {
        let apps = vec![app("b", &["b.com"], "/")];
        let matched = detect("a.com, b.com", "/", &apps).unwrap();
        assert_eq!(matched.application.name, "b");
    }

    #[test]
    fn resolution_is_deterministic_for_equal_specificity() {
        // Same hostname length and base URI: the application seen last wins,
        // consistently.
        let apps = vec![
            app("first", &["example.com"], "/"),
            app("second", &["example.com"], "/"),
        ];
        for _ in 0..3 {
            let matched = detect("example.com", "/", &apps).unwrap();
            assert_eq!(matched.application.name, "second");
        }
    }
}
