//! HTTP cache header helpers
//!
//! Conditional-GET support for media responses: RFC 1123 date formatting,
//! `ETag` derivation and the header set (`Last-Modified`, `Expires`,
//! `Cache-Control`) attached to every successful media response.

use chrono::{DateTime, Duration, Utc};
use std::time::SystemTime;

/// How long clients may keep a media response before revalidating
const MEDIA_EXPIRY_MINUTES: i64 = 30;

/// The cache headers carried by a successful media response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachingHeaders {
    pub etag: String,
    pub last_modified: String,
    pub expires: String,
}

/// Build the cache headers for a file with the given mtime and size
#[must_use]
pub fn caching_headers(mtime: SystemTime, size: u64) -> CachingHeaders {
    CachingHeaders {
        etag: file_etag(mtime, size),
        last_modified: format_http_date(mtime),
        expires: format_http_date_from(Utc::now() + Duration::minutes(MEDIA_EXPIRY_MINUTES)),
    }
}

/// Format a timestamp as an RFC 1123 HTTP date (`Tue, 05 Aug 2025 10:00:00 GMT`)
#[must_use]
pub fn format_http_date(time: SystemTime) -> String {
    format_http_date_from(time.into())
}

fn format_http_date_from(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Weak validator derived from mtime and size; content is never read for it
#[must_use]
pub fn file_etag(mtime: SystemTime, size: u64) -> String {
    let seconds = mtime
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("\"{seconds:x}-{size:x}\"")
}

/// Does the client's `If-Modified-Since` header allow a 304?
///
/// The comparison is an exact string match against the formatted mtime, so a
/// client echoing back our own `Last-Modified` value revalidates; any other
/// date string does not.
#[must_use]
pub fn not_modified(if_modified_since: Option<&str>, last_modified: &str) -> bool {
    if_modified_since.is_some_and(|header| header == last_modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn mtime() -> SystemTime {
        SystemTime::UNIX_EPOCH + StdDuration::from_secs(1_700_000_000)
    }

    #[test]
    fn http_date_format() {
        assert_eq!(format_http_date(mtime()), "Tue, 14 Nov 2023 22:13:20 GMT");
    }

    #[test]
    fn etag_is_stable_and_quoted() {
        let etag = file_etag(mtime(), 1234);
        assert_eq!(etag, file_etag(mtime(), 1234));
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_ne!(etag, file_etag(mtime(), 1235));
    }

    #[test]
    fn not_modified_requires_exact_match() {
        let last_modified = format_http_date(mtime());
        assert!(not_modified(Some(&last_modified), &last_modified));
        assert!(!not_modified(
            Some("Tue, 14 Nov 2023 22:13:21 GMT"),
            &last_modified
        ));
        assert!(!not_modified(None, &last_modified));
    }

    #[test]
    fn caching_headers_carry_all_three_values() {
        let headers = caching_headers(mtime(), 10);
        assert_eq!(headers.last_modified, "Tue, 14 Nov 2023 22:13:20 GMT");
        assert!(headers.expires.ends_with("GMT"));
        assert!(!headers.etag.is_empty());
    }
}
