//! HTTP response building
//!
//! Builders for the status responses and the media response family (200,
//! 206 single and multipart, 304, 416), decoupled from resolution logic.

use crate::http::cache::CachingHeaders;
use crate::http::range::ByteRange;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Build 400 Bad Request response
pub fn build_400_response(detail: &str) -> Response<Full<Bytes>> {
    plain_status(400, &format!("400 Bad Request ({detail})"))
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    plain_status(403, "403 Forbidden")
}

/// Build 404 Not Found response, optionally naming what was not found
pub fn build_404_response(detail: Option<&str>) -> Response<Full<Bytes>> {
    let body = match detail {
        Some(detail) => format!("404 Not Found ({detail})"),
        None => "404 Not Found".to_string(),
    };
    plain_status(404, &body)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Range")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(302)
        .header("Location", target)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            Response::new(Full::new(Bytes::from("Redirecting...")))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build 304 Not Modified response for a media file
pub fn build_304_response(caching: &CachingHeaders) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", &caching.etag)
        .header("Cache-Control", "public")
        .header("Pragma", "public")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a full 200 media response with cache headers
pub fn build_media_response(
    data: Bytes,
    content_type: &str,
    caching: &CachingHeaders,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    media_builder(200, content_type, caching)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 206 Partial Content response for a single byte range
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    caching: &CachingHeaders,
    range: ByteRange,
    total_size: u64,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head { Bytes::new() } else { data };

    media_builder(206, content_type, caching)
        .header("Content-Length", range.content_length())
        .header(
            "Content-Range",
            format!("bytes {}-{}/{total_size}", range.start, range.end),
        )
        .header("Accept-Ranges", "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 206 Partial Content response carrying multiple byte ranges as a
/// `multipart/x-byteranges` body
pub fn build_multipart_response(
    body: Bytes,
    boundary: &str,
    caching: &CachingHeaders,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    media_builder(
        206,
        &format!("multipart/x-byteranges; boundary={boundary}"),
        caching,
    )
    .header("Content-Length", content_length)
    .header("Accept-Ranges", "bytes")
    .body(Full::new(body))
    .unwrap_or_else(|e| {
        log_build_error("206 multipart", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn media_builder(
    status: u16,
    content_type: &str,
    caching: &CachingHeaders,
) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("ETag", &caching.etag)
        .header("Cache-Control", "public")
        .header("Pragma", "public")
        .header("Last-Modified", &caching.last_modified)
        .header("Expires", &caching.expires)
}

fn plain_status(status: u16, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(body.to_string())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::cache::caching_headers;
    use std::time::SystemTime;

    fn caching() -> CachingHeaders {
        caching_headers(SystemTime::UNIX_EPOCH, 1000)
    }

    #[test]
    fn media_response_carries_cache_headers() {
        let response = build_media_response(Bytes::from_static(b"data"), "text/css", &caching(), false);
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["Cache-Control"], "public");
        assert_eq!(response.headers()["Pragma"], "public");
        assert_eq!(response.headers()["Accept-Ranges"], "bytes");
        assert!(response.headers().contains_key("Last-Modified"));
        assert!(response.headers().contains_key("Expires"));
    }

    #[test]
    fn partial_response_has_content_range() {
        let range = ByteRange { start: 500, end: 999 };
        let response = build_partial_response(
            Bytes::from(vec![0u8; 500]),
            "video/mp4",
            &caching(),
            range,
            1000,
            false,
        );
        assert_eq!(response.status(), 206);
        assert_eq!(response.headers()["Content-Range"], "bytes 500-999/1000");
        assert_eq!(response.headers()["Content-Length"], "500");
    }

    #[test]
    fn multipart_response_declares_the_boundary() {
        let response =
            build_multipart_response(Bytes::from_static(b"..."), "BOUND", &caching(), false);
        assert_eq!(response.status(), 206);
        assert_eq!(
            response.headers()["Content-Type"],
            "multipart/x-byteranges; boundary=BOUND"
        );
    }

    #[test]
    fn head_requests_get_empty_bodies() {
        let response =
            build_media_response(Bytes::from_static(b"data"), "text/css", &caching(), true);
        // Content-Length still reflects the file
        assert_eq!(response.headers()["Content-Length"], "4");
    }

    #[test]
    fn not_satisfiable_names_the_file_size() {
        let response = build_416_response(1000);
        assert_eq!(response.status(), 416);
        assert_eq!(response.headers()["Content-Range"], "bytes */1000");
    }

    #[test]
    fn not_found_detail_is_appended() {
        let _ = build_404_response(Some("application"));
        let _ = build_404_response(None);
    }
}
