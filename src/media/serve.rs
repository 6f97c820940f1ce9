//! Media resolution and serving
//!
//! Resolves a media request to a file across the configured search roots and
//! serves it with cache headers, conditional-GET and byte-range support.
//! Once a request's extension is recognized the outcome is terminal: either
//! a response (200/206/304/416) or a not-found failure - it never falls back
//! into routing.

use crate::app::{AppRegistry, Application};
use crate::http::cache;
use crate::http::range::{parse_range_header, ByteRange, RangeParseResult};
use crate::http::response;
use crate::logger;
use crate::media::category;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Fixed read size; bounds per-read memory for large files
const READ_CHUNK: usize = 64 * 1024;

/// The request fields the media server looks at
#[derive(Debug, Clone, Copy)]
pub struct MediaRequest<'a> {
    /// Request path relative to the application's base URI
    pub relative_uri: &'a str,
    pub if_modified_since: Option<&'a str>,
    pub range: Option<&'a str>,
    pub is_head: bool,
}

/// What the media server decided
pub enum MediaOutcome {
    /// The request was handled; the response is final
    Served(Response<Full<Bytes>>),
    /// The extension is not media - continue with normal routing
    NotHandled,
}

#[derive(Debug, Error)]
pub enum MediaError {
    /// Recognized extension, but no file in any search root
    #[error("no media file found for '{0}'")]
    NotFound(String),
    /// The file exceeds the configured serving limit
    #[error("media file '{path}' is {size} bytes, over the serving limit")]
    TooLarge { path: PathBuf, size: u64 },
    #[error("failed to read media file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Serve a media request for the resolved application
///
/// Search order: the application's per-category media subdirectory, the
/// global asset directory, then each installed package's per-category asset
/// tree when the first path segment names the package (the segment is
/// stripped before lookup). The first existing file wins.
pub async fn serve(
    request: MediaRequest<'_>,
    application: &Application,
    registry: &AppRegistry,
    max_file_size: u64,
) -> Result<MediaOutcome, MediaError> {
    // Don't bother looking up /
    if request.relative_uri == "/" || request.relative_uri.is_empty() {
        return Ok(MediaOutcome::NotHandled);
    }

    let relative_path = request.relative_uri.trim_matches('/');
    let Some(extension) = file_extension(relative_path) else {
        return Ok(MediaOutcome::NotHandled);
    };
    let Some(file_category) = category::category_for(extension) else {
        return Ok(MediaOutcome::NotHandled);
    };

    if relative_path.split('/').any(|segment| segment == "..") {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative_path}"
        ));
        return Err(MediaError::NotFound(relative_path.to_string()));
    }

    let Some(file_path) = resolve(relative_path, file_category, application, registry).await
    else {
        return Err(MediaError::NotFound(relative_path.to_string()));
    };

    let metadata = tokio::fs::metadata(&file_path)
        .await
        .map_err(|source| MediaError::Io {
            path: file_path.clone(),
            source,
        })?;
    let size = metadata.len();
    let mtime = metadata.modified().map_err(|source| MediaError::Io {
        path: file_path.clone(),
        source,
    })?;
    let caching = cache::caching_headers(mtime, size);

    // Conditional GET wins over everything else, range headers included
    if cache::not_modified(request.if_modified_since, &caching.last_modified) {
        return Ok(MediaOutcome::Served(response::build_304_response(&caching)));
    }

    if size > max_file_size {
        return Err(MediaError::TooLarge {
            path: file_path,
            size,
        });
    }

    let content_type = category::mime_type(extension);
    let served = match parse_range_header(request.range, size) {
        RangeParseResult::None => {
            let data = read_range(&file_path, full_range(size)).await?;
            response::build_media_response(data, content_type, &caching, request.is_head)
        }
        RangeParseResult::NotSatisfiable => response::build_416_response(size),
        RangeParseResult::Valid(ranges) if ranges.len() == 1 => {
            let range = ranges[0];
            let data = read_range(&file_path, Some(range)).await?;
            response::build_partial_response(
                data,
                content_type,
                &caching,
                range,
                size,
                request.is_head,
            )
        }
        RangeParseResult::Valid(ranges) => {
            let boundary = multipart_boundary();
            let mut parts = Vec::with_capacity(ranges.len());
            for range in ranges {
                let data = read_range(&file_path, Some(range)).await?;
                parts.push((range, data));
            }
            let body = multipart_body(&parts, content_type, size, &boundary);
            response::build_multipart_response(body, &boundary, &caching, request.is_head)
        }
    };

    Ok(MediaOutcome::Served(served))
}

/// Extension of the requested file, `None` when the last segment has none
fn file_extension(relative_path: &str) -> Option<&str> {
    let filename = relative_path.rsplit('/').next()?;
    match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => Some(extension),
        _ => None,
    }
}

/// First existing file across the search roots
async fn resolve(
    relative_path: &str,
    file_category: &str,
    application: &Application,
    registry: &AppRegistry,
) -> Option<PathBuf> {
    let mut candidates = vec![application.media_dir(file_category).join(relative_path)];

    if let Some(asset_dir) = registry.asset_dir() {
        candidates.push(asset_dir.join(relative_path));
    }

    if let Some((first, rest)) = relative_path.split_once('/') {
        for package in registry.packages() {
            if package.name == first {
                candidates.push(package.asset_path.join(file_category).join(rest));
            }
        }
    }

    for candidate in candidates {
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}

fn full_range(size: u64) -> Option<ByteRange> {
    if size == 0 {
        None
    } else {
        Some(ByteRange {
            start: 0,
            end: size - 1,
        })
    }
}

/// Read a byte range (or nothing) from a file in fixed-size chunks
async fn read_range(path: &Path, range: Option<ByteRange>) -> Result<Bytes, MediaError> {
    let Some(range) = range else {
        return Ok(Bytes::new());
    };

    let io_error = |source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).await.map_err(io_error)?;
    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(io_error)?;

    let mut remaining = usize::try_from(range.content_length()).unwrap_or(usize::MAX);
    let mut data = Vec::with_capacity(remaining);
    let mut chunk = vec![0u8; READ_CHUNK.min(remaining)];
    while remaining > 0 {
        let want = READ_CHUNK.min(remaining);
        let read = file.read(&mut chunk[..want]).await.map_err(io_error)?;
        if read == 0 {
            break; // file shrank underneath us; serve what is there
        }
        data.extend_from_slice(&chunk[..read]);
        remaining -= read;
    }

    Ok(Bytes::from(data))
}

fn multipart_boundary() -> String {
    (0..24).map(|_| fastrand::alphanumeric()).collect()
}

/// Assemble a `multipart/x-byteranges` body per RFC 7233
fn multipart_body(
    parts: &[(ByteRange, Bytes)],
    content_type: &str,
    total_size: u64,
    boundary: &str,
) -> Bytes {
    let mut body = Vec::new();
    for (range, data) in parts {
        body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Range: bytes {}-{}/{total_size}\r\n\r\n",
                range.start, range.end
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
    }
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Bytes::from(body)
}
