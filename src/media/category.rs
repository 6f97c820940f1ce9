//! Media categories
//!
//! The fixed extension table deciding which requests the media server
//! handles. The category names double as the subdirectory names searched
//! under an application's media root and a package's asset root; the same
//! table drives MIME type inference.

/// Category (subdirectory name) for a file extension, or `None` when the
/// extension is not served as media
#[must_use]
pub fn category_for(extension: &str) -> Option<&'static str> {
    match extension {
        "gif" | "jpg" | "jpeg" | "png" | "ico" | "svg" | "webp" => Some("image"),
        "pdf" => Some("doc"),
        "css" => Some("css"),
        "woff" | "woff2" | "ttf" | "otf" | "eot" => Some("font"),
        "js" | "mjs" => Some("javascript"),
        "html" | "htm" => Some("tools"),
        "mp4" | "webm" | "ogv" => Some("video"),
        _ => None,
    }
}

/// MIME Content-Type for a served extension
#[must_use]
pub fn mime_type(extension: &str) -> &'static str {
    match extension {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}
