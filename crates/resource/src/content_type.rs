/// Fallback MIME type when the extension is missing or unknown.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Derives the MIME type for a filename from the part after its last `.`.
pub fn from_name(filename: &str) -> &'static str {
    match filename.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => from_extension(extension),
        _ => OCTET_STREAM,
    }
}

/// Extension to MIME type, case-insensitive.
pub fn from_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "md" => "text/markdown",
        "js" => "text/javascript",
        "xml" => "application/xml",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => OCTET_STREAM,
    }
}
