use crate::models::{ContentCategory, PLACEHOLDER};
use url::{ParseError, Url};

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".tif", ".tiff", ".avif",
];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp", ".rtf",
    ".txt", ".csv",
];
const MEDIA_EXTENSIONS: &[&str] = &[
    ".mp3", ".mp4", ".avi", ".mov", ".flv", ".wav", ".ogg", ".webm", ".mkv", ".m4a", ".m4v",
    ".aac", ".flac",
];
const WEB_PAGE_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".xhtml", ".php", ".asp", ".aspx", ".jsp", ".cgi",
];
const WEB_RESOURCE_EXTENSIONS: &[&str] = &[".js", ".mjs", ".css", ".json", ".xml", ".map"];
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".tgz", ".bz2", ".xz"];
const EXECUTABLE_EXTENSIONS: &[&str] = &[".exe", ".msi", ".bin", ".sh", ".deb", ".rpm", ".apk", ".dmg"];
const FONT_EXTENSIONS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf", ".eot"];

/// Checked in order, first match wins
const CATEGORY_TABLE: &[(ContentCategory, &[&str])] = &[
    (ContentCategory::Image, IMAGE_EXTENSIONS),
    (ContentCategory::Document, DOCUMENT_EXTENSIONS),
    (ContentCategory::Media, MEDIA_EXTENSIONS),
    (ContentCategory::Web, WEB_PAGE_EXTENSIONS),
    (ContentCategory::WebResource, WEB_RESOURCE_EXTENSIONS),
    (ContentCategory::Archive, ARCHIVE_EXTENSIONS),
    (ContentCategory::Executable, EXECUTABLE_EXTENSIONS),
    (ContentCategory::Font, FONT_EXTENSIONS),
];

/// Extract `host[:port]` from a URL as logged by the proxy.
///
/// Bare `host:port` (CONNECT) and `host/path` forms are accepted. The
/// authority is returned as written: case, ports and IDN hosts are kept.
/// Never fails: when no host can be found the input is returned unchanged.
pub fn extract_domain(url: &str) -> String {
    if url == PLACEHOLDER {
        return url.to_string();
    }

    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };

    let authority = authority(url);
    let structural = match Url::parse(&candidate) {
        Ok(parsed) => parsed.host_str().map_or(false, |host| !host.is_empty()),
        // The host is fine, only the port is outside u16
        Err(ParseError::InvalidPort) => !authority.contains(char::is_whitespace),
        Err(_) => false,
    };
    if structural && !authority.is_empty() {
        return authority.to_string();
    }

    if let Some((left, _)) = url.split_once(':') {
        if !left.is_empty() {
            return left.to_string();
        }
    }

    url.to_string()
}

/// Text between the scheme and the path, without any `user@` prefix
fn authority(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = rest.find(|c| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

/// Classify a URL into a coarse content category by its path extension
pub fn classify_content_type(url: &str) -> ContentCategory {
    if url == PLACEHOLDER {
        return ContentCategory::Unknown;
    }

    let lowered = url.to_lowercase();
    let path = lowered
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    CATEGORY_TABLE
        .iter()
        .find(|(_, extensions)| extensions.iter().any(|ext| path.ends_with(ext)))
        .map(|(category, _)| *category)
        .unwrap_or(ContentCategory::Other)
}
