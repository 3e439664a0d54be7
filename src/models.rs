use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::classify::{classify_content_type, extract_domain};

/// Placeholder used by every supported grammar for an absent value
pub const PLACEHOLDER: &str = "-";

/// Coarse content category derived from a URL's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentCategory {
    Image,
    Document,
    Media,
    Web,
    WebResource,
    Archive,
    Executable,
    Font,
    Other,
    Unknown,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Image => "image",
            ContentCategory::Document => "document",
            ContentCategory::Media => "media",
            ContentCategory::Web => "web",
            ContentCategory::WebResource => "web-resource",
            ContentCategory::Archive => "archive",
            ContentCategory::Executable => "executable",
            ContentCategory::Font => "font",
            ContentCategory::Other => "other",
            ContentCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized access-log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Request time; "now" when the line carried none or it was unreadable
    pub timestamp: DateTime<FixedOffset>,

    /// True if `timestamp` was substituted rather than read from the line
    pub timestamp_estimated: bool,

    pub client_ip: String,

    /// Authenticated user; `-` in the source maps to `None`
    pub user: Option<String>,

    pub method: String,
    pub url: String,

    /// Host (and non-default port) taken from `url`
    pub domain: String,

    pub status_code: u16,

    /// Response size in bytes
    pub size: u64,

    pub referer: Option<String>,
    pub user_agent: Option<String>,

    /// Proxy result/hierarchy annotation such as `TCP_MISS:HIER_DIRECT`
    pub squid_status: Option<String>,

    pub content_type: ContentCategory,
}

/// Raw field values pulled out of a line by a grammar, before normalization
#[derive(Debug, Clone, Default)]
pub struct RawFields<'a> {
    pub timestamp: Option<&'a str>,
    pub client_ip: &'a str,
    pub user: Option<&'a str>,
    pub method: Option<&'a str>,
    pub url: Option<&'a str>,
    pub status_code: u16,
    pub size: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub squid_status: Option<&'a str>,
}

impl LogRecord {
    /// Normalize extracted fields into a record, applying the shared defaults
    pub fn from_raw(raw: RawFields<'_>) -> Self {
        let (timestamp, timestamp_estimated) = match raw.timestamp.and_then(crate::timestamp::parse_timestamp) {
            Some(ts) => (ts, false),
            None => (Local::now().fixed_offset(), true),
        };

        let method = non_empty_or_placeholder(raw.method);
        let url = non_empty_or_placeholder(raw.url);
        let domain = extract_domain(&url);
        let content_type = classify_content_type(&url);

        Self {
            timestamp,
            timestamp_estimated,
            client_ip: raw.client_ip.to_string(),
            user: optional_field(raw.user),
            method,
            url,
            domain,
            status_code: raw.status_code,
            size: raw.size.map(parse_size).unwrap_or(0),
            referer: None,
            user_agent: optional_field(raw.user_agent),
            squid_status: optional_field(raw.squid_status),
            content_type,
        }
    }
}

/// `-` and empty strings mean "absent"
pub fn optional_field(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() && v != PLACEHOLDER => Some(v.to_string()),
        _ => None,
    }
}

fn non_empty_or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// `-` or an unreadable size counts as zero bytes
pub fn parse_size(value: &str) -> u64 {
    if value == PLACEHOLDER {
        return 0;
    }
    value.parse().unwrap_or(0)
}

/// Split `METHOD URL[ PROTOCOL]` into method and url
pub fn split_request(request: &str) -> (Option<&str>, Option<&str>) {
    let mut parts = request.split_whitespace();
    (parts.next(), parts.next())
}

/// Split an `A/B` compound token on the first `/`
pub fn split_compound(token: &str) -> (&str, Option<&str>) {
    match token.split_once('/') {
        Some((primary, secondary)) => (primary, Some(secondary)),
        None => (token, None),
    }
}

/// Numeric half of a compound token; absent or non-numeric becomes 0
pub fn compound_code(part: Option<&str>) -> u16 {
    part.and_then(|p| p.parse().ok()).unwrap_or(0)
}
