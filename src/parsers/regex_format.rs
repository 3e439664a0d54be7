use crate::error::{AnalyzerError, LineError};
use crate::models::{split_request, RawFields};
use crate::parsers::tokenizer::status_code;
use crate::parsers::LogFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Capture group names a pattern may use
pub const KNOWN_GROUPS: [&str; 10] = [
    "client_ip",
    "user",
    "timestamp",
    "request",
    "method",
    "url",
    "status",
    "size",
    "user_agent",
    "squid_status",
];

/// A site-specific grammar declared in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexFormatConfig {
    pub name: String,
    /// Regex with named groups from [`KNOWN_GROUPS`]; anchored at line start
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Grammar backed by a config-supplied regex
#[derive(Debug, Clone)]
pub struct RegexFormat {
    name: String,
    shape: String,
    regex: Regex,
}

impl RegexFormat {
    pub fn new(config: RegexFormatConfig) -> Result<Self, AnalyzerError> {
        let anchored = format!("^(?:{})", config.pattern);
        let regex = Regex::new(&anchored).map_err(|e| AnalyzerError::InvalidPattern {
            name: config.name.clone(),
            error_message: e.to_string(),
        })?;

        let groups: Vec<&str> = regex.capture_names().flatten().collect();
        if !groups.contains(&"client_ip") {
            return Err(AnalyzerError::InvalidPattern {
                name: config.name,
                error_message: "pattern must capture a 'client_ip' group".to_string(),
            });
        }
        if !groups.contains(&"url") && !groups.contains(&"request") {
            return Err(AnalyzerError::InvalidPattern {
                name: config.name,
                error_message: "pattern must capture a 'url' or 'request' group".to_string(),
            });
        }
        if let Some(unknown) = groups.iter().find(|g| !KNOWN_GROUPS.contains(g)) {
            tracing::warn!(format = %config.name, group = %unknown, "capture group is not mapped to any record field");
        }

        Ok(Self {
            shape: config.description.unwrap_or_else(|| config.pattern.clone()),
            name: config.name,
            regex,
        })
    }
}

impl LogFormat for RegexFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> &str {
        &self.shape
    }

    fn detect_pattern(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let captures = self.regex.captures(line).ok_or(LineError::NoMatch)?;
        let group = |name: &str| captures.name(name).map(|m| m.as_str());

        let client_ip = group("client_ip").ok_or(LineError::MissingField { field: "client_ip" })?;

        let (request_method, request_url) = match group("request") {
            Some(request) => split_request(request),
            None => (None, None),
        };

        Ok(RawFields {
            timestamp: group("timestamp"),
            client_ip,
            user: group("user"),
            method: group("method").or(request_method),
            url: group("url").or(request_url),
            status_code: group("status").map(status_code).unwrap_or(0),
            size: group("size"),
            user_agent: group("user_agent"),
            squid_status: group("squid_status"),
        })
    }
}
