use crate::error::LineError;
use crate::models::{split_request, RawFields};
use crate::parsers::tokenizer::{status_code, Tokenizer};
use crate::parsers::LogFormat;

/// Common Log Format as emitted by Squid's `common` logformat:
/// `host ident authuser [timestamp] "request" status size`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonFormat;

impl CommonFormat {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormat for CommonFormat {
    fn name(&self) -> &str {
        "common"
    }

    fn shape(&self) -> &str {
        r#"client_ip ident user [timestamp] "METHOD URL proto" status size"#
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let mut tokens = Tokenizer::new(line);
        let client_ip = tokens.field("client_ip")?;
        let _ident = tokens.field("ident")?;
        let user = tokens.field("user")?;
        let timestamp = tokens.bracketed("timestamp")?;
        let request = tokens.quoted("request")?;
        let status = tokens.digits("status")?;
        let size = tokens.size("size")?;

        let (method, url) = split_request(request);

        Ok(RawFields {
            timestamp: Some(timestamp),
            client_ip,
            user: Some(user),
            method,
            url,
            status_code: status_code(status),
            size: Some(size),
            user_agent: None,
            squid_status: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentCategory;
    use chrono::Timelike;

    #[test]
    fn test_parse_common_line() {
        let line = r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET http://www.example.com/apache_pb.gif HTTP/1.0" 200 2326"#;
        let record = CommonFormat::new().parse_line(line).unwrap();
        assert_eq!(record.client_ip, "127.0.0.1");
        assert_eq!(record.user.as_deref(), Some("frank"));
        assert_eq!(record.method, "GET");
        assert_eq!(record.domain, "www.example.com");
        assert_eq!(record.status_code, 200);
        assert_eq!(record.size, 2326);
        assert_eq!(record.content_type, ContentCategory::Image);
        assert!(!record.timestamp_estimated);
        assert_eq!(record.timestamp.hour(), 13);
        assert_eq!(record.user_agent, None);
        assert_eq!(record.squid_status, None);
    }

    #[test]
    fn test_trailing_combined_fields_are_ignored() {
        let line = r#"10.1.1.1 - - [10/Oct/2000:13:55:36 +0000] "GET http://a.com/ HTTP/1.1" 304 - "http://ref/" "curl/8""#;
        let record = CommonFormat::new().parse_line(line).unwrap();
        assert_eq!(record.user, None);
        assert_eq!(record.size, 0);
        assert_eq!(record.status_code, 304);
    }

    #[test]
    fn test_bad_timestamp_degrades_to_now() {
        let line = r#"10.1.1.1 - bob [sometime] "GET http://a.com/ HTTP/1.1" 200 10"#;
        let record = CommonFormat::new().parse_line(line).unwrap();
        assert!(record.timestamp_estimated);
    }

    #[test]
    fn test_non_numeric_status_is_rejected() {
        let line = r#"10.1.1.1 - bob [10/Oct/2000:13:55:36 +0000] "GET http://a.com/ HTTP/1.1" OK 10"#;
        assert!(CommonFormat::new().parse_line(line).is_none());
    }
}
