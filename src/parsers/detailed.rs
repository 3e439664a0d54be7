use crate::error::LineError;
use crate::models::{split_request, RawFields};
use crate::parsers::tokenizer::{status_code, Tokenizer};
use crate::parsers::LogFormat;

/// Squid `logformat` without a timestamp:
/// `%>a %un "%rm %ru HTTP/%rv" %>Hs %<st "%{User-Agent}>h" %Ss:%Sh`
///
/// Every record from this grammar carries an estimated timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailedFormat;

impl DetailedFormat {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormat for DetailedFormat {
    fn name(&self) -> &str {
        "detailed"
    }

    fn shape(&self) -> &str {
        r#"client_ip user "METHOD URL HTTP/ver" status size "user_agent" squid_status"#
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let mut tokens = Tokenizer::new(line);
        let client_ip = tokens.field("client_ip")?;
        let user = tokens.field("user")?;
        let request = tokens.quoted("request")?;
        let status = tokens.digits("status")?;
        let size = tokens.size("size")?;
        let user_agent = tokens.quoted("user_agent")?;
        let squid_status = tokens.field("squid_status")?;

        let (method, url) = split_request(request);

        Ok(RawFields {
            timestamp: None,
            client_ip,
            user: Some(user),
            method,
            url,
            status_code: status_code(status),
            size: Some(size),
            user_agent: Some(user_agent),
            squid_status: Some(squid_status),
        })
    }
}
