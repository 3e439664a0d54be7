use crate::error::LineError;
use crate::models::RawFields;
use crate::parsers::tokenizer::{status_code, Tokenizer};
use crate::parsers::LogFormat;

/// Revised site logformat that logs the HTTP status on its own and keeps the
/// hierarchy code: `%>a %un %ru [%tl] %>Hs %Ss/%Sh %rm %mt "%{User-Agent}>h"`
///
/// No response size is logged, so records from this grammar have `size == 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomNewFormat;

impl CustomNewFormat {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormat for CustomNewFormat {
    fn name(&self) -> &str {
        "custom_new"
    }

    fn shape(&self) -> &str {
        r#"client_ip user url [timestamp] status squid_status/hierarchy METHOD mime "user_agent""#
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let mut tokens = Tokenizer::new(line);
        let client_ip = tokens.field("client_ip")?;
        let user = tokens.field("user")?;
        let url = tokens.field("url")?;
        let timestamp = tokens.bracketed("timestamp")?;
        let status = tokens.digits("status")?;
        let squid_status = tokens.field("squid_status")?;
        let method = tokens.field("method")?;
        let _mime = tokens.field("mime")?;
        let user_agent = tokens.quoted("user_agent")?;

        Ok(RawFields {
            timestamp: Some(timestamp),
            client_ip,
            user: Some(user),
            method: Some(method),
            url: Some(url),
            status_code: status_code(status),
            size: None,
            user_agent: Some(user_agent),
            squid_status: Some(squid_status),
        })
    }
}
