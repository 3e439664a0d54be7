use crate::error::LineError;
use crate::models::{split_compound, RawFields, PLACEHOLDER};
use crate::parsers::tokenizer::{is_digits, status_code, Tokenizer};
use crate::parsers::LogFormat;

/// Site logformat with the size before the `squid_status/status` pair:
/// `%>a %un %ru [%tl] %<st %Ss/%>Hs %rm %mt "%{User-Agent}>h"`
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomFormat;

impl CustomFormat {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormat for CustomFormat {
    fn name(&self) -> &str {
        "custom"
    }

    fn shape(&self) -> &str {
        r#"client_ip user url [timestamp] size squid_status/status METHOD mime "user_agent""#
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let mut tokens = Tokenizer::new(line);
        let client_ip = tokens.field("client_ip")?;
        let user = tokens.field("user")?;
        let url = tokens.field("url")?;
        let timestamp = tokens.bracketed("timestamp")?;
        let size = tokens.size("size")?;
        let compound = tokens.field("squid_status")?;
        let method = tokens.field("method")?;
        let _mime = tokens.field("mime")?;
        let user_agent = tokens.quoted("user_agent")?;

        // A word after the `/` is a hierarchy code, which is the custom_new layout
        let (squid_status, status) = match split_compound(compound) {
            (squid, None) => (squid, None),
            (squid, Some(status)) if status == PLACEHOLDER => (squid, None),
            (squid, Some(status)) if is_digits(status) => (squid, Some(status)),
            _ => {
                return Err(LineError::MalformedField {
                    field: "squid_status",
                    value: compound.to_string(),
                })
            }
        };

        Ok(RawFields {
            timestamp: Some(timestamp),
            client_ip,
            user: Some(user),
            method: Some(method),
            url: Some(url),
            status_code: status.map(status_code).unwrap_or(0),
            size: Some(size),
            user_agent: Some(user_agent),
            squid_status: Some(squid_status),
        })
    }
}
