use crate::error::LineError;
use crate::models::{compound_code, split_compound, RawFields};
use crate::parsers::tokenizer::Tokenizer;
use crate::parsers::LogFormat;
use crate::timestamp::is_epoch_token;

/// Squid's native `squid` logformat:
/// `time elapsed remotehost code/status bytes method URL rfc931 peerstatus/peerhost type`
///
/// Columns are padded with variable runs of spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquidNativeFormat;

impl SquidNativeFormat {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormat for SquidNativeFormat {
    fn name(&self) -> &str {
        "squid_native"
    }

    fn shape(&self) -> &str {
        "epoch_time elapsed client_ip result/status size METHOD URL user hierarchy/peer content_type"
    }

    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError> {
        let mut tokens = Tokenizer::new(line);
        let epoch = tokens.field("epoch_time")?;
        if !is_epoch_token(epoch) {
            return Err(LineError::MalformedField { field: "epoch_time", value: epoch.to_string() });
        }
        let _elapsed = tokens.digits("elapsed")?;
        let client_ip = tokens.field("client_ip")?;
        let result = tokens.field("result_status")?;
        let size = tokens.size("size")?;
        let method = tokens.field("method")?;
        let url = tokens.field("url")?;
        let user = tokens.field("user")?;
        let _hierarchy = tokens.field("hierarchy")?;
        let _mime = tokens.field("content_type")?;

        let (squid_status, status) = split_compound(result);

        Ok(RawFields {
            timestamp: Some(epoch),
            client_ip,
            user: Some(user),
            method: Some(method),
            url: Some(url),
            status_code: compound_code(status),
            size: Some(size),
            user_agent: None,
            squid_status: Some(squid_status),
        })
    }
}
