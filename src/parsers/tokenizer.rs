use crate::error::LineError;
use crate::models::PLACEHOLDER;

/// Left-to-right cursor over a log line.
///
/// Plain fields are separated by runs of whitespace. Quoted and bracketed
/// fields end at the first closing delimiter followed by whitespace or the
/// end of the line, so a stray closer inside the field is kept.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Next whitespace-delimited token
    pub fn field(&mut self, name: &'static str) -> Result<&'a str, LineError> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Err(LineError::MissingField { field: name });
        }

        let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(token)
    }

    /// Token made only of ASCII digits
    pub fn digits(&mut self, name: &'static str) -> Result<&'a str, LineError> {
        let token = self.field(name)?;
        if is_digits(token) {
            Ok(token)
        } else {
            Err(LineError::MalformedField { field: name, value: token.to_string() })
        }
    }

    /// Byte count: digits or the `-` placeholder
    pub fn size(&mut self, name: &'static str) -> Result<&'a str, LineError> {
        let token = self.field(name)?;
        if token == PLACEHOLDER || is_digits(token) {
            Ok(token)
        } else {
            Err(LineError::MalformedField { field: name, value: token.to_string() })
        }
    }

    /// Contents of a `"..."` field
    pub fn quoted(&mut self, name: &'static str) -> Result<&'a str, LineError> {
        self.delimited(name, '"', '"')
    }

    /// Contents of a `[...]` field
    pub fn bracketed(&mut self, name: &'static str) -> Result<&'a str, LineError> {
        self.delimited(name, '[', ']')
    }

    fn delimited(&mut self, name: &'static str, open: char, close: char) -> Result<&'a str, LineError> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Err(LineError::MissingField { field: name });
        }

        let inner = match self.rest.strip_prefix(open) {
            Some(inner) => inner,
            None => {
                let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
                return Err(LineError::MalformedField {
                    field: name,
                    value: self.rest[..end].to_string(),
                });
            }
        };

        // Only a closer followed by whitespace or end of line ends the field
        let end = inner
            .match_indices(close)
            .map(|(index, _)| index)
            .find(|&index| {
                inner[index + close.len_utf8()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
            })
            .ok_or(LineError::Unterminated { delimiter: close })?;
        self.rest = &inner[end + close.len_utf8()..];
        Ok(&inner[..end])
    }

    /// Whatever has not been consumed yet
    pub fn remainder(&self) -> &'a str {
        self.rest
    }
}

pub fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Status digits to a code; values that overflow degrade to 0
pub fn status_code(token: &str) -> u16 {
    token.parse().unwrap_or(0)
}
