use crate::error::LineError;
use crate::models::{LogRecord, RawFields};

/// A named line grammar.
///
/// Implementors only describe how fields are pulled out of a line; matching
/// and normalization are shared through the provided methods.
pub trait LogFormat: Send + Sync {
    /// Registry name, e.g. `"detailed"`
    fn name(&self) -> &str;

    /// One-line human description of the layout
    fn shape(&self) -> &str;

    /// Pull the raw fields out of `line`, or explain why it does not fit
    fn extract<'a>(&self, line: &'a str) -> Result<RawFields<'a>, LineError>;

    /// Whether the line fits this grammar, without building a record
    fn detect_pattern(&self, line: &str) -> bool {
        self.extract(line).is_ok()
    }

    /// Parse a line into a normalized record; `None` drops the line
    fn parse_line(&self, line: &str) -> Option<LogRecord> {
        match self.extract(line) {
            Ok(raw) => Some(LogRecord::from_raw(raw)),
            Err(error) => {
                tracing::trace!(format = self.name(), %error, line, "line dropped");
                None
            }
        }
    }
}

pub mod tokenizer;
pub mod detailed;
pub mod common;
pub mod squid_native;
pub mod custom;
pub mod custom_new;
pub mod regex_format;

pub use detailed::DetailedFormat;
pub use common::CommonFormat;
pub use squid_native::SquidNativeFormat;
pub use custom::CustomFormat;
pub use custom_new::CustomNewFormat;
pub use regex_format::{RegexFormat, RegexFormatConfig};
