use std::fmt;
use serde::{Deserialize, Serialize};

/// Failures that abort an analysis run.
///
/// Only file-level problems surface here. Malformed lines and unconvertible
/// fields degrade inside the parsers and never reach the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalyzerError {
    /// The log file could not be opened or read
    Io {
        operation: String,
        path: String,
        error_message: String,
    },
    /// An explicit format name is not in the registry
    UnknownFormat {
        name: String,
        known: Vec<String>,
    },
    /// A configuration value is missing or out of range
    Configuration {
        parameter: String,
        error_message: String,
    },
    /// A config-defined format pattern failed to compile or lacks required groups
    InvalidPattern {
        name: String,
        error_message: String,
    },
}

impl AnalyzerError {
    pub fn io(operation: &str, path: &str, error: &std::io::Error) -> Self {
        AnalyzerError::Io {
            operation: operation.to_string(),
            path: path.to_string(),
            error_message: error.to_string(),
        }
    }

    pub fn configuration(parameter: &str, error_message: impl Into<String>) -> Self {
        AnalyzerError::Configuration {
            parameter: parameter.to_string(),
            error_message: error_message.into(),
        }
    }
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerError::Io { operation, path, error_message } => {
                write!(f, "I/O error during {} of '{}': {}", operation, path, error_message)
            }
            AnalyzerError::UnknownFormat { name, known } => {
                write!(f, "Unknown log format '{}', known formats: {}", name, known.join(", "))
            }
            AnalyzerError::Configuration { parameter, error_message } => {
                write!(f, "Configuration error for '{}': {}", parameter, error_message)
            }
            AnalyzerError::InvalidPattern { name, error_message } => {
                write!(f, "Invalid pattern for format '{}': {}", name, error_message)
            }
        }
    }
}

impl std::error::Error for AnalyzerError {}

/// Why a single line was rejected by a grammar. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line ended before all fixed fields were read
    MissingField { field: &'static str },
    /// A field was present but did not have the expected shape
    MalformedField { field: &'static str, value: String },
    /// A quoted or bracketed field was never closed
    Unterminated { delimiter: char },
    /// The regex of a config-defined format did not match
    NoMatch,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::MissingField { field } => write!(f, "missing field '{}'", field),
            LineError::MalformedField { field, value } => {
                write!(f, "malformed field '{}': '{}'", field, value)
            }
            LineError::Unterminated { delimiter } => {
                write!(f, "unterminated field, expected closing '{}'", delimiter)
            }
            LineError::NoMatch => write!(f, "pattern did not match"),
        }
    }
}

impl std::error::Error for LineError {}
