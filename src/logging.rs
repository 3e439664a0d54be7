//! Structured diagnostics on stderr
//!
//! stdout carries report output only, so every layer writes to stderr.

use crate::config::LoggingConfig;
use crate::error::AnalyzerError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` when set, otherwise the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter, AnalyzerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AnalyzerError::configuration("logging.level", e.to_string())),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AnalyzerError> {
    let filter = build_filter(&config.level)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match config.format.as_str() {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        _ => subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true),
            )
            .try_init(),
    };

    installed.map_err(|e| AnalyzerError::configuration("logging", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directives_are_accepted() {
        for level in ["error", "warn", "info", "debug", "trace", "squidlog=debug,warn"] {
            assert!(build_filter(level).is_ok(), "level: {}", level);
        }
    }
}
