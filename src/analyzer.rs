use crate::config::AnalyzerConfig;
use crate::detector::Detection;
use crate::error::AnalyzerError;
use crate::ingest::{FormatSelector, Ingestor, StreamingConfig};
use crate::registry::FormatRegistry;
use crate::table::RecordTable;
use std::path::{Path, PathBuf};

/// Entry point tying a log file to a grammar selection
#[derive(Debug, Clone)]
pub struct SquidAnalyzer {
    path: PathBuf,
    selector: FormatSelector,
    registry: FormatRegistry,
    streaming: StreamingConfig,
}

impl SquidAnalyzer {
    /// Analyzer over the built-in grammars with default reader settings
    pub fn new(path: impl Into<PathBuf>, selector: FormatSelector) -> Self {
        Self {
            path: path.into(),
            selector,
            registry: FormatRegistry::builtin(),
            streaming: StreamingConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_streaming(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = streaming;
        self
    }

    /// Take the registry and reader settings from `config`.
    ///
    /// Fails when a config-defined grammar does not compile.
    pub fn with_config(self, config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let registry = config.registry()?;
        Ok(self.with_registry(registry).with_streaming(config.streaming.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn selector(&self) -> &FormatSelector {
        &self.selector
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    fn ingestor(&self) -> Ingestor {
        Ingestor::with_config(self.registry.clone(), self.streaming.clone())
    }

    /// Read and parse the whole file into a table
    pub fn load(&self) -> Result<RecordTable, AnalyzerError> {
        self.ingestor().ingest_path(&self.path, &self.selector)
    }

    /// Sample the file and report the best-matching grammar
    pub fn detect(&self) -> Result<Detection, AnalyzerError> {
        self.ingestor().detect_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NATIVE: &str = "1157689324.156   1372 10.0.0.1 TCP_MISS/200 399 GET http://www.google.com/logo.png - DIRECT/66.102.9.147 image/png";

    fn log_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_auto() {
        let file = log_file(&[NATIVE, NATIVE]);
        let analyzer = SquidAnalyzer::new(file.path(), FormatSelector::Auto);
        let table = analyzer.load().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.detected_format(), Some("squid_native"));
        assert_eq!(analyzer.detect().unwrap().format, "squid_native");
    }

    #[test]
    fn test_missing_file_fails() {
        let analyzer = SquidAnalyzer::new("/no/such/access.log", FormatSelector::Auto);
        assert!(matches!(analyzer.load(), Err(AnalyzerError::Io { .. })));
        assert!(matches!(analyzer.detect(), Err(AnalyzerError::Io { .. })));
    }

    #[test]
    fn test_with_config_registers_custom_formats() {
        let file = log_file(&["10.1.1.1|http://intranet.local/wiki|200", "10.1.1.2|http://intranet.local/|404"]);
        let config = AnalyzerConfig::from_toml(
            r#"
            [[formats]]
            name = "pipe"
            pattern = '(?P<client_ip>[^|]+)\|(?P<url>[^|]+)\|(?P<status>\d+)'
            "#,
        )
        .unwrap();

        let analyzer = SquidAnalyzer::new(file.path(), FormatSelector::Named("pipe".to_string()))
            .with_config(&config)
            .unwrap();
        let table = analyzer.load().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.format(), "pipe");
        assert_eq!(table.rows()[1].record.status_code, 404);
        assert_eq!(table.rows()[0].record.domain, "intranet.local");
    }
}
