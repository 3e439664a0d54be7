use crate::detector::{Detection, FormatDetector, DEFAULT_SAMPLE_SIZE};
use crate::error::AnalyzerError;
use crate::registry::{FormatRegistry, DEFAULT_FORMAT};
use crate::table::{IngestStats, RecordTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

/// Which grammar to parse a file with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FormatSelector {
    /// Sample the file and pick the best-matching grammar
    Auto,
    /// Use the named grammar, bypassing detection
    Named(String),
}

impl FromStr for FormatSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            Ok(FormatSelector::Auto)
        } else {
            Ok(FormatSelector::Named(trimmed.to_string()))
        }
    }
}

impl From<String> for FormatSelector {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(selector) => selector,
            Err(never) => match never {},
        }
    }
}

impl From<FormatSelector> for String {
    fn from(value: FormatSelector) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FormatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSelector::Auto => f.write_str("auto"),
            FormatSelector::Named(name) => f.write_str(name),
        }
    }
}

impl Default for FormatSelector {
    fn default() -> Self {
        FormatSelector::Auto
    }
}

/// Reader settings for ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Buffer size for reading the file
    pub buffer_size: usize,
    /// Lines sampled for automatic detection
    pub sample_size: usize,
    /// Grammar used when detection finds nothing
    pub default_format: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024, // 64KB
            sample_size: DEFAULT_SAMPLE_SIZE,
            default_format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Decode a line, silently skipping byte sequences that are not valid UTF-8
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    decoded
}

/// Read one line into `line`, returning `false` at end of input
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, line: &mut String) -> std::io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    line.clear();
    line.push_str(decode_permissive(buf).trim_end());
    Ok(true)
}

/// First `count` lines of the reader, trimmed; the reader is left positioned after them
pub fn read_sample<R: BufRead>(reader: &mut R, count: usize) -> std::io::Result<Vec<String>> {
    let mut sample = Vec::with_capacity(count);
    let mut buf = Vec::new();
    let mut line = String::new();
    while sample.len() < count && next_line(reader, &mut buf, &mut line)? {
        sample.push(line.clone());
    }
    Ok(sample)
}

/// Streams log files into [`RecordTable`]s
#[derive(Debug, Clone)]
pub struct Ingestor {
    registry: FormatRegistry,
    config: StreamingConfig,
}

impl Ingestor {
    pub fn new(registry: FormatRegistry) -> Self {
        Self::with_config(registry, StreamingConfig::default())
    }

    pub fn with_config(registry: FormatRegistry, config: StreamingConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    fn detector(&self) -> FormatDetector {
        FormatDetector::new(self.registry.clone()).with_default(&self.config.default_format)
    }

    /// Open `path` and build its table.
    ///
    /// Only an unopenable or unreadable file fails; a file with no parseable
    /// line yields an empty table.
    pub fn ingest_path(&self, path: &Path, selector: &FormatSelector) -> Result<RecordTable, AnalyzerError> {
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| AnalyzerError::io("open", &source, &e))?;
        let reader = BufReader::with_capacity(self.config.buffer_size, file);

        tracing::info!(path = %source, format = %selector, "ingesting log file");
        self.ingest_reader(reader, selector, &source)
    }

    /// Sample a file and report which grammar it looks like, without parsing it
    pub fn detect_path(&self, path: &Path) -> Result<Detection, AnalyzerError> {
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| AnalyzerError::io("open", &source, &e))?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let sample = read_sample(&mut reader, self.config.sample_size)
            .map_err(|e| AnalyzerError::io("read", &source, &e))?;
        Ok(self.detector().detect(&sample))
    }

    /// Build a table from any seekable reader; `source` labels errors and logs
    pub fn ingest_reader<R: BufRead + Seek>(
        &self,
        mut reader: R,
        selector: &FormatSelector,
        source: &str,
    ) -> Result<RecordTable, AnalyzerError> {
        let read_error = |e: std::io::Error| AnalyzerError::io("read", source, &e);

        let (name, detected) = match selector {
            FormatSelector::Named(name) => (name.clone(), None),
            FormatSelector::Auto => {
                let sample = read_sample(&mut reader, self.config.sample_size).map_err(read_error)?;
                reader.seek(SeekFrom::Start(0)).map_err(read_error)?;
                let detection = self.detector().detect(&sample);
                (detection.format.clone(), Some(detection.format))
            }
        };

        let format = self.registry.resolve(&name)?;

        let mut stats = IngestStats::default();
        let mut records = Vec::new();
        let mut buf = Vec::new();
        let mut line = String::new();

        while next_line(&mut reader, &mut buf, &mut line).map_err(read_error)? {
            match format.parse_line(&line) {
                Some(record) => {
                    stats.record_parsed(&record);
                    records.push(record);
                }
                None => stats.record_dropped(),
            }
        }

        tracing::info!(
            source = %source,
            format = %name,
            lines_read = stats.lines_read,
            lines_parsed = stats.lines_parsed,
            lines_dropped = stats.lines_dropped,
            estimated_timestamps = stats.estimated_timestamps,
            "ingestion finished"
        );
        if stats.estimated_timestamps > 0 {
            tracing::debug!(
                source = %source,
                count = stats.estimated_timestamps,
                "timestamps substituted with ingestion time; hourly and daily usage include them"
            );
        }

        Ok(RecordTable::new(records, name, detected, stats))
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(FormatRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const DETAILED: &str = r#"192.168.1.254 maxwell "GET http://detectportal.firefox.com/canonical.html HTTP/1.1" 502 4014 "Mozilla/5.0" TCP_MISS:HIER_NONE"#;
    const COMMON: &str = r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET http://a.com/x.gif HTTP/1.0" 200 2326"#;

    fn ingest(text: &str, selector: &str) -> Result<RecordTable, AnalyzerError> {
        Ingestor::default().ingest_reader(
            Cursor::new(text.as_bytes().to_vec()),
            &selector.parse().unwrap(),
            "memory",
        )
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("auto".parse::<FormatSelector>().unwrap(), FormatSelector::Auto);
        assert_eq!("AUTO".parse::<FormatSelector>().unwrap(), FormatSelector::Auto);
        assert_eq!(
            "common".parse::<FormatSelector>().unwrap(),
            FormatSelector::Named("common".to_string())
        );
        assert_eq!(FormatSelector::Named("custom".to_string()).to_string(), "custom");
    }

    #[test]
    fn test_auto_detection_reads_whole_file() {
        let text = format!("{}\n{}\n\n{}\r\n", COMMON, COMMON, COMMON);
        let table = ingest(&text, "auto").unwrap();
        assert_eq!(table.detected_format(), Some("common"));
        assert_eq!(table.format(), "common");
        // Sampled lines are parsed too
        assert_eq!(table.len(), 3);
        assert_eq!(table.stats().lines_read, 4);
        assert_eq!(table.stats().lines_dropped, 1);
    }

    #[test]
    fn test_explicit_format_skips_detection() {
        let text = format!("{}\n{}\n", DETAILED, COMMON);
        let table = ingest(&text, "detailed").unwrap();
        assert_eq!(table.detected_format(), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.stats().estimated_timestamps, 1);
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        assert!(matches!(
            ingest(DETAILED, "nginx"),
            Err(AnalyzerError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn test_unmatched_file_is_empty_table() {
        let table = ingest("nothing\nmatches\nhere\n", "auto").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.detected_format(), Some(DEFAULT_FORMAT));
        assert_eq!(table.stats().lines_read, 3);
        assert_eq!(table.stats().lines_dropped, 3);
    }

    #[test]
    fn test_empty_input() {
        let table = ingest("", "auto").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.stats().lines_read, 0);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        assert_eq!(decode_permissive(b"ab\xffcd"), "abcd");
        assert_eq!(decode_permissive("ñandú".as_bytes()), "ñandú");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"127.0.0.1 - fr\xfeank [10/Oct/2000:13:55:36 -0700] \"GET http://a.com/ HTTP/1.0\" 200 5\n");
        let table = Ingestor::default()
            .ingest_reader(Cursor::new(bytes), &FormatSelector::Auto, "memory")
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].record.user.as_deref(), Some("frank"));
    }

    #[test]
    fn test_read_sample_stops_at_count() {
        let mut reader = Cursor::new(b"a\nb\nc\n".to_vec());
        assert_eq!(read_sample(&mut reader, 2).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_ingest_path_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", COMMON).unwrap();
        writeln!(file, "{}", COMMON).unwrap();
        file.flush().unwrap();

        let ingestor = Ingestor::default();
        let table = ingestor.ingest_path(file.path(), &FormatSelector::Auto).unwrap();
        assert_eq!(table.len(), 2);

        let detection = ingestor.detect_path(file.path()).unwrap();
        assert_eq!(detection.format, "common");

        let missing = ingestor.ingest_path(Path::new("/definitely/not/here.log"), &FormatSelector::Auto);
        assert!(matches!(missing, Err(AnalyzerError::Io { .. })));
    }
}
