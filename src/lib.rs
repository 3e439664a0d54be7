pub mod models;
pub mod error;
pub mod timestamp;
pub mod classify;
pub mod humanize;
pub mod parsers;
pub mod registry;
pub mod detector;
pub mod table;
pub mod ingest;
pub mod aggregate;
pub mod analyzer;
pub mod config;
pub mod logging;
pub mod cli;
pub mod commands;


pub use models::{ContentCategory, LogRecord, RawFields, PLACEHOLDER};
pub use error::{AnalyzerError, LineError};
pub use classify::{classify_content_type, extract_domain};
pub use humanize::bytes_to_human_readable;
pub use parsers::{
    CommonFormat, CustomFormat, CustomNewFormat, DetailedFormat, LogFormat, RegexFormat,
    RegexFormatConfig, SquidNativeFormat,
};
pub use registry::{FormatRegistry, DEFAULT_FORMAT};
pub use detector::{Detection, FormatDetector, FormatScore};
pub use table::{IngestStats, RecordTable, TableRow};
pub use ingest::{FormatSelector, Ingestor, StreamingConfig};
pub use aggregate::{
    ContentTypeCount, DailyUsage, DateRange, DomainVisits, HourlyUsage, RankedCount,
    StatusCount, Summary, UserDetail, UserTraffic,
};
pub use analyzer::SquidAnalyzer;
pub use config::{AnalyzerConfig, LoggingConfig};
