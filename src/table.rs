use crate::models::LogRecord;
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Line counters gathered while a table was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Every line read from the file, blank ones included
    pub lines_read: usize,
    /// Lines that produced a record
    pub lines_parsed: usize,
    /// Lines rejected by the grammar
    pub lines_dropped: usize,
    /// Records whose timestamp was substituted with the ingestion time
    pub estimated_timestamps: usize,
}

impl IngestStats {
    pub fn record_parsed(&mut self, record: &LogRecord) {
        self.lines_read += 1;
        self.lines_parsed += 1;
        if record.timestamp_estimated {
            self.estimated_timestamps += 1;
        }
    }

    pub fn record_dropped(&mut self) {
        self.lines_read += 1;
        self.lines_dropped += 1;
    }

    /// Parsed lines as a percentage of lines read
    pub fn parse_rate(&self) -> f64 {
        if self.lines_read == 0 {
            0.0
        } else {
            (self.lines_parsed as f64 / self.lines_read as f64) * 100.0
        }
    }
}

/// A record plus the calendar fields derived from its timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub record: LogRecord,
    pub date: NaiveDate,
    /// 0 to 23, in the timestamp's own offset
    pub hour: u32,
    pub weekday: Weekday,
}

impl TableRow {
    pub fn new(record: LogRecord) -> Self {
        let local = record.timestamp.naive_local();
        Self {
            date: local.date(),
            hour: local.hour(),
            weekday: local.weekday(),
            record,
        }
    }
}

/// Immutable, ordered set of parsed records from one log file.
///
/// Filtering never mutates a table; it returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    rows: Vec<TableRow>,
    format: String,
    detected_format: Option<String>,
    stats: IngestStats,
}

impl RecordTable {
    /// Build a table, deriving the calendar fields of every record
    pub fn new(
        records: Vec<LogRecord>,
        format: String,
        detected_format: Option<String>,
        stats: IngestStats,
    ) -> Self {
        Self {
            rows: records.into_iter().map(TableRow::new).collect(),
            format,
            detected_format,
            stats,
        }
    }

    /// Table built from records alone, as if read with `format`
    pub fn from_records(records: Vec<LogRecord>, format: &str) -> Self {
        let mut stats = IngestStats::default();
        for record in &records {
            stats.record_parsed(record);
        }
        Self::new(records, format.to_string(), None, stats)
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &LogRecord> + '_ {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Grammar the table was parsed with
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Set only when the grammar was chosen by automatic detection
    pub fn detected_format(&self) -> Option<&str> {
        self.detected_format.as_deref()
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Copy of this table keeping only rows accepted by `keep`
    pub fn retain_copy<F>(&self, keep: F) -> RecordTable
    where
        F: Fn(&TableRow) -> bool,
    {
        RecordTable {
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
            format: self.format.clone(),
            detected_format: self.detected_format.clone(),
            stats: self.stats,
        }
    }

    /// Rows whose derived date lies in `[start, end]`; a missing bound is open
    pub fn filter_by_date(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> RecordTable {
        self.retain_copy(|row| {
            start.map_or(true, |s| row.date >= s) && end.map_or(true, |e| row.date <= e)
        })
    }

    /// Rows whose timestamp was read from the log rather than substituted
    pub fn without_estimated_timestamps(&self) -> RecordTable {
        self.retain_copy(|row| !row.record.timestamp_estimated)
    }
}
