use crate::analyzer::SquidAnalyzer;
use crate::cli::{OutputFormat, ParseArgs};
use crate::commands::output::{print_records, write_csv_rows, write_json};
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::ingest::FormatSelector;
use crate::models::LogRecord;
use chrono::{DateTime, Duration, Local, NaiveDate};
use glob::glob;
use std::io::stdout;
use std::path::{Path, PathBuf};

pub fn run_parse(args: ParseArgs, config: &AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let selector = resolve_selector(args.format.as_deref(), config);
    let table = analyzer_for(&args.file, selector, config)?.load()?;

    let limit = args.limit.unwrap_or(usize::MAX);
    let records: Vec<&LogRecord> = table.records().take(limit).collect();

    match args.output {
        OutputFormat::Table => print_records(&records),
        OutputFormat::Json => write_json(&records)?,
        OutputFormat::Csv => write_csv_rows(&mut stdout().lock(), &records)?,
    }

    let stats = table.stats();
    eprintln!(
        "{} of {} lines parsed with '{}' ({:.1}%)",
        stats.lines_parsed,
        stats.lines_read,
        table.format(),
        stats.parse_rate()
    );
    Ok(())
}

/// Command-line format wins over the configured one
pub fn resolve_selector(format: Option<&str>, config: &AnalyzerConfig) -> FormatSelector {
    match format {
        Some(name) => FormatSelector::from(name.to_string()),
        None => config.format.clone(),
    }
}

pub fn analyzer_for(
    path: &Path,
    selector: FormatSelector,
    config: &AnalyzerConfig,
) -> Result<SquidAnalyzer, AnalyzerError> {
    SquidAnalyzer::new(path, selector).with_config(config)
}

pub fn expand_globs(patterns: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') || pattern_str.contains('[') {
            for entry in glob(&pattern_str)? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}

/// Day named by `YYYY-MM-DD`, RFC 3339, or a relative duration like "3 days ago"
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    if let Ok(duration) = humantime::parse_duration(s.trim_end_matches(" ago")) {
        let now = Local::now();
        return Some((now - Duration::from_std(duration).ok()?).date_naive());
    }

    None
}

/// Inclusive date bounds for a report; `days` counts back from today
pub fn date_window(
    days: Option<u32>,
    since: Option<&str>,
    until: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), Box<dyn std::error::Error>> {
    let parse = |value: &str| {
        parse_date(value).ok_or_else(|| format!("unrecognized date '{}'", value))
    };

    let start = match (days, since) {
        (Some(days), _) => {
            let today = Local::now().date_naive();
            Some(today - Duration::days(i64::from(days.saturating_sub(1))))
        }
        (None, Some(since)) => Some(parse(since)?),
        (None, None) => None,
    };
    let end = until.map(parse).transpose()?;

    Ok((start, end))
}
