use crate::aggregate::{
    ContentTypeCount, DailyUsage, DateRange, DomainVisits, HourlyUsage, StatusCount, Summary,
    UserTraffic,
};
use crate::cli::{OutputFormat, ReportArgs};
use crate::commands::output::{print_report, write_csv_section, write_json};
use crate::commands::parse::{analyzer_for, date_window, expand_globs, resolve_selector};
use crate::config::AnalyzerConfig;
use crate::table::{IngestStats, RecordTable};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a report shows, for one log file
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub source: String,
    pub format: String,
    pub detected_format: Option<String>,
    pub generated_at: DateTime<Local>,
    /// Absent for an empty table
    pub date_range: Option<DateRange>,
    pub ingest: IngestStats,
    pub summary: Summary,
    pub top_users: Vec<UserTraffic>,
    pub top_sites: Vec<DomainVisits>,
    pub hourly_usage: Vec<HourlyUsage>,
    pub daily_usage: Vec<DailyUsage>,
    pub status_codes: Vec<StatusCount>,
    pub content_types: Vec<ContentTypeCount>,
}

/// Ranking sizes and exclusions applied when building a [`Report`]
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub max_users: usize,
    pub max_sites: usize,
    pub excluded_users: HashSet<String>,
    pub excluded_domains: HashSet<String>,
}

impl ReportOptions {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            title: config.report_title.clone(),
            max_users: config.max_users,
            max_sites: config.max_sites,
            excluded_users: config.excluded_user_set(),
            excluded_domains: config.excluded_domain_set(),
        }
    }
}

impl Report {
    pub fn build(table: &RecordTable, source: &str, options: &ReportOptions) -> Self {
        Self {
            title: options.title.clone(),
            source: source.to_string(),
            format: table.format().to_string(),
            detected_format: table.detected_format().map(str::to_string),
            generated_at: Local::now(),
            date_range: if table.is_empty() { None } else { Some(table.date_range()) },
            ingest: *table.stats(),
            summary: table.summary(),
            top_users: table.top_users(options.max_users, &options.excluded_users),
            top_sites: table.top_domains(options.max_sites, &options.excluded_domains),
            hourly_usage: table.hourly_usage(),
            daily_usage: table.daily_usage(),
            status_codes: table.status_codes(),
            content_types: table.content_types(),
        }
    }

    pub fn write_csv<W: Write>(&self, out: &mut W) -> Result<(), Box<dyn std::error::Error>> {
        write_csv_section(out, "summary", &[&self.summary])?;
        write_csv_section(out, "top_users", &self.top_users)?;
        write_csv_section(out, "top_sites", &self.top_sites)?;
        write_csv_section(out, "hourly_usage", &self.hourly_usage)?;
        write_csv_section(out, "daily_usage", &self.daily_usage)?;
        write_csv_section(out, "status_codes", &self.status_codes)?;
        write_csv_section(out, "content_types", &self.content_types)?;
        Ok(())
    }

    /// Write the report as JSON into `dir`, returning the file created
    pub fn save(&self, dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
        fs::create_dir_all(dir)?;

        let stem = Path::new(&self.source)
            .file_name()
            .map(|name| name.to_string_lossy().replace('.', "_"))
            .unwrap_or_else(|| "log".to_string());
        let path = dir.join(format!(
            "report_{}_{}.json",
            stem,
            self.generated_at.format("%Y%m%d_%H%M%S")
        ));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(path)
    }
}

pub fn run_report(args: ReportArgs, config: &AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let files = if args.files.is_empty() {
        vec![config.log_path.clone()]
    } else {
        expand_globs(&args.files)?
    };

    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let selector = resolve_selector(args.format.as_deref(), config);
    let (start, end) = date_window(args.days, args.since.as_deref(), args.until.as_deref())?;

    let mut options = ReportOptions::from_config(config);
    if let Some(max_users) = args.top_users {
        options.max_users = max_users;
    }
    if let Some(max_sites) = args.top_sites {
        options.max_sites = max_sites;
    }

    for file in &files {
        let source = file.display().to_string();
        let loaded = analyzer_for(file, selector.clone(), config)?.load()?;

        let mut table = loaded.filter_by_date(start, end);
        if args.exclude_estimated {
            table = table.without_estimated_timestamps();
        }
        info!(
            source = %source,
            records = loaded.len(),
            in_window = table.len(),
            "building report"
        );

        let report = Report::build(&table, &source, &options);
        match args.output {
            OutputFormat::Table => print_report(&report),
            OutputFormat::Json => write_json(&report)?,
            OutputFormat::Csv => report.write_csv(&mut stdout().lock())?,
        }

        if args.save {
            let path = report.save(&config.reports_dir)?;
            eprintln!("Report saved to {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogRecord, RawFields};

    fn record(user: &str, url: &str, size: &str) -> LogRecord {
        LogRecord::from_raw(RawFields {
            timestamp: Some("12/Mar/2024:10:00:00 +0000"),
            client_ip: "10.0.0.9",
            user: Some(user),
            method: Some("GET"),
            url: Some(url),
            status_code: 200,
            size: Some(size),
            ..Default::default()
        })
    }

    fn table() -> RecordTable {
        RecordTable::from_records(
            vec![
                record("alice", "http://news.example.com/", "2048"),
                record("proxy", "http://localhost/health", "10"),
                record("bob", "http://news.example.com/a.css", "512"),
            ],
            "detailed",
        )
    }

    #[test]
    fn test_build_applies_config_exclusions() {
        let options = ReportOptions::from_config(&AnalyzerConfig::default());
        let report = Report::build(&table(), "/var/log/squid/access.log", &options);

        assert_eq!(report.title, "Squid Usage Report");
        assert_eq!(report.summary.total_requests, 3);
        let users: Vec<&str> = report.top_users.iter().map(|u| u.user.as_str()).collect();
        assert_eq!(users, vec!["alice", "bob"]);
        assert_eq!(report.top_sites.len(), 1);
        assert_eq!(report.top_sites[0].domain, "news.example.com");
        assert_eq!(report.hourly_usage.len(), 24);
        assert!(report.date_range.is_some());
    }

    #[test]
    fn test_empty_table_report() {
        let options = ReportOptions::from_config(&AnalyzerConfig::default());
        let empty = RecordTable::from_records(Vec::new(), "detailed");
        let report = Report::build(&empty, "empty.log", &options);
        assert!(report.date_range.is_none());
        assert!(report.hourly_usage.is_empty());
        assert_eq!(report.summary, Summary::default());
    }

    #[test]
    fn test_csv_sections() {
        let options = ReportOptions::from_config(&AnalyzerConfig::default());
        let report = Report::build(&table(), "access.log", &options);
        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        for section in ["# summary", "# top_users", "# top_sites", "# hourly_usage", "# content_types"] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("total_requests,total_bytes,unique_users,unique_ips"));
    }

    #[test]
    fn test_save_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions::from_config(&AnalyzerConfig::default());
        let report = Report::build(&table(), "/var/log/squid/access.log", &options);

        let path = report.save(&dir.path().join("reports")).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_access_log_"));

        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["summary"]["total_requests"], 3);
        assert_eq!(saved["top_users"][0]["user"], "alice");
    }
}
