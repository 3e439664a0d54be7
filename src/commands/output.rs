use crate::aggregate::{UserDetail, DETAIL_TOP_N};
use crate::commands::report::Report;
use crate::detector::Detection;
use crate::humanize::bytes_to_human_readable;
use crate::models::LogRecord;
use colored::*;
use serde::Serialize;
use std::io::{self, stdout, Write};

const RULE_WIDTH: usize = 60;
const BAR_WIDTH: usize = 40;

pub fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// One CSV block with its own header row
pub fn write_csv_rows<W: Write, T: Serialize>(out: &mut W, rows: &[T]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Titled CSV block followed by a blank line
pub fn write_csv_section<W: Write, T: Serialize>(
    out: &mut W,
    title: &str,
    rows: &[T],
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(out, "# {}", title)?;
    write_csv_rows(&mut *out, rows)?;
    writeln!(out)?;
    Ok(())
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (value as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len)
}

fn print_banner(title: &str) {
    println!("\n{}", "═".repeat(RULE_WIDTH).cyan());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(RULE_WIDTH).cyan());
}

fn print_heading(title: &str) {
    println!("\n{}:", title.cyan().bold());
}

fn colored_status(code: u16) -> ColoredString {
    let text = code.to_string();
    match code {
        200..=299 => text.green(),
        300..=399 => text.cyan(),
        400..=499 => text.yellow(),
        500..=599 => text.red(),
        _ => text.dimmed(),
    }
}

pub fn print_report(report: &Report) {
    print_banner(&report.title);
    println!("Source:           {}", report.source.white().bold());
    let format = match &report.detected_format {
        Some(detected) => format!("{} (detected)", detected),
        None => report.format.clone(),
    };
    println!("Format:           {}", format);
    if let Some(range) = &report.date_range {
        println!(
            "Period:           {} to {}",
            range.start.format("%Y-%m-%d %H:%M:%S"),
            range.end.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!(
        "Lines parsed:     {} of {} ({:.1}%)",
        report.ingest.lines_parsed.to_string().green(),
        report.ingest.lines_read,
        report.ingest.parse_rate()
    );
    if report.ingest.estimated_timestamps > 0 {
        println!(
            "Estimated times:  {}",
            report.ingest.estimated_timestamps.to_string().yellow()
        );
    }

    print_heading("Summary");
    println!("  Requests:       {}", report.summary.total_requests.to_string().white().bold());
    println!("  Traffic:        {}", bytes_to_human_readable(report.summary.total_bytes).white().bold());
    println!("  Users:          {}", report.summary.unique_users);
    println!("  Client IPs:     {}", report.summary.unique_ips);

    if !report.top_users.is_empty() {
        print_heading("Top Users");
        let max = report.top_users.first().map(|u| u.traffic).unwrap_or(0);
        for user in &report.top_users {
            println!(
                "  {:24} {:>12} {:>8} req {}",
                user.user,
                user.traffic_readable,
                user.requests,
                bar(user.traffic, max).green()
            );
        }
    }

    if !report.top_sites.is_empty() {
        print_heading("Top Sites");
        let max = report.top_sites.first().map(|d| d.visits as u64).unwrap_or(0);
        for site in &report.top_sites {
            println!(
                "  {:40} {:>8} {:>12} {}",
                site.domain,
                site.visits,
                site.traffic_readable,
                bar(site.visits as u64, max).blue()
            );
        }
    }

    if !report.hourly_usage.is_empty() {
        print_heading("Hourly Usage");
        let max = report.hourly_usage.iter().map(|h| h.requests as u64).max().unwrap_or(0);
        for hour in &report.hourly_usage {
            println!(
                "  {:02}:00 {:>8} {:>12} {}",
                hour.hour,
                hour.requests,
                bytes_to_human_readable(hour.traffic),
                bar(hour.requests as u64, max).blue()
            );
        }
    }

    if !report.daily_usage.is_empty() {
        print_heading("Daily Usage");
        let max = report.daily_usage.iter().map(|d| d.requests as u64).max().unwrap_or(0);
        for day in &report.daily_usage {
            println!(
                "  {:10} {:>8} {:>12} {}",
                day.day_of_week,
                day.requests,
                bytes_to_human_readable(day.traffic),
                bar(day.requests as u64, max).blue()
            );
        }
    }

    if !report.status_codes.is_empty() {
        print_heading("Status Codes");
        let total = report.summary.total_requests.max(1);
        for status in &report.status_codes {
            println!(
                "  {} {:32} {:>8} ({:5.1}%)",
                colored_status(status.status_code),
                status.description,
                status.count,
                (status.count as f64 / total as f64) * 100.0
            );
        }
    }

    if !report.content_types.is_empty() {
        print_heading("Content Types");
        let total = report.summary.total_requests.max(1);
        for content in &report.content_types {
            println!(
                "  {:14} {:>8} ({:5.1}%)",
                content.content_type.to_string(),
                content.count,
                (content.count as f64 / total as f64) * 100.0
            );
        }
    }
}

pub fn print_user_detail(detail: &UserDetail) {
    print_banner(&format!("USER {}", detail.username));
    println!("Requests:         {}", detail.total_requests.to_string().white().bold());
    println!("Traffic:          {}", detail.traffic_readable.white().bold());
    println!("Average response: {}", detail.avg_response_readable);
    println!("Success rate:     {}", format!("{:.1}%", detail.success_rate).green());
    println!("Error rate:       {}", format!("{:.1}%", detail.error_rate).red());

    print_heading(&format!("Top {} Domains", DETAIL_TOP_N));
    for entry in &detail.top_domains {
        println!("  {:48} {:>8}", entry.value, entry.visits);
    }

    print_heading(&format!("Top {} URLs", DETAIL_TOP_N));
    for entry in &detail.top_urls {
        println!("  {:72} {:>8}", entry.value, entry.visits);
    }

    print_heading("Status Codes");
    for status in &detail.status_codes {
        println!(
            "  {} {:32} {:>8}",
            colored_status(status.status_code),
            status.description,
            status.count
        );
    }

    print_heading("Content Types");
    for content in &detail.content_types {
        println!("  {:14} {:>8}", content.content_type.to_string(), content.count);
    }
}

pub fn print_detection(source: &str, detection: &Detection) {
    print_banner("FORMAT DETECTION");
    println!("File:             {}", source.white().bold());
    println!("Lines sampled:    {}", detection.sample_size);
    if detection.fallback {
        println!(
            "Selected:         {} {}",
            detection.format.yellow().bold(),
            "(no match, default)".dimmed()
        );
    } else {
        println!(
            "Selected:         {} ({:.0}% of sample)",
            detection.format.green().bold(),
            detection.confidence() * 100.0
        );
    }

    print_heading("Scores");
    let max = detection.sample_size as u64;
    for score in &detection.scores {
        let name = if score.format == detection.format {
            score.format.green().bold()
        } else {
            score.format.normal()
        };
        println!(
            "  {:16} {:>4} {}",
            name,
            score.matches,
            bar(score.matches as u64, max).blue()
        );
    }
}

pub fn print_records(records: &[&LogRecord]) {
    println!("{}", "─".repeat(100).dimmed());
    for record in records {
        let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let timestamp = if record.timestamp_estimated {
            timestamp.dimmed()
        } else {
            timestamp.cyan()
        };
        println!(
            "{} {:15} {:12} {} {:7} {:>10} {}",
            timestamp,
            record.client_ip,
            record.user.as_deref().unwrap_or("-"),
            colored_status(record.status_code),
            record.method,
            bytes_to_human_readable(record.size),
            record.url
        );
    }
}

/// Flush stdout, ignoring a closed pipe
pub fn finish() -> io::Result<()> {
    match stdout().flush() {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::StatusCount;

    #[test]
    fn test_bar_scales_to_width() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5, 10).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(0, 10), "");
    }

    #[test]
    fn test_csv_section_has_title_and_header() {
        let rows = vec![
            StatusCount { status_code: 200, count: 3, description: "OK".to_string() },
            StatusCount { status_code: 404, count: 1, description: "Not Found".to_string() },
        ];
        let mut buffer = Vec::new();
        write_csv_section(&mut buffer, "status_codes", &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# status_codes");
        assert_eq!(lines[1], "status_code,count,description");
        assert_eq!(lines[2], "200,3,OK");
        assert_eq!(lines[3], "404,1,Not Found");
        assert_eq!(lines[4], "");
    }
}
