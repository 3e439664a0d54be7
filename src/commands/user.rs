use crate::aggregate::UserDetail;
use crate::cli::{OutputFormat, UserArgs};
use crate::commands::output::{print_user_detail, write_csv_section, write_json};
use crate::commands::parse::{analyzer_for, resolve_selector};
use crate::config::AnalyzerConfig;
use serde::Serialize;
use std::io::{stdout, Write};

/// Scalar part of a [`UserDetail`], for the CSV header block
#[derive(Debug, Serialize)]
struct UserTotals<'a> {
    username: &'a str,
    total_requests: usize,
    total_traffic: u64,
    avg_response_size: f64,
    success_rate: f64,
    error_rate: f64,
}

pub fn run_user(args: UserArgs, config: &AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let selector = resolve_selector(args.format.as_deref(), config);
    let table = analyzer_for(&args.file, selector, config)?.load()?;

    let detail = match table.user_detail(&args.username) {
        Some(detail) => detail,
        None => {
            return Err(format!(
                "no records for user '{}' in {}",
                args.username,
                args.file.display()
            )
            .into())
        }
    };

    match args.output {
        OutputFormat::Table => print_user_detail(&detail),
        OutputFormat::Json => write_json(&detail)?,
        OutputFormat::Csv => write_user_csv(&mut stdout().lock(), &detail)?,
    }
    Ok(())
}

fn write_user_csv<W: Write>(out: &mut W, detail: &UserDetail) -> Result<(), Box<dyn std::error::Error>> {
    let totals = UserTotals {
        username: &detail.username,
        total_requests: detail.total_requests,
        total_traffic: detail.total_traffic,
        avg_response_size: detail.avg_response_size,
        success_rate: detail.success_rate,
        error_rate: detail.error_rate,
    };
    write_csv_section(out, "user", &[totals])?;
    write_csv_section(out, "top_domains", &detail.top_domains)?;
    write_csv_section(out, "top_urls", &detail.top_urls)?;
    write_csv_section(out, "status_codes", &detail.status_codes)?;
    write_csv_section(out, "content_types", &detail.content_types)?;
    Ok(())
}
