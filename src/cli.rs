use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "squidlog")]
#[command(author, version, about = "Multi-format Squid access log analyzer")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ./squidlog.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. "info" or "squidlog=debug"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Diagnostic output style on stderr
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Usage report: summary, rankings and histograms
    Report(ReportArgs),

    /// Drill down into a single user's traffic
    User(UserArgs),

    /// Show how well each known format matches a file
    Detect(DetectArgs),

    /// Print normalized records
    Parse(ParseArgs),

    /// List registered log formats
    Formats,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Log files to analyze (supports glob patterns; default: configured log path)
    pub files: Vec<PathBuf>,

    /// Log format name, or "auto" to detect
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Only the last N days, today included
    #[arg(long, short = 'd', conflicts_with = "since")]
    pub days: Option<u32>,

    /// First day to include (e.g. "2024-03-01", "3 days ago")
    #[arg(long)]
    pub since: Option<String>,

    /// Last day to include
    #[arg(long)]
    pub until: Option<String>,

    /// Number of users to rank (default: from config)
    #[arg(long)]
    pub top_users: Option<usize>,

    /// Number of sites to rank (default: from config)
    #[arg(long)]
    pub top_sites: Option<usize>,

    /// Leave out records whose timestamp had to be estimated
    #[arg(long)]
    pub exclude_estimated: bool,

    /// Also write the report as JSON into the configured reports directory
    #[arg(long)]
    pub save: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct UserArgs {
    /// Log file to analyze
    #[arg(required = true)]
    pub file: PathBuf,

    /// User to report on
    #[arg(required = true)]
    pub username: String,

    /// Log format name, or "auto" to detect
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct DetectArgs {
    /// Log file to sample
    #[arg(required = true)]
    pub file: PathBuf,

    /// Number of leading lines to sample (default: from config)
    #[arg(long, short = 's')]
    pub sample: Option<usize>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Log file to parse
    #[arg(required = true)]
    pub file: PathBuf,

    /// Log format name, or "auto" to detect
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Maximum number of records
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
