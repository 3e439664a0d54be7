use clap::Parser;
use colored::*;
use squidlog::cli::{Cli, Commands};
use squidlog::commands::output::finish;
use squidlog::commands::{run_detect, run_formats, run_parse, run_report, run_user};
use squidlog::config::AnalyzerConfig;
use squidlog::logging::init_logging;
use tracing::{debug, info};

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AnalyzerConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging)?;

    match AnalyzerConfig::locate(cli.config.as_deref()) {
        Some(file) => info!(config_file = %file.display(), "loaded configuration from file"),
        None => debug!("no configuration file found, using defaults"),
    }

    match cli.command {
        Commands::Report(args) => run_report(args, &config)?,
        Commands::User(args) => run_user(args, &config)?,
        Commands::Detect(args) => run_detect(args, &config)?,
        Commands::Parse(args) => run_parse(args, &config)?,
        Commands::Formats => run_formats(&config)?,
    }

    finish()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
