use crate::cli::{DetectArgs, OutputFormat};
use crate::commands::output::{print_detection, write_csv_rows, write_json};
use crate::commands::parse::analyzer_for;
use crate::config::AnalyzerConfig;
use crate::ingest::FormatSelector;
use std::io::stdout;

pub fn run_detect(args: DetectArgs, config: &AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut streaming = config.streaming.clone();
    if let Some(sample) = args.sample {
        if sample == 0 {
            return Err("--sample must be greater than zero".into());
        }
        streaming.sample_size = sample;
    }

    let detection = analyzer_for(&args.file, FormatSelector::Auto, config)?
        .with_streaming(streaming)
        .detect()?;

    match args.output {
        OutputFormat::Table => print_detection(&args.file.display().to_string(), &detection),
        OutputFormat::Json => write_json(&detection)?,
        OutputFormat::Csv => write_csv_rows(&mut stdout().lock(), &detection.scores)?,
    }
    Ok(())
}
