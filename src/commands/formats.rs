use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use colored::*;

/// One line of the `formats` listing
#[derive(Debug, Clone, PartialEq)]
pub struct FormatEntry {
    pub name: String,
    pub shape: String,
    /// The format detection falls back to
    pub is_default: bool,
}

/// Registered formats in detection order
pub fn format_entries(config: &AnalyzerConfig) -> Result<Vec<FormatEntry>, AnalyzerError> {
    let registry = config.registry()?;
    Ok(registry
        .iter()
        .map(|format| FormatEntry {
            name: format.name().to_string(),
            shape: format.shape().to_string(),
            is_default: format.name() == config.streaming.default_format,
        })
        .collect())
}

pub fn run_formats(config: &AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Registered formats (detection order):".cyan().bold());
    for entry in format_entries(config)? {
        let name = if entry.is_default {
            format!("{} (default)", entry.name).green().bold()
        } else {
            entry.name.white().bold()
        };
        println!("  {}", name);
        println!("      {}", entry.shape.dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_FORMAT;

    fn defaults(entries: &[FormatEntry]) -> Vec<&str> {
        entries.iter().filter(|e| e.is_default).map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_marks_builtin_default() {
        let entries = format_entries(&AnalyzerConfig::default()).unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].name, "detailed");
        assert_eq!(defaults(&entries), vec![DEFAULT_FORMAT]);
    }

    #[test]
    fn test_marks_configured_default() {
        let mut config = AnalyzerConfig::default();
        config.streaming.default_format = "common".to_string();
        let entries = format_entries(&config).unwrap();
        assert_eq!(defaults(&entries), vec!["common"]);
    }
}
