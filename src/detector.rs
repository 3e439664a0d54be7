use crate::registry::{FormatRegistry, DEFAULT_FORMAT};
use serde::{Deserialize, Serialize};

/// Number of leading lines sampled for detection
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// How many sample lines a single grammar matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatScore {
    pub format: String,
    pub matches: usize,
}

/// Outcome of scoring a sample against every registered grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Selected grammar name
    pub format: String,
    /// Scores in registry order
    pub scores: Vec<FormatScore>,
    pub sample_size: usize,
    /// True when nothing matched and the default was used
    pub fallback: bool,
}

impl Detection {
    /// Share of the sample the selected grammar matched, 0.0 to 1.0
    pub fn confidence(&self) -> f64 {
        if self.sample_size == 0 || self.fallback {
            return 0.0;
        }
        let matches = self
            .scores
            .iter()
            .find(|s| s.format == self.format)
            .map(|s| s.matches)
            .unwrap_or(0);
        matches as f64 / self.sample_size as f64
    }
}

/// Picks the grammar that best explains a sample of lines
#[derive(Debug, Clone)]
pub struct FormatDetector {
    registry: FormatRegistry,
    default_format: String,
}

impl FormatDetector {
    pub fn new(registry: FormatRegistry) -> Self {
        Self {
            registry,
            default_format: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Grammar to fall back on when nothing in the sample matches
    pub fn with_default(mut self, name: &str) -> Self {
        self.default_format = name.to_string();
        self
    }

    /// Score each grammar by how many sample lines it matches.
    ///
    /// The highest count wins and ties go to the earliest registered grammar.
    /// With no matches at all the default is returned and a warning logged.
    pub fn detect<S: AsRef<str>>(&self, sample: &[S]) -> Detection {
        let lines: Vec<&str> = sample.iter().map(|line| line.as_ref()).collect();
        let scores: Vec<FormatScore> = self
            .registry
            .iter()
            .map(|format| FormatScore {
                format: format.name().to_string(),
                matches: lines.iter().filter(|line| format.detect_pattern(line)).count(),
            })
            .collect();

        let mut best: Option<&FormatScore> = None;
        for score in &scores {
            if score.matches > best.map(|b| b.matches).unwrap_or(0) {
                best = Some(score);
            }
        }

        match best {
            Some(best) => {
                let detection = Detection {
                    format: best.format.clone(),
                    scores: scores.clone(),
                    sample_size: sample.len(),
                    fallback: false,
                };
                tracing::info!(
                    format = %detection.format,
                    matches = best.matches,
                    sample_size = sample.len(),
                    "log format detected"
                );
                detection
            }
            None => {
                tracing::warn!(
                    default = %self.default_format,
                    sample_size = sample.len(),
                    "no known log format matched the sample, using default"
                );
                Detection {
                    format: self.default_format.clone(),
                    scores,
                    sample_size: sample.len(),
                    fallback: true,
                }
            }
        }
    }
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(FormatRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAILED: &str = r#"192.168.1.254 maxwell "GET http://detectportal.firefox.com/canonical.html HTTP/1.1" 502 4014 "Mozilla/5.0" TCP_MISS:HIER_NONE"#;
    const COMMON: &str = r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET http://a.com/x.gif HTTP/1.0" 200 2326"#;
    const NATIVE: &str = "1157689324.156   1372 10.0.0.1 TCP_MISS/200 399 GET http://www.google.com/ - DIRECT/66.102.9.147 text/html";
    const CUSTOM: &str = r#"192.168.10.5 jdoe http://cdn.example.net/app.js [15/Mar/2024:09:12:45 -0300] 51234 TCP_MISS/200 GET application/javascript "Mozilla/5.0""#;
    const CUSTOM_NEW: &str = r#"10.20.30.40 - http://files.example.org/ [02/Apr/2024:22:01:09 +0200] 403 TCP_DENIED/HIER_NONE GET text/html "Wget/1.21""#;

    #[test]
    fn test_each_builtin_is_detected() {
        let detector = FormatDetector::default();
        for (line, expected) in [
            (DETAILED, "detailed"),
            (COMMON, "common"),
            (NATIVE, "squid_native"),
            (CUSTOM, "custom"),
            (CUSTOM_NEW, "custom_new"),
        ] {
            let detection = detector.detect(&[line, line, line]);
            assert_eq!(detection.format, expected, "line: {}", line);
            assert!(!detection.fallback);
        }
    }

    #[test]
    fn test_majority_wins_over_noise() {
        let detector = FormatDetector::default();
        let sample = [COMMON, "garbage", NATIVE, NATIVE, ""];
        let detection = detector.detect(&sample);
        assert_eq!(detection.format, "squid_native");
        assert!((detection.confidence() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let detector = FormatDetector::default();
        let detection = detector.detect(&[COMMON, DETAILED]);
        assert_eq!(detection.format, "detailed");
    }

    #[test]
    fn test_empty_and_unmatched_samples_fall_back() {
        let detector = FormatDetector::default();
        let empty: [&str; 0] = [];
        let detection = detector.detect(&empty);
        assert_eq!(detection.format, DEFAULT_FORMAT);
        assert!(detection.fallback);
        assert_eq!(detection.confidence(), 0.0);

        let detection = detector.detect(&["nothing to see", "here"]);
        assert_eq!(detection.format, DEFAULT_FORMAT);
        assert!(detection.fallback);
        assert!(detection.scores.iter().all(|s| s.matches == 0));
    }

    #[test]
    fn test_custom_default() {
        let detector = FormatDetector::default().with_default("common");
        assert_eq!(detector.detect(&["???"]).format, "common");
    }
}
