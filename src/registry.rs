use crate::error::AnalyzerError;
use crate::parsers::{
    CommonFormat, CustomFormat, CustomNewFormat, DetailedFormat, LogFormat, RegexFormat,
    RegexFormatConfig, SquidNativeFormat,
};
use std::sync::Arc;

/// Format used when detection finds no match at all
pub const DEFAULT_FORMAT: &str = "detailed";

/// Ordered set of known grammars.
///
/// Order is significant: detection breaks ties in favour of earlier entries,
/// so the built-ins always precede config-defined formats.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn LogFormat>>,
}

impl FormatRegistry {
    /// Registry holding only the built-in grammars
    pub fn builtin() -> Self {
        Self {
            formats: vec![
                Arc::new(DetailedFormat::new()),
                Arc::new(CommonFormat::new()),
                Arc::new(SquidNativeFormat::new()),
                Arc::new(CustomFormat::new()),
                Arc::new(CustomNewFormat::new()),
            ],
        }
    }

    /// Built-ins followed by config-defined regex grammars
    pub fn with_custom(configs: &[RegexFormatConfig]) -> Result<Self, AnalyzerError> {
        let mut registry = Self::builtin();
        for config in configs {
            registry = registry.register(Arc::new(RegexFormat::new(config.clone())?))?;
        }
        Ok(registry)
    }

    /// Append a grammar; names must be unique
    pub fn register(mut self, format: Arc<dyn LogFormat>) -> Result<Self, AnalyzerError> {
        if self.get(format.name()).is_some() {
            return Err(AnalyzerError::configuration(
                "formats",
                format!("duplicate format name '{}'", format.name()),
            ));
        }
        self.formats.push(format);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn LogFormat>> {
        self.formats.iter().find(|f| f.name() == name)
    }

    /// Look up a grammar or report the known names
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LogFormat>, AnalyzerError> {
        self.get(name).cloned().ok_or_else(|| AnalyzerError::UnknownFormat {
            name: name.to_string(),
            known: self.names(),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn LogFormat>> {
        self.formats.iter()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.formats.iter().map(|fmt| fmt.name())).finish()
    }
}
