use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::events::SingleTimePolicy;
use crate::pipeline::EventSource;

/// Heading keywords that switch the line normalizer into verbatim mode.
pub const DEFAULT_HEADING_KEYWORDS: &[&str] =
    &["DETAILS", "DAILY", "WORKING", "DATE", "HOURS", "OF"];

/// Default length of document excerpts in summary records.
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Matched case-insensitively against the start of each line.
    #[serde(default = "default_heading_keywords")]
    pub heading_keywords: Vec<String>,
}

fn default_heading_keywords() -> Vec<String> {
    DEFAULT_HEADING_KEYWORDS.iter().map(|k| (*k).to_string()).collect()
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            heading_keywords: default_heading_keywords(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub single_time_policy: SingleTimePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub event_source: EventSource,
    /// Attach entity annotations to parsed events.
    #[serde(default)]
    pub tag_entities: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

const fn default_excerpt_chars() -> usize {
    DEFAULT_EXCERPT_CHARS
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults with `PORTLOG_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(keywords) = lookup("PORTLOG_HEADING_KEYWORDS") {
            self.normalizer.heading_keywords = keywords
                .split(',')
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect();
        }

        if let Some(policy) = lookup("PORTLOG_SINGLE_TIME_POLICY") {
            self.parser.single_time_policy = policy.parse()?;
        }

        if let Some(source) = lookup("PORTLOG_EVENT_SOURCE") {
            self.enrichment.event_source = source.parse()?;
        }

        if let Some(flag) = lookup("PORTLOG_TAG_ENTITIES") {
            self.enrichment.tag_entities = flag == "1" || flag.eq_ignore_ascii_case("true");
        }

        if let Some(chars) = lookup("PORTLOG_EXCERPT_CHARS") {
            self.schema.excerpt_chars = chars
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORTLOG_EXCERPT_CHARS: {chars}")))?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalizer.heading_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::Config("heading keywords must not be empty".into()));
        }
        if self.schema.excerpt_chars == 0 {
            return Err(Error::Config("excerpt_chars must be greater than zero".into()));
        }
        Ok(())
    }
}
