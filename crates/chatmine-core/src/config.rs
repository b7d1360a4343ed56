//! Tuning constants and run configuration.
//!
//! Every threshold and boost used by the extraction stages is a named
//! constant here so tests and callers reference the same values.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Minimum messages on each side of a context window.
pub const MIN_CONTEXT_MESSAGES: usize = 2;
/// Minimum accumulated characters on each side of a context window.
pub const MIN_CONTEXT_CHARS: usize = 280;

/// Candidates below this confidence are dropped by the heuristic matcher.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;
/// Base confidence for caller-supplied activity patterns.
pub const ADDITIONAL_PATTERN_CONFIDENCE: f64 = 0.7;
/// Added to regex matches whose text mentions an activity keyword.
pub const REGEX_KEYWORD_BOOST: f64 = 0.15;
/// Added to URL matches whose text contains a suggestion phrase.
pub const URL_SUGGESTION_BOOST: f64 = 0.25;
/// Added to URL matches whose text mentions an activity keyword.
pub const URL_KEYWORD_BOOST: f64 = 0.10;
/// Upper bound for every boosted confidence.
pub const MAX_CONFIDENCE: f64 = 1.0;

pub const DEFAULT_TOP_K: usize = 500;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.4;

/// Largest message-id distance that still keeps two candidates in one group.
pub const DEFAULT_PROXIMITY_GAP: u64 = 5;
/// Candidates per classifier request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Provider-imposed maximum inputs per embedding request.
pub const EMBEDDING_BATCH_LIMIT: usize = 2048;
/// Embedding requests in flight at once.
pub const DEFAULT_EMBEDDING_CONCURRENCY: usize = 10;
/// Message text is cut to this many characters before embedding.
pub const MAX_EMBEDDING_INPUT_CHARS: usize = 8000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";

/// Options for the heuristic matcher and the agreement deduplicator.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub min_confidence: f64,
    /// Tried only when no built-in activity pattern matches.
    pub additional_patterns: Vec<Regex>,
    /// Checked alongside the built-in exclusions.
    pub additional_exclusions: Vec<Regex>,
    pub include_url_based: bool,
    pub skip_agreement_deduplication: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            additional_patterns: Vec::new(),
            additional_exclusions: Vec::new(),
            include_url_based: true,
            skip_agreement_deduplication: false,
        }
    }
}

/// Grouping and packing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchingOptions {
    pub proximity_gap: u64,
    pub max_batch_size: usize,
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            proximity_gap: DEFAULT_PROXIMITY_GAP,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Nearest-neighbour search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_min_similarity() -> f64 {
    DEFAULT_MIN_SIMILARITY
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.into()
}
fn default_base_url() -> String {
    DEFAULT_EMBEDDING_BASE_URL.into()
}
fn default_batch_size() -> usize {
    EMBEDDING_BATCH_LIMIT
}
fn default_concurrency() -> usize {
    DEFAULT_EMBEDDING_CONCURRENCY
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            batch_size: EMBEDDING_BATCH_LIMIT,
            concurrency: DEFAULT_EMBEDDING_CONCURRENCY,
        }
    }
}

/// On-disk run configuration (JSON). Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default)]
    pub additional_patterns: Vec<String>,
    #[serde(default)]
    pub additional_exclusions: Vec<String>,
    #[serde(default = "default_true")]
    pub include_url_based: bool,
    #[serde(default)]
    pub skip_agreement_deduplication: bool,
    #[serde(default = "default_gap")]
    pub proximity_gap: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default)]
    pub semantic: SemanticSearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}
fn default_true() -> bool {
    true
}
fn default_gap() -> u64 {
    DEFAULT_PROXIMITY_GAP
}
fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            additional_patterns: Vec::new(),
            additional_exclusions: Vec::new(),
            include_url_based: true,
            skip_agreement_deduplication: false,
            proximity_gap: DEFAULT_PROXIMITY_GAP,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            semantic: SemanticSearchConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load config from a JSON file, falling back to defaults when the file
    /// is missing and to `OPENAI_API_KEY` for the embedding key.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => {
                let parsed: ExtractorConfig = serde_json::from_str(&raw)?;
                info!("Loaded extractor config from {}", path.display());
                parsed
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                ExtractorConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        if config.embedding.api_key.is_none() {
            config.embedding.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        Ok(config)
    }

    /// Reject out-of-range parameters before they reach the algorithms.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidOptions(format!(
                "minConfidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.max_batch_size == 0 {
            return Err(Error::InvalidOptions("maxBatchSize must be positive".into()));
        }
        if self.semantic.top_k == 0 {
            return Err(Error::InvalidOptions("topK must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&self.semantic.min_similarity) {
            return Err(Error::InvalidOptions(format!(
                "minSimilarity must be within [-1, 1], got {}",
                self.semantic.min_similarity
            )));
        }
        if self.embedding.batch_size == 0 || self.embedding.concurrency == 0 {
            return Err(Error::InvalidOptions(
                "embedding batchSize and concurrency must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Validate and compile caller-supplied patterns.
    pub fn extractor_options(&self) -> Result<ExtractorOptions> {
        self.validate()?;
        Ok(ExtractorOptions {
            min_confidence: self.min_confidence,
            additional_patterns: compile_patterns(&self.additional_patterns)?,
            additional_exclusions: compile_patterns(&self.additional_exclusions)?,
            include_url_based: self.include_url_based,
            skip_agreement_deduplication: self.skip_agreement_deduplication,
        })
    }

    pub fn batching_options(&self) -> BatchingOptions {
        BatchingOptions {
            proximity_gap: self.proximity_gap,
            max_batch_size: self.max_batch_size,
        }
    }
}

/// Compile user patterns case-insensitively, matching the built-in tables.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(Error::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.min_confidence, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.semantic.top_k, DEFAULT_TOP_K);
        assert!(config.include_url_based);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"minConfidence": 0.6, "additionalPatterns": ["road ?trip"], "semantic": {"topK": 50}}"#,
        )
        .unwrap();

        let config = ExtractorConfig::load(&path).unwrap();
        assert_eq!(config.min_confidence, 0.6);
        assert_eq!(config.semantic.top_k, 50);
        assert_eq!(config.semantic.min_similarity, DEFAULT_MIN_SIMILARITY);
        assert_eq!(config.proximity_gap, DEFAULT_PROXIMITY_GAP);

        let options = config.extractor_options().unwrap();
        assert_eq!(options.additional_patterns.len(), 1);
        assert!(options.additional_patterns[0].is_match("ROAD TRIP this summer"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let config = ExtractorConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidOptions(_))));

        let config = ExtractorConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractorConfig {
            additional_patterns: vec!["(unclosed".into()],
            ..Default::default()
        };
        assert!(matches!(config.extractor_options(), Err(Error::Pattern(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ExtractorConfig::load(&path), Err(Error::Json(_))));
    }
}
