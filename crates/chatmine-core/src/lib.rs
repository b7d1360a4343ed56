//! chatmine core — data model, error taxonomy, tuning constants, configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BatchingOptions, EmbeddingConfig, ExtractorConfig, ExtractorOptions, SemanticSearchConfig,
};
pub use error::{EmbeddingError, EmbeddingErrorKind, Error, Result};
pub use types::*;
