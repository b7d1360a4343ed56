//! Embedding provider trait.
//!
//! A provider turns a batch of texts into vectors with one remote call.
//! Implementations:
//! - `OpenAiEmbedder`: OpenAI-compatible `/embeddings` endpoint over HTTP
//! - test doubles in `dispatch` tests

use std::future::Future;

use chatmine_core::config::EMBEDDING_BATCH_LIMIT;
use chatmine_core::EmbeddingError;

/// Trait for embedding backends.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `texts`, returning one vector per input in the same order.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// Most inputs the provider accepts in one request.
    fn max_batch_size(&self) -> usize {
        EMBEDDING_BATCH_LIMIT
    }

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}
