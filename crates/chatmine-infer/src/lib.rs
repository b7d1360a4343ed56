//! chatmine infer — embedding providers, batched dispatch, embedding cache.
//!
//! `EmbeddingDispatcher` sits between the extraction pipeline and an
//! `EmbeddingProvider`: it caches by text, splits work into provider-sized
//! batches and keeps a bounded number of requests in flight.

pub mod cache;
pub mod dispatch;
pub mod openai;
pub mod provider;

pub use cache::EmbeddingCache;
pub use dispatch::EmbeddingDispatcher;
pub use openai::OpenAiEmbedder;
pub use provider::EmbeddingProvider;
