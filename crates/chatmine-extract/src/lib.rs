//! chatmine extract — decides which chat messages go to the activity
//! classifier, and in which batches.
//!
//! Stages, leaves first: context windows, heuristic matching, semantic
//! matching, candidate merge, agreement dedup, proximity grouping, batching.
//! Everything here is pure and synchronous.

pub mod batching;
pub mod context;
pub mod dedup;
pub mod grouping;
pub mod heuristics;
pub mod merge;
pub mod pipeline;
pub mod semantic;

#[cfg(test)]
mod test_support;

pub use batching::{batch_candidates, create_batches};
pub use context::{compute_window, is_in_window};
pub use dedup::{deduplicate_agreements, DedupResult};
pub use grouping::group_by_proximity;
pub use heuristics::{match_heuristics, HeuristicResult};
pub use merge::{merge, CandidateIndex};
pub use pipeline::{ExtractionOutput, ExtractionPipeline, ExtractionStats, SemanticInput};
pub use semantic::{cosine_similarity, default_queries, find_semantic_candidates};
