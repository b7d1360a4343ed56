//! Extraction pipeline — heuristics, semantic search, merge, dedup, batching.

use chatmine_core::{
    Batch, BatchingOptions, CandidateMessage, EmbeddedMessage, ExtractorOptions, ParsedMessage,
    QueryEmbedding, Result, SemanticSearchConfig,
};
use serde::Serialize;
use tracing::info;

use crate::batching::batch_candidates;
use crate::dedup::deduplicate_agreements;
use crate::heuristics::match_heuristics;
use crate::merge::merge;
use crate::semantic::{find_semantic_candidates, sort_by_confidence};

/// Precomputed vectors for the semantic stage.
#[derive(Debug, Clone, Copy)]
pub struct SemanticInput<'a> {
    pub message_embeddings: &'a [EmbeddedMessage],
    pub query_embeddings: &'a [QueryEmbedding],
    pub config: SemanticSearchConfig,
}

/// Counters reported for each run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub regex_matches: usize,
    pub url_matches: usize,
    pub embeddings_matches: usize,
    /// Distinct candidates after merging, before agreement dedup.
    pub total_unique: usize,
    pub agreements_removed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionOutput {
    /// Final candidates, by confidence descending.
    pub candidates: Vec<CandidateMessage>,
    /// Classifier batches in ascending message-id order.
    pub batches: Vec<Batch>,
    pub stats: ExtractionStats,
}

/// Chains every extraction stage over one transcript.
#[derive(Debug, Clone, Default)]
pub struct ExtractionPipeline {
    options: ExtractorOptions,
    batching: BatchingOptions,
}

impl ExtractionPipeline {
    pub fn new(options: ExtractorOptions, batching: BatchingOptions) -> Self {
        Self { options, batching }
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Run the full pipeline. `semantic` is skipped when `None`.
    pub fn run(
        &self,
        messages: &[ParsedMessage],
        semantic: Option<SemanticInput<'_>>,
    ) -> Result<ExtractionOutput> {
        let start = std::time::Instant::now();
        let mut stats = ExtractionStats::default();

        info!("Starting extraction over {} messages", messages.len());

        // Stage 1: regex + URL heuristics
        let heuristic = match_heuristics(messages, &self.options)?;
        stats.regex_matches = heuristic.regex_match_count;
        stats.url_matches = heuristic.url_match_count;

        // Stage 2: nearest-neighbour search
        let semantic_candidates = match semantic {
            Some(input) => find_semantic_candidates(
                input.message_embeddings,
                input.query_embeddings,
                messages,
                &input.config,
            )?,
            None => Vec::new(),
        };
        stats.embeddings_matches = semantic_candidates.len();

        // Stage 3: union by message id
        let merged = merge(heuristic.candidates, semantic_candidates);
        stats.total_unique = merged.len();

        // Stage 4: drop agreements already inside a suggestion's window
        let mut candidates = if self.options.skip_agreement_deduplication {
            merged
        } else {
            let dedup = deduplicate_agreements(merged, messages)?;
            stats.agreements_removed = dedup.removed_count;
            dedup.candidates
        };
        sort_by_confidence(&mut candidates);

        // Stage 5: group and pack
        let batches = batch_candidates(
            candidates.clone(),
            self.batching.max_batch_size,
            self.batching.proximity_gap,
        );

        info!(
            "Extraction complete: regex={}, url={}, semantic={}, unique={}, agreements_removed={}, batches={}, duration={}ms",
            stats.regex_matches,
            stats.url_matches,
            stats.embeddings_matches,
            stats.total_unique,
            stats.agreements_removed,
            batches.len(),
            start.elapsed().as_millis()
        );

        Ok(ExtractionOutput {
            candidates,
            batches,
            stats,
        })
    }
}
