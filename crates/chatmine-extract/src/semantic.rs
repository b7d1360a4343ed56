//! Semantic matcher — nearest-neighbour search over precomputed embeddings.
//!
//! Each query keeps its top-K messages above a similarity floor; results are
//! merged per message, keeping only the best (query, similarity) pair.

use std::collections::HashMap;

use chatmine_core::{
    CandidateMessage, CandidateSource, CandidateType, EmbeddedMessage, MessageId, ParsedMessage,
    QueryEmbedding, QueryType, Result, SemanticQuery, SemanticSearchConfig,
};
use ndarray::ArrayView1;
use tracing::{debug, info, warn};

use crate::context::compute_window;

/// Curated queries cast over the transcript. The agreement entries decide
/// which semantic hits count as agreements.
pub const DEFAULT_QUERIES: &[(&str, QueryType)] = &[
    ("we should go visit this place together", QueryType::Suggestion),
    ("let's try this activity sometime", QueryType::Suggestion),
    ("I want to go there with you", QueryType::Suggestion),
    ("this looks like a fun thing to do", QueryType::Suggestion),
    ("bucket list destination we should visit", QueryType::Suggestion),
    ("hiking trail walk nature reserve", QueryType::Activity),
    ("restaurant cafe bar food dining", QueryType::Activity),
    ("beach swimming kayaking water activities", QueryType::Activity),
    ("concert show festival event tickets", QueryType::Activity),
    ("hotel airbnb accommodation travel trip", QueryType::Place),
    ("places to visit and explore on holiday", QueryType::Place),
    ("Queenstown Rotorua Wellington adventure", QueryType::Place),
    ("New Zealand places to visit explore", QueryType::Place),
    ("yes that sounds amazing, I'm keen", QueryType::Agreement),
    ("I'd love to do that with you", QueryType::Agreement),
    ("count me in, let's book it", QueryType::Agreement),
];

/// The default query set as owned values.
pub fn default_queries() -> Vec<SemanticQuery> {
    DEFAULT_QUERIES
        .iter()
        .map(|(text, query_type)| SemanticQuery::new(*text, *query_type))
        .collect()
}

/// Cosine similarity; 0 for zero-norm or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// Top-K message hits for one query, best first (ties by ascending id).
pub fn search(
    query: &[f32],
    messages: &[EmbeddedMessage],
    config: &SemanticSearchConfig,
) -> Vec<(MessageId, f64)> {
    let mut hits: Vec<(MessageId, f64)> = messages
        .iter()
        .map(|m| (m.message_id, cosine_similarity(query, &m.embedding) as f64))
        .filter(|(_, sim)| *sim >= config.min_similarity)
        .collect();
    hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    hits.truncate(config.top_k);
    hits
}

struct BestHit<'q> {
    similarity: f64,
    query: &'q QueryEmbedding,
}

/// Run every query and turn the best hit per message into a candidate.
///
/// Output is sorted by confidence (= similarity) descending.
pub fn find_semantic_candidates(
    message_embeddings: &[EmbeddedMessage],
    query_embeddings: &[QueryEmbedding],
    messages: &[ParsedMessage],
    config: &SemanticSearchConfig,
) -> Result<Vec<CandidateMessage>> {
    let mut best: HashMap<MessageId, BestHit<'_>> = HashMap::new();

    for query in query_embeddings {
        let hits = search(&query.embedding, message_embeddings, config);
        debug!("Query {:?} matched {} messages", query.query, hits.len());
        for (message_id, similarity) in hits {
            match best.get(&message_id) {
                Some(existing) if existing.similarity >= similarity => {}
                _ => {
                    best.insert(message_id, BestHit { similarity, query });
                }
            }
        }
    }

    let positions: HashMap<MessageId, usize> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    let mut candidates = Vec::with_capacity(best.len());
    for (message_id, hit) in best {
        let Some(&index) = positions.get(&message_id) else {
            warn!("Embedding for unknown message {} skipped", message_id);
            continue;
        };
        let candidate_type = if hit.query.query_type == QueryType::Agreement {
            CandidateType::Agreement
        } else {
            CandidateType::Suggestion
        };
        candidates.push(CandidateMessage::from_message(
            &messages[index],
            CandidateSource::Semantic {
                similarity: hit.similarity,
                query: hit.query.query.clone(),
                query_type: hit.query.query_type,
            },
            hit.similarity.clamp(0.0, 1.0),
            candidate_type,
            compute_window(messages, index)?,
        ));
    }

    sort_by_confidence(&mut candidates);
    info!(
        "Semantic matching: {} queries, {} unique candidates",
        query_embeddings.len(),
        candidates.len()
    );
    Ok(candidates)
}

/// Confidence descending, ascending message id on ties.
pub fn sort_by_confidence(candidates: &mut [CandidateMessage]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(a.message_id.cmp(&b.message_id))
    });
}
