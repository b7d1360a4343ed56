//! Agreement deduplication.
//!
//! An agreement ("that looks fun!") that sits inside a suggestion's context
//! window is already visible to the classifier alongside that suggestion, so
//! it is dropped.

use std::collections::HashMap;

use chatmine_core::{CandidateMessage, CandidateType, MessageContext, MessageId, ParsedMessage, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{compute_window, is_in_window};
use crate::semantic::sort_by_confidence;

/// Output of [`deduplicate_agreements`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupResult {
    /// Suggestions plus surviving agreements, by confidence descending.
    pub candidates: Vec<CandidateMessage>,
    pub removed_count: usize,
}

pub fn deduplicate_agreements(
    candidates: Vec<CandidateMessage>,
    messages: &[ParsedMessage],
) -> Result<DedupResult> {
    let (mut kept, agreements): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.candidate_type == CandidateType::Suggestion);

    if agreements.is_empty() {
        sort_by_confidence(&mut kept);
        return Ok(DedupResult {
            candidates: kept,
            removed_count: 0,
        });
    }

    let positions: HashMap<MessageId, usize> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    let mut windows: Vec<MessageContext> = Vec::with_capacity(kept.len());
    for suggestion in &kept {
        match positions.get(&suggestion.message_id) {
            Some(&index) => windows.push(compute_window(messages, index)?),
            None => warn!(
                "Suggestion {} not found in transcript, no window",
                suggestion.message_id
            ),
        }
    }

    let mut removed_count = 0;
    for agreement in agreements {
        let covered = windows
            .iter()
            .find(|w| is_in_window(agreement.message_id, w));
        match covered {
            Some(window) => {
                debug!(
                    "Agreement {} covered by suggestion {}",
                    agreement.message_id, window.target_message_id
                );
                removed_count += 1;
            }
            None => kept.push(agreement),
        }
    }

    sort_by_confidence(&mut kept);
    info!(
        "Agreement dedup: {} removed, {} kept",
        removed_count,
        kept.len()
    );

    Ok(DedupResult {
        candidates: kept,
        removed_count,
    })
}
