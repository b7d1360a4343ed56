//! Candidate union keyed by message id.

use std::collections::HashMap;

use chatmine_core::{CandidateMessage, MessageId};

/// Map of candidates by message id, keeping the most confident per id.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    by_id: HashMap<MessageId, CandidateMessage>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `candidate` unless an entry for the same message is at least as
    /// confident. Returns whether it was stored.
    pub fn upsert(&mut self, candidate: CandidateMessage) -> bool {
        match self.by_id.get(&candidate.message_id) {
            Some(existing) if existing.confidence >= candidate.confidence => false,
            _ => {
                self.by_id.insert(candidate.message_id, candidate);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Drain into a vector ordered by ascending message id.
    pub fn into_sorted(self) -> Vec<CandidateMessage> {
        let mut out: Vec<_> = self.by_id.into_values().collect();
        out.sort_by_key(|c| c.message_id);
        out
    }
}

impl Extend<CandidateMessage> for CandidateIndex {
    fn extend<I: IntoIterator<Item = CandidateMessage>>(&mut self, iter: I) {
        for candidate in iter {
            self.upsert(candidate);
        }
    }
}

/// Union heuristic and semantic candidates. On equal confidence the
/// heuristic candidate is kept.
pub fn merge(
    heuristic: Vec<CandidateMessage>,
    semantic: Vec<CandidateMessage>,
) -> Vec<CandidateMessage> {
    let mut index = CandidateIndex::new();
    index.extend(heuristic);
    index.extend(semantic);
    index.into_sorted()
}
