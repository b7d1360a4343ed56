//! Fixtures shared by unit tests.

use chatmine_core::{
    CandidateMessage, CandidateSource, CandidateType, ChatSource, MessageId, ParsedMessage,
};
use chrono::{DateTime, Utc};

pub fn ts(id: MessageId) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + id as i64 * 60, 0).unwrap()
}

pub fn msg(id: MessageId, content: &str) -> ParsedMessage {
    ParsedMessage {
        id,
        sender: if id % 2 == 0 { "Alex" } else { "Sam" }.into(),
        content: content.into(),
        timestamp: ts(id),
        urls: Vec::new(),
        source: ChatSource::WhatsApp,
    }
}

pub fn msg_with_urls(id: MessageId, content: &str, urls: &[&str]) -> ParsedMessage {
    ParsedMessage {
        urls: urls.iter().map(|u| u.to_string()).collect(),
        ..msg(id, content)
    }
}

/// Messages with ids `0..contents.len()`.
pub fn transcript(contents: &[&str]) -> Vec<ParsedMessage> {
    contents
        .iter()
        .enumerate()
        .map(|(i, c)| msg(i as MessageId, c))
        .collect()
}

pub fn candidate(id: MessageId, candidate_type: CandidateType, confidence: f64) -> CandidateMessage {
    CandidateMessage {
        message_id: id,
        content: format!("message {}", id),
        sender: "Alex".into(),
        timestamp: ts(id),
        source: CandidateSource::Regex {
            pattern_name: "test".into(),
        },
        confidence,
        candidate_type,
        context_before: Vec::new(),
        context_after: Vec::new(),
        urls: Vec::new(),
    }
}

pub fn suggestion(id: MessageId) -> CandidateMessage {
    candidate(id, CandidateType::Suggestion, 0.8)
}

pub fn ids(candidates: &[CandidateMessage]) -> Vec<MessageId> {
    candidates.iter().map(|c| c.message_id).collect()
}
