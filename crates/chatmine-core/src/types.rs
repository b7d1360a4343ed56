//! Data model shared by every extraction stage.
//!
//! All values here live for a single extraction run. Messages come from an
//! external chat parser and are never mutated; candidates are created by the
//! matchers and replaced (not edited) when a better duplicate shows up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat-order message identifier. Unique and ascending within a transcript.
pub type MessageId = u64;

/// Platform the transcript was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSource {
    WhatsApp,
    IMessage,
}

impl std::fmt::Display for ChatSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WhatsApp => write!(f, "whatsapp"),
            Self::IMessage => write!(f, "imessage"),
        }
    }
}

/// A single message produced by the chat parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub id: MessageId,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// URLs found in the content, in order of appearance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    pub source: ChatSource,
}

/// Trimmed projection of a message, used only as display/prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub id: MessageId,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&ParsedMessage> for ContextMessage {
    fn from(msg: &ParsedMessage) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender.clone(),
            content: msg.content.clone(),
            timestamp: msg.timestamp,
        }
    }
}

/// Surrounding messages of a target message.
///
/// `first_message_id <= target_message_id <= last_message_id`. A side with no
/// messages has its boundary equal to the target id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    pub before: Vec<ContextMessage>,
    pub after: Vec<ContextMessage>,
    pub first_message_id: MessageId,
    pub last_message_id: MessageId,
    pub target_message_id: MessageId,
}

/// Whether a candidate proposes an activity or reacts to a nearby proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateType {
    Suggestion,
    Agreement,
}

/// URL category assigned by host inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlType {
    GoogleMaps,
    Airbnb,
    Booking,
    Tripadvisor,
    Event,
    Tiktok,
    Youtube,
    Instagram,
    Website,
}

impl UrlType {
    /// Maps, travel/booking and event links point at something to do.
    pub fn is_activity(self) -> bool {
        matches!(
            self,
            Self::GoogleMaps | Self::Airbnb | Self::Booking | Self::Tripadvisor | Self::Event
        )
    }
}

impl std::fmt::Display for UrlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GoogleMaps => "google_maps",
            Self::Airbnb => "airbnb",
            Self::Booking => "booking",
            Self::Tripadvisor => "tripadvisor",
            Self::Event => "event",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::Instagram => "instagram",
            Self::Website => "website",
        };
        write!(f, "{}", name)
    }
}

/// Category of a semantic search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Suggestion,
    Activity,
    Place,
    Agreement,
}

/// Provenance of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CandidateSource {
    Regex {
        #[serde(rename = "patternName")]
        pattern_name: String,
    },
    Url {
        #[serde(rename = "urlType")]
        url_type: UrlType,
    },
    Semantic {
        similarity: f64,
        query: String,
        #[serde(rename = "queryType")]
        query_type: QueryType,
    },
}

impl CandidateSource {
    /// Short label for logs, e.g. `regex:we_should` or `url:airbnb`.
    pub fn label(&self) -> String {
        match self {
            Self::Regex { pattern_name } => format!("regex:{}", pattern_name),
            Self::Url { url_type } => format!("url:{}", url_type),
            Self::Semantic { query_type, .. } => format!("semantic:{:?}", query_type).to_lowercase(),
        }
    }
}

/// A message flagged as possibly describing an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMessage {
    pub message_id: MessageId,
    pub content: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    pub source: CandidateSource,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub candidate_type: CandidateType,
    pub context_before: Vec<ContextMessage>,
    pub context_after: Vec<ContextMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

impl CandidateMessage {
    /// Build a candidate for `msg` with the context window already computed.
    pub fn from_message(
        msg: &ParsedMessage,
        source: CandidateSource,
        confidence: f64,
        candidate_type: CandidateType,
        context: MessageContext,
    ) -> Self {
        Self {
            message_id: msg.id,
            content: msg.content.clone(),
            sender: msg.sender.clone(),
            timestamp: msg.timestamp,
            source,
            confidence,
            candidate_type,
            context_before: context.before,
            context_after: context.after,
            urls: msg.urls.clone(),
        }
    }
}

/// Precomputed embedding for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedMessage {
    pub message_id: MessageId,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A natural-language query used to search message embeddings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticQuery {
    pub text: String,
    pub query_type: QueryType,
}

impl SemanticQuery {
    pub fn new(text: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            text: text.into(),
            query_type,
        }
    }
}

/// A query together with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEmbedding {
    pub query: String,
    pub query_type: QueryType,
    pub embedding: Vec<f32>,
}

/// Non-empty run of candidates ascending by message id, close enough in the
/// transcript to count as one discussion.
pub type Group = Vec<CandidateMessage>;

/// Non-empty, size-bounded unit of work handed to the classifier.
pub type Batch = Vec<CandidateMessage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_source_serializes_tagged() {
        let src = CandidateSource::Semantic {
            similarity: 0.82,
            query: "let's try this".into(),
            query_type: QueryType::Suggestion,
        };
        let json = serde_json::to_value(&src).unwrap();
        assert_eq!(json["type"], "semantic");
        assert_eq!(json["queryType"], "suggestion");

        let url = CandidateSource::Url {
            url_type: UrlType::GoogleMaps,
        };
        let json = serde_json::to_value(&url).unwrap();
        assert_eq!(json["type"], "url");
        assert_eq!(json["urlType"], "google_maps");
    }

    #[test]
    fn test_source_label() {
        let src = CandidateSource::Regex {
            pattern_name: "we_should".into(),
        };
        assert_eq!(src.label(), "regex:we_should");
        let src = CandidateSource::Url {
            url_type: UrlType::Airbnb,
        };
        assert_eq!(src.label(), "url:airbnb");
    }

    #[test]
    fn test_parsed_message_urls_default() {
        let msg: ParsedMessage = serde_json::from_value(serde_json::json!({
            "id": 3,
            "sender": "Sam",
            "content": "hi",
            "timestamp": "2024-01-05T10:00:00Z",
            "source": "whatsapp",
        }))
        .unwrap();
        assert!(msg.urls.is_empty());
        assert_eq!(msg.source, ChatSource::WhatsApp);
    }

    #[test]
    fn test_activity_url_types() {
        assert!(UrlType::GoogleMaps.is_activity());
        assert!(UrlType::Event.is_activity());
        assert!(!UrlType::Tiktok.is_activity());
        assert!(!UrlType::Website.is_activity());
    }
}
