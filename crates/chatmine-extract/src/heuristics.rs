//! Heuristic matcher — regex and URL rules over raw messages.
//!
//! Two passes run per message and are merged by message id (highest
//! confidence wins, regex on ties):
//! - regex: exclusions, then built-in activity patterns, then caller patterns,
//!   with a keyword boost;
//! - URL: best link type on the message, gated on activity links or a
//!   suggestion phrase, with phrase and keyword boosts.

pub mod patterns;
pub mod urls;

use chatmine_core::config::{
    ADDITIONAL_PATTERN_CONFIDENCE, MAX_CONFIDENCE, REGEX_KEYWORD_BOOST, URL_KEYWORD_BOOST,
    URL_SUGGESTION_BOOST,
};
use chatmine_core::{
    CandidateMessage, CandidateSource, CandidateType, ExtractorOptions, ParsedMessage, Result,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::compute_window;
use crate::merge::CandidateIndex;

/// Output of [`match_heuristics`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicResult {
    /// Merged candidates, ascending by message id.
    pub candidates: Vec<CandidateMessage>,
    pub regex_match_count: usize,
    pub url_match_count: usize,
}

/// A scored match before the context window is attached.
struct Scored {
    source: CandidateSource,
    confidence: f64,
    candidate_type: CandidateType,
}

fn boost(confidence: f64, amount: f64) -> f64 {
    (confidence + amount).min(MAX_CONFIDENCE)
}

/// Scan `messages` with the regex and URL rules.
pub fn match_heuristics(
    messages: &[ParsedMessage],
    options: &ExtractorOptions,
) -> Result<HeuristicResult> {
    let mut index = CandidateIndex::new();
    let mut regex_match_count = 0;
    let mut url_match_count = 0;

    for (i, msg) in messages.iter().enumerate() {
        let regex_hit = score_regex(msg, options);
        let url_hit = if options.include_url_based {
            score_urls(msg, options)
        } else {
            None
        };
        if regex_hit.is_none() && url_hit.is_none() {
            continue;
        }

        let window = compute_window(messages, i)?;
        for hit in [regex_hit, url_hit].into_iter().flatten() {
            match hit.source {
                CandidateSource::Regex { .. } => regex_match_count += 1,
                CandidateSource::Url { .. } => url_match_count += 1,
                CandidateSource::Semantic { .. } => {}
            }
            debug!(
                "Heuristic hit on message {}: {} ({:.2})",
                msg.id,
                hit.source.label(),
                hit.confidence
            );
            index.upsert(CandidateMessage::from_message(
                msg,
                hit.source,
                hit.confidence,
                hit.candidate_type,
                window.clone(),
            ));
        }
    }

    info!(
        "Heuristic matching: {} regex, {} url, {} unique",
        regex_match_count,
        url_match_count,
        index.len()
    );

    Ok(HeuristicResult {
        candidates: index.into_sorted(),
        regex_match_count,
        url_match_count,
    })
}

fn score_regex(msg: &ParsedMessage, options: &ExtractorOptions) -> Option<Scored> {
    let text = msg.content.as_str();
    if text.trim().is_empty() || patterns::is_excluded(text, &options.additional_exclusions) {
        return None;
    }

    let (pattern_name, base, candidate_type) = match patterns::first_match(text) {
        Some(p) => (p.name.to_string(), p.confidence, p.candidate_type),
        None => {
            let custom = options.additional_patterns.iter().find(|re| re.is_match(text))?;
            (
                format!("custom:{}", custom.as_str()),
                ADDITIONAL_PATTERN_CONFIDENCE,
                CandidateType::Suggestion,
            )
        }
    };

    let confidence = if patterns::has_activity_keyword(text) {
        boost(base, REGEX_KEYWORD_BOOST)
    } else {
        base
    };
    if confidence < options.min_confidence {
        return None;
    }

    Some(Scored {
        source: CandidateSource::Regex { pattern_name },
        confidence,
        candidate_type,
    })
}

fn score_urls(msg: &ParsedMessage, options: &ExtractorOptions) -> Option<Scored> {
    let url_type = urls::best_url_type(&msg.urls)?;
    let text = msg.content.as_str();
    let has_phrase = patterns::has_suggestion_phrase(text);

    // Social links are only kept when the text itself proposes something.
    if !url_type.is_activity() && !has_phrase {
        debug!("Skipping {} link on message {} without suggestion text", url_type, msg.id);
        return None;
    }

    let mut confidence = urls::base_confidence(url_type);
    if has_phrase {
        confidence = boost(confidence, URL_SUGGESTION_BOOST);
    }
    if patterns::has_activity_keyword(text) {
        confidence = boost(confidence, URL_KEYWORD_BOOST);
    }
    if confidence < options.min_confidence {
        return None;
    }

    Some(Scored {
        source: CandidateSource::Url { url_type },
        confidence,
        candidate_type: CandidateType::Suggestion,
    })
}
