//! Built-in activity, exclusion and keyword tables.

use chatmine_core::CandidateType;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// A phrase that hints the message proposes (or agrees to) an activity.
pub struct ActivityPattern {
    pub name: &'static str,
    regex: Regex,
    /// Matches whose following text starts with this are ignored
    /// ("we should" but not "we should not").
    reject_after: Option<Regex>,
    pub confidence: f64,
    pub candidate_type: CandidateType,
}

impl ActivityPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find_iter(text).any(|m| match &self.reject_after {
            Some(reject) => !reject.is_match(&text[m.end()..]),
            None => true,
        })
    }
}

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("built-in pattern should compile")
}

fn pattern(
    name: &'static str,
    regex: &str,
    reject_after: Option<&str>,
    confidence: f64,
    candidate_type: CandidateType,
) -> ActivityPattern {
    ActivityPattern {
        name,
        regex: ci(regex),
        reject_after: reject_after.map(|r| ci(&format!(r"^ (?:{})\b", r))),
        confidence,
        candidate_type,
    }
}

/// Ordered: the first matching pattern decides confidence and type.
/// Agreement-only patterns come last so a message that also proposes
/// something is never tagged as a mere agreement.
pub static ACTIVITY_PATTERNS: Lazy<Vec<ActivityPattern>> = Lazy::new(|| {
    use CandidateType::{Agreement, Suggestion};
    vec![
        pattern("we_should", r"\bwe should\b", Some("not|stop|avoid"), 0.9, Suggestion),
        pattern("lets_go", r"\blet['’]?s go\b", Some("home|back|now"), 0.85, Suggestion),
        pattern("lets_try", r"\blet['’]?s try\b", None, 0.85, Suggestion),
        pattern("wanna_go", r"\bwanna go\b|\bwant to go\b", None, 0.85, Suggestion),
        pattern("should_we", r"\bshould we\b", Some("not|stop"), 0.8, Suggestion),
        pattern("we_could", r"\bwe could\b", Some("not|never"), 0.7, Suggestion),
        pattern("i_want_to", r"\bi want to\b", Some("die|cry|leave"), 0.6, Suggestion),
        pattern("we_need_to", r"\bwe need to\b", Some("stop|avoid"), 0.6, Suggestion),
        pattern("bucket_list", r"\bbucket ?list\b", None, 0.95, Suggestion),
        pattern("must_visit", r"\bmust visit\b|\bmust go\b|\bhave to visit\b", None, 0.9, Suggestion),
        pattern("would_be_fun", r"\bwould be (?:fun|cool|nice)\b", None, 0.75, Suggestion),
        pattern("one_day", r"\bone day\b.*\b(?:go|visit|try|do|see)\b", None, 0.7, Suggestion),
        pattern("next_time", r"\bnext time\b.*\b(?:go|visit|try|do|see|should)\b", None, 0.7, Suggestion),
        pattern("lets_do", r"\blet['’]?s do\b", None, 0.8, Suggestion),
        pattern("come_back", r"\bcome back\b.*\b(?:and|to)\b", None, 0.65, Suggestion),
        pattern("can_we", r"\bcan we\b.*\b(?:go|try|do|visit|see)\b", None, 0.75, Suggestion),
        pattern("yes_lets", r"\b(?:yes|yeah|yep)[!,. ]+let['’]?s\b", None, 0.7, Agreement),
        // Bare "I'm in" only; "I'm in Rotorua" is not an agreement
        pattern("count_me_in", r"^\s*i['’]?m in[!. ]*$|\bcount me in\b", None, 0.7, Agreement),
        pattern("im_keen", r"\bi['’]?m (?:so |super |very )?keen\b|\bso keen\b", None, 0.65, Agreement),
        pattern("sounds_fun", r"\bsounds? (?:fun|good|great|amazing|awesome)\b", None, 0.6, Agreement),
        pattern("love_to", r"\bi['’]?d love to\b", None, 0.6, Agreement),
        pattern("looks_fun", r"\blooks? (?:fun|amazing|awesome|incredible|beautiful)\b", None, 0.5, Agreement),
    ]
});

/// Chores, errands, appointments and negations are never activities.
pub static EXCLUSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:work|job|meeting|email|call|pay|bill|tax)\b",
        r"\b(?:doctor|dentist|hospital|appointment)\b",
        r"\b(?:groceries|shopping|buy|sell|order)\b",
        r"\b(?:clean|laundry|dishes|vacuum)\b",
        r"\b(?:should not|shouldn['’]t|can['’]t|cannot)\b",
    ]
    .iter()
    .map(|p| ci(p))
    .collect()
});

static ACTIVITY_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    let groups = [
        r"restaurant|cafe|coffee|bar|pub|brewery|winery|vineyard",
        r"beach|lake|river|waterfall|hot springs?|pool",
        r"hike|hiking|walk|trail|track|trek",
        r"mountain|hill|volcano|summit|peak",
        r"park|garden|reserve|sanctuary|forest",
        r"museum|gallery|exhibition|art",
        r"market|farmers market|night market",
        r"concert|show|theatre|movie|cinema|festival|event|gig",
        r"hotel|airbnb|bach|accommodation|camping|glamping",
        r"kayak|paddleboard|surf|dive|snorkel|swim",
        r"ski|snowboard|bungy|skydive|zipline",
        r"tour|cruise|trip|getaway|holiday|vacation|road trip",
        r"rotorua|queenstown|wellington|taupo|coromandel|bay of islands",
        r"auckland|waiheke|matakana|piha|muriwai|raglan",
        r"hobbiton|milford|waitomo|tongariro",
    ];
    ci(&format!(r"\b(?:{})\b", groups.join("|")))
});

/// Phrases that mark a shared link as a proposal rather than idle sharing.
pub const SUGGESTION_PHRASES: &[&str] = &[
    "let's go",
    "we should",
    "wanna go",
    "want to go",
    "should we",
    "check this out",
    "look at this",
    "this looks",
    "bucket list",
];

pub fn has_activity_keyword(text: &str) -> bool {
    ACTIVITY_KEYWORDS.is_match(text)
}

pub fn has_suggestion_phrase(text: &str) -> bool {
    let normalized = text.to_lowercase().replace('’', "'");
    SUGGESTION_PHRASES.iter().any(|p| normalized.contains(p))
}

/// Built-in exclusions plus any caller-supplied ones.
pub fn is_excluded(text: &str, extra: &[Regex]) -> bool {
    EXCLUSION_PATTERNS
        .iter()
        .chain(extra.iter())
        .any(|re| re.is_match(text))
}

/// First built-in pattern that matches, if any.
pub fn first_match(text: &str) -> Option<&'static ActivityPattern> {
    ACTIVITY_PATTERNS.iter().find(|p| p.is_match(text))
}
