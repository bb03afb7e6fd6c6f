use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{RelayError, Result},
    types::{Suggestion, SuggestionSet},
};

/// Longest description carried by the raw fallback suggestion, in characters.
pub const RAW_DESCRIPTION_CHARS: usize = 1000;
/// Ceiling applied to the raw fallback's `estimatedCost`.
pub const RAW_COST_CEILING: f64 = 500.0;
/// Keys probed, in order, for a nested suggestion array.
pub const NESTED_ARRAY_KEYS: [&str; 3] = ["data", "result", "output"];

pub const RAW_SUGGESTION_ID: &str = "ai_raw";
pub const RAW_SUGGESTION_TITLE: &str = "AI result (raw)";

/// Ways of recovering structured data from completion text, in the order tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryStrategy {
    /// The whole text is JSON
    DirectParse,
    /// JSON sits between the first opening and the last closing bracket
    SliceParse,
    /// Nothing parsed; the text is wrapped verbatim
    RawFallback,
}

impl RecoveryStrategy {
    pub const CHAIN: [RecoveryStrategy; 3] = [
        RecoveryStrategy::DirectParse,
        RecoveryStrategy::SliceParse,
        RecoveryStrategy::RawFallback,
    ];

    /// Run this strategy alone against `text`.
    pub fn attempt(self, text: &str) -> Option<Value> {
        match self {
            RecoveryStrategy::DirectParse => direct_parse(text),
            RecoveryStrategy::SliceParse => slice_parse(text),
            RecoveryStrategy::RawFallback => None,
        }
    }
}

/// Which part of the parsed candidate became the suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestionSource {
    SuggestionsKey,
    BareArray,
    NestedKey(&'static str),
    Wrapped,
    Raw,
}

/// Outcome of normalizing one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub strategy: RecoveryStrategy,
    pub source: SuggestionSource,
    pub suggestions: SuggestionSet,
}

/// Parse the whole text, keeping the value only when it is truthy.
pub fn direct_parse(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(is_truthy)
}

/// Parse the span from the first `{` (or `[` when there is no brace) through
/// the last `}` or `]`, whichever comes later.
pub fn slice_parse(text: &str) -> Option<Value> {
    let start = text.find('{').or_else(|| text.find('['))?;
    let end = text.rfind('}').max(text.rfind(']'))?;
    // closers that all precede the opener give no candidate; the raw fallback applies
    if end < start {
        return None;
    }

    // brackets are ASCII, so both bounds sit on char boundaries
    serde_json::from_str::<Value>(&text[start..=end]).ok()
}

/// Walk [`RecoveryStrategy::CHAIN`] until a strategy yields a value.
pub fn extract_json(text: &str) -> Option<(RecoveryStrategy, Value)> {
    RecoveryStrategy::CHAIN
        .into_iter()
        .find_map(|strategy| strategy.attempt(text).map(|value| (strategy, value)))
}

/// Pick the suggestion list out of a parsed candidate.
pub fn resolve_candidate(candidate: Value) -> (SuggestionSource, Vec<Value>) {
    if let Some(Value::Array(items)) = candidate.get("suggestions") {
        return (SuggestionSource::SuggestionsKey, items.clone());
    }

    if let Value::Array(items) = candidate {
        return (SuggestionSource::BareArray, items);
    }

    for key in NESTED_ARRAY_KEYS {
        if let Some(Value::Array(items)) = candidate.get(key) {
            return (SuggestionSource::NestedKey(key), items.clone());
        }
    }

    (SuggestionSource::Wrapped, vec![candidate])
}

/// Synthetic suggestion carrying the unparsed completion text.
pub fn raw_fallback(text: &str, budget: f64, location: &str) -> Suggestion {
    Suggestion {
        id: RAW_SUGGESTION_ID.to_string(),
        title: RAW_SUGGESTION_TITLE.to_string(),
        description: text.chars().take(RAW_DESCRIPTION_CHARS).collect(),
        estimated_cost: budget.min(RAW_COST_CEILING),
        image: String::new(),
        location_details: location.to_string(),
        itinerary: Vec::new(),
        best_time: String::new(),
        cost_breakdown: Some(Vec::new()),
        tips: Some(Vec::new()),
    }
}

/// Turn completion text into the canonical suggestion list.
///
/// Malformed text never fails: it falls through to [`raw_fallback`]. Only
/// empty text is an error, since there is nothing to wrap. Whitespace is
/// still text and gets wrapped.
pub fn normalize(text: &str, budget: f64, location: &str) -> Result<Normalized> {
    if text.is_empty() {
        return Err(RelayError::EmptyCompletion);
    }

    let Some((strategy, candidate)) = extract_json(text) else {
        debug!(
            target: "outing_relay::normalizer",
            chars = text.chars().count(),
            "no JSON recovered, using raw fallback"
        );
        let fallback = serde_json::to_value(raw_fallback(text, budget, location))?;
        return Ok(Normalized {
            strategy: RecoveryStrategy::RawFallback,
            source: SuggestionSource::Raw,
            suggestions: SuggestionSet::new(vec![fallback]),
        });
    };

    let (source, suggestions) = resolve_candidate(candidate);
    debug!(
        target: "outing_relay::normalizer",
        ?strategy,
        ?source,
        count = suggestions.len()
    );

    Ok(Normalized {
        strategy,
        source,
        suggestions: SuggestionSet::new(suggestions),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
