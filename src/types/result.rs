use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::suggestion::SuggestionSet;
use crate::services::normalizer::{RecoveryStrategy, SuggestionSource};

/// Result of planning one outing request
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Normalized suggestions, ready to send to the caller
    pub suggestions: SuggestionSet,
    /// Recovery strategy that produced the suggestions
    pub strategy: RecoveryStrategy,
    /// Part of the parsed reply the suggestions came from
    pub source: SuggestionSource,
    /// Token usage reported by the completion API, if any
    pub tokens: Option<TokenUsage>,
    /// Wall time spent on the completion call and normalization
    pub duration: Duration,
}

/// Token usage information from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl PlanResult {
    /// True when the reply could not be parsed and was wrapped verbatim
    pub fn is_raw_fallback(&self) -> bool {
        self.strategy == RecoveryStrategy::RawFallback
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} suggestion(s) via {:?}/{:?} in {:.2}s",
            self.suggestions.len(),
            self.strategy,
            self.source,
            self.duration.as_secs_f64()
        );

        if let Some(tokens) = &self.tokens {
            line.push_str(&format!(
                ", tokens: {} prompt + {} completion = {} total",
                tokens.prompt_tokens, tokens.completion_tokens, tokens.total_tokens
            ));
        }

        line
    }

    pub fn into_suggestions(self) -> SuggestionSet {
        self.suggestions
    }
}
