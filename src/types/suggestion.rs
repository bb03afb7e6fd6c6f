use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};

/// One recommended outing in the shape the front-end renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Unique token within a single response
    pub id: String,
    pub title: String,
    pub description: String,
    /// Estimated total spend in currency units
    pub estimated_cost: f64,
    /// Image URL, empty when the model had none
    #[serde(default)]
    pub image: String,
    /// Neighbourhood or what makes the place special
    #[serde(default)]
    pub location_details: String,
    /// Step-by-step plan for the outing
    #[serde(default)]
    pub itinerary: Vec<String>,
    #[serde(default)]
    pub best_time: String,
    /// Lines such as "Transport: ₹100"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_breakdown: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
}

/// Response body returned on every successful request.
///
/// Entries are kept as raw JSON: whatever the model produced is forwarded
/// unchanged, only the outer shape is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub suggestions: Vec<Value>,
}

impl SuggestionSet {
    pub fn new(suggestions: Vec<Value>) -> Self {
        Self { suggestions }
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Decode every entry into a typed [`Suggestion`].
    ///
    /// Fails on the first entry that does not match, naming its index and field.
    pub fn decode(&self) -> Result<Vec<Suggestion>> {
        self.suggestions
            .iter()
            .enumerate()
            .map(|(index, entry)| decode_suggestion(index, entry))
            .collect()
    }
}

fn decode_suggestion(index: usize, entry: &Value) -> Result<Suggestion> {
    let raw = entry.to_string();
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        RelayError::Validation(format!(
            "suggestion {} does not match the expected shape at {}: {}",
            index,
            location,
            err.into_inner()
        ))
    })
}
