use serde_json::{json, Value};

use crate::types::OutingRequest;

/// Example document embedded in the system prompt to pin the output shape.
pub const EXAMPLE_SUGGESTIONS_JSON: &str = r#"{
  "suggestions": [
    {
      "id":"s1",
      "title":"Charminar & Laad Bazaar Walk",
      "description":"A cultural half-day exploring Charminar and nearby bazaars...",
      "estimatedCost": 800,
      "image": "https://example.com/charminar.jpg",
      "locationDetails": "Old City, Hyderabad. Famous for pearls and biryani.",
      "itinerary": ["Start at Charminar", "Visit Mecca Masjid", "Lunch at local biryani spot"],
      "costBreakdown": ["Transport: ₹100", "Food: ₹400", "Shopping: ₹300"],
      "tips": ["Wear comfortable shoes", "Carry water"],
      "bestTime": "October - March"
    }
  ]
}"#;

const SYSTEM_PROMPT_HEAD: &str = r#"You are "Go Outing" — an expert, concise outing planner for India.
When asked, produce a JSON array named "suggestions". Each suggestion must be an object with these fields:
- id: string (unique)
- title: short string
- description: short paragraph describing the outing
- estimatedCost: number (in rupees)
- image: URL string (if you cannot provide a real image, return empty string)
- locationDetails: short text about the place (neighbourhood / what's special)
- itinerary: array of short strings (step-by-step plan for the day)
- costBreakdown: array of short strings like "Travel: ₹100, Food: ₹200"
- tips: array of short tips
- bestTime: string (best time/season)
Return **only** valid JSON (no extra commentary). Example structure:"#;

const SYSTEM_PROMPT_TAIL: &str = "Be concise and return 3-6 suggestions tailored to the user's budget, mode, type and date. Assume the user inputs are in India.";

/// Instruction and task text sent as the system and user chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Chat-completions `messages` array for this pair
    pub fn into_messages(self) -> Vec<Value> {
        vec![
            json!({ "role": "system", "content": self.system }),
            json!({ "role": "user", "content": self.user }),
        ]
    }
}

/// Fixed instruction text describing the required JSON output.
pub fn system_prompt() -> String {
    format!(
        "{}\n\n{}\n\n{}",
        SYSTEM_PROMPT_HEAD, EXAMPLE_SUGGESTIONS_JSON, SYSTEM_PROMPT_TAIL
    )
}

/// Task text with the caller's fields interpolated verbatim.
pub fn user_prompt(request: &OutingRequest) -> String {
    format!(
        "User request:\nlocation: {}\ndate: {}\nbudget: {}\nmode: {}\ntype: {}\n\nReturn suggestions as described above.",
        request.location, request.date, request.budget, request.mode, request.outing_type
    )
}

pub fn build_prompt(request: &OutingRequest) -> PromptPair {
    PromptPair {
        system: system_prompt(),
        user: user_prompt(request),
    }
}
