use serde::Deserialize;
use serde_json::Value;

use crate::error::{RelayError, Result};

/// Default upper bound on each free-text request field, in characters.
pub const DEFAULT_MAX_FIELD_CHARS: usize = 200;

/// Request body exactly as the front-end sends it.
///
/// Every field is optional here so that a missing field is reported by name
/// instead of as a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct OutingRequestBody {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// Number, or a string holding a number
    #[serde(default)]
    pub budget: Option<Value>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, rename = "type")]
    pub outing_type: Option<String>,
    /// Older front-ends send the category as `outingType`
    #[serde(default, rename = "outingType")]
    pub outing_type_alias: Option<String>,
}

/// Validated outing-planning request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutingRequest {
    /// Free-form place name (city, neighbourhood, landmark)
    pub location: String,
    /// Free-form date text, passed through to the prompt untouched
    pub date: String,
    /// Spend ceiling in currency units, always finite and positive
    pub budget: f64,
    /// Travel mode such as "car", "metro" or "walk"
    pub mode: String,
    /// Outing category such as "cultural" or "adventure"
    pub outing_type: String,
}

impl OutingRequest {
    /// Parse and validate a raw JSON request body.
    ///
    /// The body must be a JSON object; arrays and scalars are rejected before
    /// any field is read.
    pub fn from_json_slice(bytes: &[u8], max_field_chars: usize) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| RelayError::Validation(format!("Invalid request body: {err}")))?;
        if !value.is_object() {
            return Err(RelayError::Validation(
                "Invalid request body: expected a JSON object".to_string(),
            ));
        }

        let body: OutingRequestBody = serde_path_to_error::deserialize(value).map_err(|err| {
            let path = err.path().to_string();
            let location = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            RelayError::Validation(format!(
                "Invalid request body at {}: {}",
                location,
                err.into_inner()
            ))
        })?;

        body.validate(max_field_chars)
    }
}

impl OutingRequestBody {
    /// Check presence of all five fields, then the budget and length rules.
    pub fn validate(self, max_field_chars: usize) -> Result<OutingRequest> {
        let OutingRequestBody {
            location,
            date,
            budget,
            mode,
            outing_type,
            outing_type_alias,
        } = self;

        let location = present(location);
        let date = present(date);
        let budget = parse_budget(budget)?;
        let mode = present(mode);
        let outing_type = present(outing_type).or_else(|| present(outing_type_alias));

        let missing: Vec<&str> = [
            ("location", location.is_none()),
            ("date", date.is_none()),
            ("budget", budget.is_none()),
            ("mode", mode.is_none()),
            ("type", outing_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        match (location, date, budget, mode, outing_type) {
            (Some(location), Some(date), Some(budget), Some(mode), Some(outing_type)) => {
                let request = OutingRequest {
                    location,
                    date,
                    budget,
                    mode,
                    outing_type,
                };
                check_lengths(&request, max_field_chars)?;
                Ok(request)
            }
            _ => Err(RelayError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// `Ok(None)` means the budget is missing; a present but unusable value is an error.
fn parse_budget(value: Option<Value>) -> Result<Option<f64>> {
    let amount = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().ok()
        }
        Some(_) => None,
    };

    match amount {
        Some(amount) if amount == 0.0 => Ok(None),
        Some(amount) if amount.is_finite() && amount > 0.0 => Ok(Some(amount)),
        _ => Err(RelayError::Validation(
            "budget must be a positive number".to_string(),
        )),
    }
}

fn check_lengths(request: &OutingRequest, max_field_chars: usize) -> Result<()> {
    let fields = [
        ("location", &request.location),
        ("date", &request.date),
        ("mode", &request.mode),
        ("type", &request.outing_type),
    ];

    for (name, value) in fields {
        if value.chars().count() > max_field_chars {
            return Err(RelayError::Validation(format!(
                "{} must be at most {} characters",
                name, max_field_chars
            )));
        }
    }

    Ok(())
}
