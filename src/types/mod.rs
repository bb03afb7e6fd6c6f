pub mod outing;
pub mod result;
pub mod suggestion;

pub use outing::{OutingRequest, OutingRequestBody, DEFAULT_MAX_FIELD_CHARS};
pub use result::{PlanResult, TokenUsage};
pub use suggestion::{Suggestion, SuggestionSet};
