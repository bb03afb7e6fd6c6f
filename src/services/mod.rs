pub mod normalizer;
pub mod openai_client;
pub mod prompt;

pub use normalizer::{normalize, Normalized, RecoveryStrategy, SuggestionSource};
pub use openai_client::{ChatCompletionRequest, Completion, OpenAIClient};
pub use prompt::{build_prompt, PromptPair};
