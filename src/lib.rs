//! outing-relay: an HTTP relay that turns outing-planning requests into
//! normalized suggestions from a chat-completion model.
//!
//! The relay validates the caller's request, renders a prompt, makes a single
//! completion call and coerces whatever text comes back into
//! `{ "suggestions": [...] }`, falling back to a synthetic suggestion when the
//! reply holds no recoverable JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use outing_relay::{OutingPlanner, OutingRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = OutingPlanner::new(std::env::var("OPENAI_API_KEY").ok());
//!     let request = OutingRequest::from_json_slice(
//!         br#"{"location":"Hyderabad","date":"2024-11-01","budget":800,"mode":"car","type":"cultural"}"#,
//!         outing_relay::types::DEFAULT_MAX_FIELD_CHARS,
//!     )?;
//!
//!     let result = planner.plan(&request).await?;
//!     println!("{}", serde_json::to_string_pretty(&result.suggestions)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod server;
pub mod services;
pub mod types;

pub use config::RelayConfig;
pub use core::OutingPlanner;
pub use error::{RelayError, Result};
pub use services::normalizer::{
    direct_parse, extract_json, normalize, raw_fallback, resolve_candidate, slice_parse,
    Normalized, RecoveryStrategy, SuggestionSource,
};
pub use services::prompt::{build_prompt, PromptPair};
pub use types::{OutingRequest, PlanResult, Suggestion, SuggestionSet, TokenUsage};

#[cfg(feature = "cli")]
pub mod cli;
