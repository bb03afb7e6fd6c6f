use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
    config::{RelayConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT},
    error::Result,
    services::{
        normalizer::normalize,
        openai_client::{extract_completion, ChatCompletionRequest, OpenAIClient},
        prompt::build_prompt,
    },
    types::{OutingRequest, PlanResult},
};

/// Turns a validated [`OutingRequest`] into normalized suggestions.
#[derive(Debug, Clone)]
pub struct OutingPlanner {
    openai_client: OpenAIClient,
    model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl OutingPlanner {
    /// `None` for the key is allowed; every plan call then fails with a
    /// configuration error before touching the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            openai_client: OpenAIClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone())
            .with_temperature(Some(config.temperature))
            .with_max_tokens(Some(config.max_tokens))
            .with_timeout(config.timeout)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_client.set_base_url(base_url);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_client.has_api_key()
    }

    /// Build the prompt, make one completion call and normalize the reply.
    pub async fn plan(&self, request: &OutingRequest) -> Result<PlanResult> {
        let started = Instant::now();

        let body = ChatCompletionRequest::new(&self.model, build_prompt(request).into_messages())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .into_value();

        let envelope = self
            .openai_client
            .chat_completion(&body, self.timeout)
            .await?;
        let completion = extract_completion(&envelope)?;
        let normalized = normalize(&completion.content, request.budget, &request.location)?;

        let result = PlanResult {
            suggestions: normalized.suggestions,
            strategy: normalized.strategy,
            source: normalized.source,
            tokens: completion.usage,
            duration: started.elapsed(),
        };

        if result.is_raw_fallback() {
            warn!(
                location = %request.location,
                "completion was not JSON, returning raw text suggestion"
            );
        }
        info!("planned outing: {}", result.summary());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;

    fn request() -> OutingRequest {
        OutingRequest {
            location: "Hyderabad".to_string(),
            date: "2024-11-01".to_string(),
            budget: 800.0,
            mode: "car".to_string(),
            outing_type: "cultural".to_string(),
        }
    }

    #[test]
    fn from_config_carries_model_and_timeout() {
        let config = RelayConfig {
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(7),
            ..RelayConfig::default()
        }
        .with_api_key("sk-test");

        let planner = OutingPlanner::from_config(&config);
        assert_eq!(planner.model(), "gpt-4o-mini");
        assert_eq!(planner.timeout(), Duration::from_secs(7));
        assert!(planner.has_api_key());
    }

    #[test]
    fn plan_without_key_is_a_configuration_error() {
        let planner = OutingPlanner::new(None).with_base_url("http://127.0.0.1:9");

        let err = tokio_test::block_on(planner.plan(&request())).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert_eq!(err.to_error_payload()["error"], "Server missing OPENAI_API_KEY");
    }
}
