use std::{fmt, time::Duration};

use serde_json::{json, Value};
use tracing::warn;

use crate::{
    error::{RelayError, Result},
    types::TokenUsage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Thin chat-completions client. One attempt per call, no retries.
#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAIClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST `body` to the chat-completions endpoint and return the decoded envelope.
    pub async fn chat_completion(&self, body: &Value, timeout: Duration) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::Config("Server missing OPENAI_API_KEY".to_string()))?;

        let request_url = build_chat_url(&self.base_url);

        let response = self
            .http
            .post(&request_url)
            .timeout(timeout)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(err, timeout))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|err| transport_error(err, timeout))?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %response_text,
                "completion API returned an error status"
            );
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
            RelayError::MalformedCompletion(format!("response body is not JSON: {err}"))
        })?;

        if response_json.get("error").is_some_and(|error| !error.is_null()) {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: response_text,
            });
        }

        Ok(response_json)
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout(timeout)
    } else {
        RelayError::Transport(err.to_string())
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// Reply text and token accounting pulled out of a completion envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Read `choices[0].message.content`, falling back to the legacy `choices[0].text`.
pub fn extract_completion(envelope: &Value) -> Result<Completion> {
    let first_choice = envelope
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RelayError::MalformedCompletion("response has no `choices` array".to_string())
        })?
        .first();

    let content = first_choice
        .and_then(|choice| {
            choice
                .get("message")
                .and_then(|message| message.get("content"))
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .or_else(|| choice.get("text").and_then(Value::as_str))
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(RelayError::EmptyCompletion);
    }

    let usage = envelope
        .get("usage")
        .and_then(|usage| serde_json::from_value::<TokenUsage>(usage.clone()).ok());

    Ok(Completion {
        content: content.to_string(),
        usage,
    })
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_is_appended_once() {
        assert_eq!(
            build_chat_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:1234/chat/completions"),
            "http://localhost:1234/chat/completions"
        );
    }

    #[test]
    fn request_body_carries_sampling_options() {
        let body = ChatCompletionRequest::new(
            "gpt-3.5-turbo",
            vec![json!({ "role": "user", "content": "hi" })],
        )
        .with_temperature(Some(0.5))
        .with_max_tokens(Some(700))
        .into_value();

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["temperature"].as_f64(), Some(0.5));
        assert_eq!(body["max_tokens"], 700);
    }

    #[test]
    fn unset_options_are_omitted() {
        let body = ChatCompletionRequest::new("m", Vec::new()).into_value();
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn extracts_message_content_and_usage() {
        let envelope = json!({
            "choices": [{ "message": { "role": "assistant", "content": "[1]" } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        });

        let completion = extract_completion(&envelope).unwrap();
        assert_eq!(completion.content, "[1]");
        assert_eq!(completion.usage.map(|usage| usage.total_tokens), Some(15));
    }

    #[test]
    fn falls_back_to_legacy_text_field() {
        let envelope = json!({ "choices": [{ "text": "plain words" }] });
        assert_eq!(extract_completion(&envelope).unwrap().content, "plain words");
    }

    #[test]
    fn missing_choices_is_malformed() {
        let err = extract_completion(&json!({ "id": "x" })).unwrap_err();
        assert!(matches!(err, RelayError::MalformedCompletion(_)));
    }

    #[test]
    fn empty_content_is_an_upstream_failure() {
        for envelope in [
            json!({ "choices": [] }),
            json!({ "choices": [{ "message": { "content": "" } }] }),
            json!({ "choices": [{ "message": { "content": null } }] }),
        ] {
            let err = extract_completion(&envelope).unwrap_err();
            assert!(matches!(err, RelayError::EmptyCompletion), "{envelope}");
        }
    }

    #[test]
    fn whitespace_content_is_passed_through() {
        let envelope = json!({ "choices": [{ "message": { "content": "   \n  " } }] });
        assert_eq!(extract_completion(&envelope).unwrap().content, "   \n  ");
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let client = OpenAIClient::new(Some("sk-secret".to_string()));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let mut client = OpenAIClient::new(None);
        // unroutable on purpose: the call must not get this far
        client.set_base_url("http://127.0.0.1:9");

        let err = client
            .chat_completion(&json!({}), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[tokio::test]
    async fn null_error_field_is_not_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"error":null,"choices":[{"message":{"content":"[]"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let mut client = OpenAIClient::new(Some("sk-test".to_string()));
        client.set_base_url(server.url());

        let envelope = client
            .chat_completion(&json!({}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(extract_completion(&envelope).unwrap().content, "[]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_object_in_success_envelope_is_upstream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"error":{"message":"model overloaded"}}"#)
            .create_async()
            .await;

        let mut client = OpenAIClient::new(Some("sk-test".to_string()));
        client.set_base_url(server.url());

        let err = client
            .chat_completion(&json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: 200, .. }));
    }
}
