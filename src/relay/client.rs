use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::Settings;

use super::RelayError;

/// Client for one OpenAI-compatible chat completion endpoint.
///
/// Holds only read-only state, so a single instance is shared by all
/// concurrent requests without locking. No `Debug` impl: the API key must
/// not appear in debug output.
pub struct RelayClient {
    http: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
    provider: String,
    timeout: Duration,
}

/// Chat completion request body. Exactly one user message and nothing else:
/// no system prompt, no history, no stream flag.
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// The subset of the completion response the relay reads. Unknown fields
/// (id, usage, finish_reason, ...) are ignored.
#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

impl RelayClient {
    /// Build a client from validated settings and a shared pooled HTTP client.
    pub fn new(settings: Settings, http: reqwest::Client) -> Self {
        Self {
            http,
            completions_url: completions_url(&settings.base_url),
            api_key: settings.api_key,
            model: settings.model,
            provider: settings.provider,
            timeout: settings.timeout,
        }
    }

    /// Provider label for diagnostics. Nothing branches on this value.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Send one prompt upstream and return the generated text verbatim.
    ///
    /// Exactly one attempt: no retry on any failure. The wait is bounded by
    /// the configured timeout; on expiry the in-flight request is dropped.
    pub async fn generate(&self, prompt: &str) -> Result<String, RelayError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .http
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .build()
            .map_err(|e| {
                error!(provider = %self.provider, error = %e, "failed to build upstream request");
                RelayError::BuildRequest(e)
            })?;

        let response =
            match tokio::time::timeout(self.timeout, self.http.execute(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    error!(
                        provider = %self.provider,
                        url = self.completions_url,
                        error = %e,
                        "upstream request failed"
                    );
                    return Err(RelayError::Transport(e));
                }
                Err(_) => {
                    error!(
                        provider = %self.provider,
                        url = self.completions_url,
                        timeout_seconds = self.timeout.as_secs(),
                        "upstream request timed out"
                    );
                    return Err(RelayError::Timeout(self.timeout.as_secs()));
                }
            };

        let status = response.status();
        if !status.is_success() {
            warn!(
                provider = %self.provider,
                status = status.as_u16(),
                "upstream returned error status"
            );
            return Err(RelayError::UpstreamStatus(status));
        }

        let bytes = response.bytes().await.map_err(RelayError::Transport)?;

        let completion: CompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;

        match completion.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(RelayError::MalformedResponse("empty choices array".into())),
        }
    }
}

/// Completion endpoint for a base URL. The base URL carries no trailing
/// slash, so plain concatenation preserves any base path (e.g. "/openai").
fn completions_url(base_url: &str) -> String {
    format!("{base_url}/v1/chat/completions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_bare_host() {
        assert_eq!(
            completions_url("https://api.example.com"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_keeps_base_path() {
        assert_eq!(
            completions_url("https://api.groq.com/openai"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = CompletionRequest {
            model: "test-model",
            messages: [ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "hello"}],
            })
        );
    }

    #[test]
    fn test_response_ignores_unknown_fields() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 3}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hi");
    }

    #[test]
    fn test_response_missing_content_is_error() {
        let raw = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        assert!(serde_json::from_str::<CompletionResponse>(raw).is_err());
    }
}
