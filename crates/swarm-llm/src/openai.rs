use async_trait::async_trait;
use serde_json::json;

use crate::{FinishReason, ProviderAdapter, Request, Response, Usage};
use swarm_types::SwarmError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// ---------------------------------------------------------------------------
// OpenAiAdapter
// ---------------------------------------------------------------------------

/// Adapter for the OpenAI chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiAdapter {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    default_model: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: "gpt-4".to_string(),
        }
    }

    /// Reads `OPENAI_API_KEY`, and `OPENAI_BASE_URL` when set.
    pub fn from_env() -> Result<Self, SwarmError> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| SwarmError::AuthError {
            provider: "openai".into(),
        })?;
        let adapter = Self::new(key);
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.is_empty() => adapter.with_base_url(url),
            _ => adapter,
        })
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(&self, request: &Request) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        body
    }

    /// Takes the first choice; any further choices are ignored.
    fn parse_response(&self, body: serde_json::Value) -> Result<Response, SwarmError> {
        let id = body["id"].as_str().unwrap_or("").to_string();
        let model = body["model"].as_str().unwrap_or("").to_string();

        let choice = body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| SwarmError::ProviderError {
                provider: "openai".into(),
                status: 200,
                message: "Response contained no choices".into(),
                retryable: false,
            })?;

        let text = choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let finish_reason = match choice["finish_reason"].as_str() {
            Some("length") => FinishReason::MaxTokens,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::EndTurn,
        };

        let usage_obj = &body["usage"];
        let input_tokens = usage_obj["prompt_tokens"].as_u64().unwrap_or(0);
        let output_tokens = usage_obj["completion_tokens"].as_u64().unwrap_or(0);
        let total_tokens = usage_obj["total_tokens"]
            .as_u64()
            .unwrap_or(input_tokens + output_tokens);

        Ok(Response {
            id,
            text,
            usage: Usage {
                input_tokens,
                output_tokens,
                total_tokens,
            },
            model,
            finish_reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_error(status: reqwest::StatusCode, body: &str) -> SwarmError {
    let status_u16 = status.as_u16();
    match status_u16 {
        429 => {
            let retry_ms = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["retry_after"].as_f64())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            SwarmError::RateLimited {
                provider: "openai".into(),
                retry_after_ms: retry_ms,
            }
        }
        401 => SwarmError::AuthError {
            provider: "openai".into(),
        },
        500 | 502 | 503 => SwarmError::ProviderError {
            provider: "openai".into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: true,
        },
        _ => SwarmError::ProviderError {
            provider: "openai".into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: false,
        },
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn map_transport_error(e: reqwest::Error) -> SwarmError {
    if e.is_timeout() {
        return SwarmError::RequestTimeout {
            provider: "openai".into(),
            timeout_ms: 0,
        };
    }
    SwarmError::ProviderError {
        provider: "openai".into(),
        status: 0,
        message: e.to_string(),
        retryable: true,
    }
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn complete(&self, request: &Request) -> Result<Response, SwarmError> {
        let body = self.build_request_body(request);

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        let response_body = resp.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_error(status, &response_body));
        }

        let json: serde_json::Value =
            serde_json::from_str(&response_body).map_err(|e| SwarmError::ProviderError {
                provider: "openai".into(),
                status: status.as_u16(),
                message: format!("Failed to parse response JSON: {e}"),
                retryable: false,
            })?;

        self.parse_response(json)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
