use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::utils::http::build_http_client;
use crate::utils::text::clip;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("OPENAI_API_KEY not found in environment variables")]
    MissingApiKey,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Text of the first choice. When the model declined, `text` holds its
/// refusal message and `refused` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionReply {
    pub text: String,
    pub refused: bool,
}

impl VisionReply {
    pub fn content(text: impl Into<String>) -> Self {
        VisionReply {
            text: text.into(),
            refused: false,
        }
    }

    pub fn refusal(text: impl Into<String>) -> Self {
        VisionReply {
            text: text.into(),
            refused: true,
        }
    }
}

/// One-shot chat completion endpoint accepting an OpenAI-style payload.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    fn provider(&self) -> &str;

    async fn chat_completion(&self, payload: &Value) -> Result<VisionReply>;
}

fn summarize_payload(payload: &Value) -> String {
    let model = payload
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message_count = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| messages.len())
        .unwrap_or(0);
    let response_format = payload
        .pointer("/response_format/type")
        .and_then(|v| v.as_str())
        .unwrap_or("text");
    format!(
        "model={}, messages={}, response_format={}",
        model, message_count, response_format
    )
}

/// Human-readable reason for a failed vision request: the API's own error
/// message when the body carries one, otherwise a clipped copy of the body.
fn api_error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| clip(trimmed, 500))
}

fn extract_message_content(response: &Value) -> Result<VisionReply> {
    let message = response
        .pointer("/choices/0/message")
        .ok_or_else(|| {
            anyhow!(
                "Vision response contained no choices: {}",
                clip(&response.to_string(), 500)
            )
        })?;
    let content = message.get("content").and_then(|v| v.as_str()).unwrap_or("");
    if !content.trim().is_empty() {
        return Ok(VisionReply::content(content));
    }

    let refusal = message.get("refusal").and_then(|v| v.as_str()).unwrap_or("");
    if refusal.trim().is_empty() {
        warn!("Vision response had empty content");
        return Ok(VisionReply::content(content));
    }
    warn!("Vision model refused: {}", clip(refusal, 200));
    Ok(VisionReply::refusal(refusal))
}

/// OpenAI-compatible chat completions client. Built once at startup by
/// [`VisionClient::init`] and shared by reference afterwards.
pub struct VisionClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl VisionClient {
    pub fn init(config: &Config) -> Result<Self, ConfigurationError> {
        let api_key = config.openai_api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }

        let http = build_http_client(config.vision_timeout_seconds)
            .map_err(|err| ConfigurationError::HttpClient(err.to_string()))?;

        let prefix: String = api_key.chars().take(6).collect();
        info!(
            "Vision client initialized (base_url={}, key={}...)",
            config.vision_base_url, prefix
        );

        Ok(VisionClient {
            http,
            api_key: api_key.to_string(),
            base_url: config.vision_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VisionBackend for VisionClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn chat_completion(&self, payload: &Value) -> Result<VisionReply> {
        debug!("Vision request: {}", summarize_payload(payload));

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Vision API error: status={}, body={}", status, clip(&body, 2000));
            let detail = api_error_detail(&body);
            return Err(anyhow!(
                "Vision request failed with status {}: {}",
                status,
                detail
            ));
        }

        let value = response.json::<Value>().await?;
        debug!(
            "Vision response received: {}",
            clip(&value.to_string(), 500)
        );
        extract_message_content(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn init_without_key_is_a_configuration_error() {
        let dir = std::path::Path::new("/tmp");
        let mut config = Config::for_tests(dir);
        config.openai_api_key = "   ".to_string();
        let err = VisionClient::init(&config).err();
        assert_eq!(err, Some(ConfigurationError::MissingApiKey));
    }

    #[test]
    fn init_trims_trailing_slash_from_base_url() {
        let mut config = Config::for_tests(std::path::Path::new("/tmp"));
        config.vision_base_url = "http://localhost:8080/v1/".to_string();
        let client = VisionClient::init(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn error_detail_prefers_api_message() {
        assert_eq!(
            api_error_detail(r#"{"error":{"message":"Incorrect API key provided"}}"#),
            "Incorrect API key provided"
        );
        assert_eq!(api_error_detail(r#"{"message":"quota"}"#), "quota");
        assert_eq!(api_error_detail("  "), "empty response body");
        assert_eq!(api_error_detail("<html>Bad Gateway</html>"), "<html>Bad Gateway</html>");
    }

    #[test]
    fn message_content_reads_first_choice() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"a\":1}" } }]
        });
        assert_eq!(
            extract_message_content(&response).unwrap(),
            VisionReply::content("{\"a\":1}")
        );

        let null_content = json!({ "choices": [{ "message": { "content": null } }] });
        assert_eq!(
            extract_message_content(&null_content).unwrap(),
            VisionReply::content("")
        );

        let refused = json!({
            "choices": [{ "message": {
                "content": null,
                "refusal": "I can't help identify people in images."
            } }]
        });
        let reply = extract_message_content(&refused).unwrap();
        assert!(reply.refused);
        assert_eq!(reply.text, "I can't help identify people in images.");

        assert!(extract_message_content(&json!({ "id": "x" })).is_err());
    }
}
