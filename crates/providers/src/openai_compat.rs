//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and any endpoint exposing
//! `/v1/chat/completions`. Used when the dashboard is pointed away from Gemini.

use async_trait::async_trait;
use hclaudit_core::error::ProviderError;
use hclaudit_core::message::{Message, Role};
use hclaudit_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http_client;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http_client()?,
        })
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                },
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn to_api_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    fn into_response(api: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let text = choice.message.content.unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "Choice has no content".into(),
            ));
        }

        let usage = api.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            text,
            usage,
            model: api.model,
        })
    }
}

#[async_trait]
impl hclaudit_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::to_api_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse response: {e}"))
        })?;

        Self::into_response(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(crate::transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hclaudit_core::Provider;

    #[test]
    fn convenience_constructors() {
        let p = OpenAiCompatProvider::openrouter("sk-test").unwrap();
        assert_eq!(p.name(), "openrouter");
        assert_eq!(p.base_url, "https://openrouter.ai/api/v1");

        let p = OpenAiCompatProvider::openai("sk-test").unwrap();
        assert_eq!(p.base_url, "https://api.openai.com/v1");

        let p = OpenAiCompatProvider::ollama(Some("http://gpu-box:11434/v1/")).unwrap();
        assert_eq!(p.base_url, "http://gpu-box:11434/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::user("Hello"), Message::assistant("Hi there!")];
        let api_msgs = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_msgs.len(), 2);
        assert_eq!(api_msgs[0].role, "user");
        assert_eq!(api_msgs[1].role, "assistant");
        assert_eq!(api_msgs[1].content.as_deref(), Some("Hi there!"));
    }

    #[test]
    fn body_omits_unset_sampling() {
        let body = OpenAiCompatProvider::to_api_body(&ProviderRequest::prompt("gpt-4o", "hola"));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());

        let body = OpenAiCompatProvider::to_api_body(
            &ProviderRequest::prompt("gpt-4o", "hola").with_max_tokens(Some(512)),
        );
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn parse_api_response() {
        let data = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
            "model": "gpt-4o"
        }"#;
        let api: ApiResponse = serde_json::from_str(data).unwrap();
        let resp = OpenAiCompatProvider::into_response(api).unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.model, "gpt-4o");
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn empty_choices_are_malformed() {
        let api: ApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiCompatProvider::into_response(api),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
