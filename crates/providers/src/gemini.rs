//! Google Gemini provider (`generateContent` REST API).
//!
//! Sends the prompt as a single non-streaming request and joins the text
//! parts of the first candidate into the answer.

use async_trait::async_trait;
use hclaudit_core::error::ProviderError;
use hclaudit_core::message::{Message, Role};
use hclaudit_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http_client;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider against the public Gemini endpoint.
    ///
    /// Fails with `NotConfigured` when the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini requires an API key (set GEMINI_API_KEY)".into(),
            ));
        }

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key,
            client: http_client()?,
        })
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Convert our Message types to Gemini `contents`.
    fn to_api_contents(messages: &[Message]) -> Vec<ApiContent> {
        messages
            .iter()
            .map(|m| ApiContent {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "model".into(),
                },
                parts: vec![ApiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect()
    }

    fn to_api_request(request: &ProviderRequest) -> GenerateRequest {
        let generation_config = (request.temperature.is_some() || request.max_tokens.is_some())
            .then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            });

        GenerateRequest {
            contents: Self::to_api_contents(&request.messages),
            generation_config,
        }
    }

    /// Extract the answer from a successful response body.
    fn into_response(
        api: GenerateResponse,
        requested_model: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let Some(candidate) = api.candidates.into_iter().next() else {
            return Err(match api.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => ProviderError::Blocked(reason),
                None => ProviderError::MalformedResponse("No candidates in response".into()),
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            return Err(if matches!(reason.as_str(), "SAFETY" | "RECITATION" | "BLOCKLIST") {
                ProviderError::Blocked(reason)
            } else {
                ProviderError::MalformedResponse("Candidate has no text".into())
            });
        }

        let usage = api.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            text,
            usage,
            model: api
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

/// Map a non-200 Gemini reply to a provider error.
fn error_for_status(status: u16, body: &str, model: &str) -> ProviderError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .unwrap_or_else(|| body.to_string());
    let invalid_key = parsed
        .as_ref()
        .is_some_and(|b| b.error.details_mention("API_KEY_INVALID"));

    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(message),
        400 if invalid_key => ProviderError::AuthenticationFailed(message),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code: status,
            message,
        },
    }
}

#[async_trait]
impl hclaudit_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = Self::to_api_request(&request);

        debug!(
            provider = "gemini",
            model = %request.model,
            prompt_chars = request.messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(error_for_status(status, &error_body, &request.model));
        }

        let api_response: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse(format!(
                    "Failed to parse response: {e}"
                )))?;

        Self::into_response(api_response, &request.model)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(crate::transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ApiErrorDetail {
    fn details_mention(&self, reason: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.get("reason").and_then(|r| r.as_str()) == Some(reason))
    }
}
