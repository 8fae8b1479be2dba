//! Provider selection: builds the configured backend from `AppConfig`.

use std::sync::Arc;

use hclaudit_config::AppConfig;
use hclaudit_core::error::ProviderError;
use hclaudit_core::provider::Provider;
use tracing::debug;

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.provider`.
///
/// Gemini is native; every other name goes through the OpenAI-compatible
/// client. A per-provider `api_url` overrides the built-in endpoint.
/// Fails with `NotConfigured` when a hosted provider has no API key, or
/// when the name has neither a built-in endpoint nor a configured `api_url`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let api_url = config
        .providers
        .get(name)
        .and_then(|p| p.api_url.clone());
    let api_key = config.provider_api_key();

    debug!(provider = name, custom_url = api_url.is_some(), "Building provider");

    if name == "gemini" {
        let key = api_key.ok_or_else(|| {
            ProviderError::NotConfigured(
                "no Gemini API key; set GEMINI_API_KEY or api_key in config.toml".into(),
            )
        })?;
        let mut provider = GeminiProvider::new(key)?;
        if let Some(url) = api_url {
            provider = provider.with_base_url(url);
        }
        return Ok(Arc::new(provider));
    }

    let base_url = api_url
        .or_else(|| default_base_url(name))
        .ok_or_else(|| ProviderError::NotConfigured(format!("unknown provider '{name}'")))?;
    let api_key = match api_key {
        Some(key) => key,
        None if is_local(name) => name.to_string(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'"
            )));
        }
    };

    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)?))
}

/// Providers that run on the local machine and need no key.
pub fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
