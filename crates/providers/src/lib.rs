//! Generative-model providers for hclaudit.
//!
//! All providers implement the `hclaudit_core::Provider` trait.
//! `build_from_config` selects the backend named in the configuration.

use std::time::Duration;

use hclaudit_core::error::ProviderError;

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;

/// Upper bound on a single generation request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Network(format!("failed to create HTTP client: {e}")))
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}
