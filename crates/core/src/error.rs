//! Error types for the hclaudit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is the
//! taxonomy surfaced to the user.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all hclaudit operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Startup gating ---
    #[error("Matrix data unavailable: {0}")]
    DataUnavailable(#[from] DataError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // --- Turn level ---
    #[error("The question is empty")]
    EmptyInput,

    #[error("AI service error: {0}")]
    Transport(#[from] ProviderError),

    #[error("Assistant reply has no pending user question")]
    UnpairedReply,

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error blocks the chat workflow entirely (startup gating)
    /// rather than failing a single turn.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Error::DataUnavailable(_) | Error::Configuration { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the generative-model adapter.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response blocked by the provider: {0}")]
    Blocked(String),
}

/// Failures loading the matrix tables.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("missing file(s): {}", display_paths(.0))]
    Missing(Vec<PathBuf>),

    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
