//! # hclaudit Core
//!
//! Domain types, traits, and error definitions for the hclaudit compliance
//! assistant. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! - [`message`] — role-tagged messages and the append-only [`Transcript`]
//! - [`provider`] — the [`Provider`] trait every generative-model backend implements
//! - [`error`] — the error taxonomy shared by the whole workspace

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{DataError, Error, ProviderError, Result};
pub use message::{Message, Role, SessionId, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
