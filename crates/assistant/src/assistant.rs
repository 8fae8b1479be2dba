//! Turn orchestration: the startup gate and the per-question flow.

use std::sync::Arc;
use std::time::Instant;

use hclaudit_config::AppConfig;
use hclaudit_core::error::{Error, ProviderError, Result};
use hclaudit_core::provider::{Provider, ProviderRequest, Usage};
use hclaudit_matrix::{MatrixContext, MatrixStore, check};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::prompt::PromptComposer;
use crate::session::{ChatSession, TurnPhase};

/// Model name and sampling settings sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A successfully answered question.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub elapsed_ms: u64,
}

/// The compliance assistant.
///
/// Only exists once the matrix data has loaded and a provider has been
/// built, so holding one means chat is allowed.
pub struct Assistant {
    store: Arc<MatrixStore>,
    provider: Arc<dyn Provider>,
    settings: ModelSettings,
    composer: PromptComposer,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    /// Open the chat: every matrix file must exist and parse.
    ///
    /// Loading here also warms the memoised context for later turns.
    pub async fn activate(
        store: Arc<MatrixStore>,
        provider: Arc<dyn Provider>,
        settings: ModelSettings,
    ) -> Result<Self> {
        let files = check::verify(&store.paths());
        if !files.ok {
            warn!(missing = ?files.missing, "Chat blocked: matrix files missing");
            return Err(hclaudit_core::DataError::Missing(files.missing).into());
        }

        let context = store.load().await.inspect_err(|e| {
            warn!(error = %e, "Chat blocked: matrix data could not be loaded");
        })?;

        info!(
            provider = provider.name(),
            model = %settings.model,
            context_chars = context.len(),
            "Assistant ready"
        );

        Ok(Self {
            store,
            provider,
            settings,
            composer: PromptComposer::new(),
        })
    }

    /// Build the configured provider, then run the data gate.
    ///
    /// Missing data wins over missing credentials, so the engineer fixes
    /// the files first.
    pub async fn from_config(config: &AppConfig, store: Arc<MatrixStore>) -> Result<Self> {
        match hclaudit_providers::build_from_config(config) {
            Ok(provider) => {
                Self::activate(store, provider, ModelSettings::from_config(config)).await
            }
            Err(e) => {
                let files = check::verify(&store.paths());
                if !files.ok {
                    return Err(hclaudit_core::DataError::Missing(files.missing).into());
                }
                warn!(error = %e, "Chat blocked: provider not configured");
                Err(configuration_error(e))
            }
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// The memoised matrix text every prompt embeds.
    pub async fn context(&self) -> Result<MatrixContext> {
        Ok(self.store.load().await?)
    }

    /// Answer one question.
    ///
    /// Blank input fails with `EmptyInput` before anything is recorded or
    /// sent. A provider failure returns `Transport` and leaves the question
    /// in the history without an answer; the next call tries again.
    pub async fn submit(&self, session: &mut ChatSession, question: &str) -> Result<TurnOutcome> {
        session.set_phase(TurnPhase::AwaitingSubmission);

        if question.trim().is_empty() {
            session.set_phase(TurnPhase::Idle);
            return Err(Error::EmptyInput);
        }

        let context = match self.store.load().await {
            Ok(context) => context,
            Err(e) => {
                session.set_phase(TurnPhase::Idle);
                return Err(e.into());
            }
        };

        session.append_user(question)?;
        let prompt = self.composer.compose(&context, question);
        let request = ProviderRequest::prompt(&self.settings.model, prompt)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        info!(
            session = %session.id(),
            provider = self.provider.name(),
            model = %self.settings.model,
            turn = session.history().len(),
            "Submitting question"
        );
        session.set_phase(TurnPhase::RequestInFlight);

        let started = Instant::now();
        let result = self.provider.complete(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                session.append_assistant(response.text.clone())?;
                session.set_phase(TurnPhase::Answered);
                debug!(
                    elapsed_ms,
                    answer_chars = response.text.len(),
                    tokens = response.usage.map(|u| u.total_tokens),
                    "Question answered"
                );
                Ok(TurnOutcome {
                    answer: response.text,
                    model: response.model,
                    usage: response.usage,
                    elapsed_ms,
                })
            }
            Err(e) => {
                session.set_phase(TurnPhase::Failed);
                warn!(elapsed_ms, error = %e, "Question failed");
                Err(Error::Transport(e))
            }
        }
    }
}

/// Provider construction failures are configuration problems.
pub fn configuration_error(e: ProviderError) -> Error {
    Error::Configuration {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, write_matrices};
    use hclaudit_config::DataConfig;
    use hclaudit_core::{DataError, Role};

    async fn ready(provider: Arc<ScriptedProvider>) -> (tempfile::TempDir, Arc<MatrixStore>, Assistant) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MatrixStore::from_config(&write_matrices(dir.path())));
        let assistant = Assistant::activate(store.clone(), provider, ModelSettings::new("mock-model"))
            .await
            .unwrap();
        (dir, store, assistant)
    }

    #[tokio::test]
    async fn answered_turn_appends_pair() {
        let provider = Arc::new(ScriptedProvider::answers(&["Equipos: B-110, TK-201"]));
        let (_dir, _store, assistant) = ready(provider.clone()).await;
        let mut session = ChatSession::new();

        let outcome = assistant
            .submit(&mut session, "Lista los equipos de la Sección 1")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Equipos: B-110, TK-201");
        assert_eq!(session.phase(), TurnPhase::Answered);
        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);

        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.contains("Matriz 1:"));
        assert!(prompt.contains("What-If:"));
        assert!(prompt.contains("Pregunta del usuario: Lista los equipos de la Sección 1"));
    }

    #[tokio::test]
    async fn blank_question_never_reaches_provider() {
        let provider = Arc::new(ScriptedProvider::answers(&[]));
        let (_dir, _store, assistant) = ready(provider.clone()).await;
        let mut session = ChatSession::new();

        for blank in ["", "   ", "\t\n"] {
            assert!(matches!(
                assistant.submit(&mut session, blank).await,
                Err(Error::EmptyInput)
            ));
        }
        assert!(session.history().is_empty());
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_not_sticky() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::Network("connection reset".into())),
            Ok("Respuesta".into()),
        ]));
        let (_dir, _store, assistant) = ready(provider.clone()).await;
        let mut session = ChatSession::new();

        let err = assistant.submit(&mut session, "primera").await.unwrap_err();
        assert!(matches!(err, Error::Transport(ProviderError::Network(_))));
        assert_eq!(session.phase(), TurnPhase::Failed);
        assert_eq!(session.history().len(), 1);
        assert!(session.history().awaiting_reply());

        assistant.submit(&mut session, "segunda").await.unwrap();
        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::User, Role::Assistant]);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn every_turn_uses_the_same_context() {
        let provider = Arc::new(ScriptedProvider::answers(&["a", "b", "c"]));
        let (_dir, store, assistant) = ready(provider.clone()).await;
        let mut session = ChatSession::new();

        let before = assistant.context().await.unwrap();
        for q in ["uno", "dos", "tres"] {
            assistant.submit(&mut session, q).await.unwrap();
        }
        let after = assistant.context().await.unwrap();

        assert!(before.ptr_eq(&after));
        assert_eq!(store.load_count(), 1);

        let prompts = provider.prompts();
        let strip = |p: &str, q: &str| p.replace(&format!("Pregunta del usuario: {q}"), "");
        assert_eq!(strip(&prompts[0], "uno"), strip(&prompts[2], "tres"));
    }

    #[tokio::test]
    async fn only_latest_question_is_sent() {
        let provider = Arc::new(ScriptedProvider::answers(&["a", "b"]));
        let (_dir, _store, assistant) = ready(provider.clone()).await;
        let mut session = ChatSession::new();

        assistant.submit(&mut session, "¿Qué es el B-110?").await.unwrap();
        assistant.submit(&mut session, "¿Y el TK-201?").await.unwrap();

        let last = provider.last_prompt().unwrap();
        assert!(last.contains("¿Y el TK-201?"));
        assert!(!last.contains("¿Qué es el B-110?"));
    }

    #[tokio::test]
    async fn missing_matrix_blocks_activation() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_matrices(dir.path());
        std::fs::remove_file(&data.matrix_paths()[1]).unwrap();
        let store = Arc::new(MatrixStore::from_config(&data));
        let provider = Arc::new(ScriptedProvider::answers(&[]));

        let err = Assistant::activate(store.clone(), provider.clone(), ModelSettings::new("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(DataError::Missing(ref p)) if p.len() == 1));
        assert!(err.is_blocking());
        assert_eq!(store.load_count(), 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn missing_key_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_matrices(dir.path());
        let config = AppConfig {
            api_key: None,
            data: data.clone(),
            ..AppConfig::default()
        };
        let store = Arc::new(MatrixStore::from_config(&config.data));

        let err = Assistant::from_config(&config, store).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn missing_data_reported_before_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            api_key: None,
            data: DataConfig {
                dir: dir.path().to_path_buf(),
                ..DataConfig::default()
            },
            ..AppConfig::default()
        };
        let store = Arc::new(MatrixStore::from_config(&config.data));

        let err = Assistant::from_config(&config, store).await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn from_config_with_key_activates() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            api_key: Some("AIza-test".into()),
            data: write_matrices(dir.path()),
            ..AppConfig::default()
        };
        let store = Arc::new(MatrixStore::from_config(&config.data));

        let assistant = Assistant::from_config(&config, store.clone()).await.unwrap();
        assert_eq!(assistant.provider_name(), "gemini");
        assert_eq!(assistant.settings().model, "gemini-1.5-flash");
        assert!(store.is_loaded());
    }
}
