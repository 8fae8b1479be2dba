//! Chat session state: the transcript plus the phase of the current turn.

use hclaudit_core::{Message, Result, SessionId, Transcript};
use serde::Serialize;

/// Where the current turn stands.
///
/// `Answered` and `Failed` are terminal for a turn; the session returns to
/// `Idle` once the outcome has been presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingSubmission,
    RequestInFlight,
    Answered,
    Failed,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingSubmission => "awaiting_submission",
            Self::RequestInFlight => "request_in_flight",
            Self::Answered => "answered",
            Self::Failed => "failed",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::AwaitingSubmission | Self::RequestInFlight)
    }
}

/// One user's conversation with the assistant.
///
/// Lives in memory only; dropping it discards the history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSession {
    id: SessionId,
    transcript: Transcript,
    phase: TurnPhase,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The full transcript, in display order.
    pub fn history(&self) -> &Transcript {
        &self.transcript
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Record a question. Blank input is rejected and changes nothing.
    pub fn append_user(&mut self, text: impl Into<String>) -> Result<&Message> {
        self.transcript.append_user(text)
    }

    /// Record the answer to the pending question.
    pub fn append_assistant(&mut self, text: impl Into<String>) -> Result<&Message> {
        self.transcript.append_assistant(text)
    }

    /// Return to `Idle` once an answered or failed turn has been shown.
    pub fn finish_turn(&mut self) {
        if matches!(self.phase, TurnPhase::Answered | TurnPhase::Failed) {
            self.phase = TurnPhase::Idle;
        }
    }

    /// Start over: new id, empty transcript, idle.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }
}
