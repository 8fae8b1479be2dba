//! The compliance assistant.
//!
//! Each turn follows the same path:
//!
//! 1. **Receive** a question from the dashboard or the CLI
//! 2. **Record** it in the [`ChatSession`] (blank questions stop here)
//! 3. **Compose** the prompt from the memoised matrix context and the question
//! 4. **Send** it to the configured provider
//! 5. **Record** the answer, or surface the error and leave the question unanswered
//!
//! [`Assistant::activate`] is the gate in front of all of this: it refuses to
//! build an assistant while matrix data is missing.

pub mod assistant;
pub mod prompt;
pub mod session;
#[cfg(test)]
mod test_helpers;

pub use assistant::{Assistant, ModelSettings, TurnOutcome, configuration_error};
pub use prompt::PromptComposer;
pub use session::{ChatSession, TurnPhase};
