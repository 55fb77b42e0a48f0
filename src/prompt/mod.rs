//! Interactive prompting.
//!
//! Certificate bootstrap asks for the key password and missing subject
//! fields. It does so through the [`Prompt`] trait so the terminal can be
//! swapped for scripted answers.

mod scripted;
mod terminal;

pub use scripted::ScriptedPrompt;
pub use terminal::TerminalPrompt;

use crate::error::BrokerResult;

/// Source of answers to interactive questions.
///
/// Implementations return [`BrokerError::Interrupted`](crate::error::BrokerError::Interrupted)
/// when the user aborts the prompt.
pub trait Prompt: Send + Sync {
    /// Ask for a line of text, echoing input.
    fn read_line(&self, prompt: &str) -> BrokerResult<String>;

    /// Ask for a secret without echoing input.
    fn read_password(&self, prompt: &str) -> BrokerResult<String>;
}
