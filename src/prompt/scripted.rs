//! Prompt answered from a fixed list.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{BrokerError, BrokerResult};

use super::Prompt;

/// Answers prompts in order from a prepared list and records each question.
///
/// Once the answers run out, further prompts fail as if the user had
/// interrupted them.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    /// Create a prompt that will give `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompt that has no answers; any question counts as an interrupt.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every prompt text shown so far, in order.
    pub fn asked(&self) -> Vec<String> {
        match self.asked.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn answer(&self, prompt: &str) -> BrokerResult<String> {
        match self.asked.lock() {
            Ok(mut guard) => guard.push(prompt.to_string()),
            Err(poisoned) => poisoned.into_inner().push(prompt.to_string()),
        }
        let next = match self.answers.lock() {
            Ok(mut guard) => guard.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.ok_or(BrokerError::Interrupted)
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&self, prompt: &str) -> BrokerResult<String> {
        self.answer(prompt)
    }

    fn read_password(&self, prompt: &str) -> BrokerResult<String> {
        self.answer(prompt)
    }
}
