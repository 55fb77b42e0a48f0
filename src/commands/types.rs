//! Command types: parameters, results, and execution context.

use std::net::SocketAddr;

use uuid::Uuid;

use crate::error::{BrokerError, CommandErrorKind};
use crate::executor::SubprocessResult;

/// Wrapper around request parameters with helper methods.
#[derive(Debug, Clone)]
pub struct CommandParams {
    inner: serde_json::Value,
}

impl CommandParams {
    /// Create new command parameters from a JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { inner: value }
    }

    /// Get a required string parameter.
    pub fn get_string(&self, key: &str) -> Result<String, BrokerError> {
        self.get_optional_string(key).ok_or_else(|| missing(key))
    }

    /// Get an optional string parameter.
    pub fn get_optional_string(&self, key: &str) -> Option<String> {
        self.inner.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
    }

    /// Require that a string parameter exists (for validation).
    pub fn require_string(&self, key: &str) -> Result<(), BrokerError> {
        if self.inner.get(key).and_then(|v| v.as_str()).is_some() {
            Ok(())
        } else {
            Err(missing(key))
        }
    }
}

fn missing(key: &str) -> BrokerError {
    BrokerError::command(CommandErrorKind::MissingParameter {
        param: key.to_string(),
    })
}

/// Result of command execution.
///
/// `output` is written verbatim to the connection.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Bytes sent back to the client.
    pub output: Vec<u8>,
    /// Exit code of the underlying process, when there was one.
    pub exit_code: Option<i32>,
}

impl From<SubprocessResult> for CommandResult {
    fn from(result: SubprocessResult) -> Self {
        Self {
            output: result.stdout,
            exit_code: result.exit_code,
        }
    }
}

/// Execution context for a command.
///
/// Contains metadata about the request and the connected peer.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique identifier for this request, used in logs.
    pub request_id: Uuid,
    /// Address of the connected peer, if known.
    pub peer: Option<SocketAddr>,
    /// The method being executed.
    pub method: String,
    /// Data to pipe into the command's standard input.
    pub stdin: Option<String>,
}

impl ExecutionContext {
    /// Create a new execution context.
    pub fn new(
        request_id: Uuid,
        peer: Option<SocketAddr>,
        method: String,
        stdin: Option<String>,
    ) -> Self {
        Self {
            request_id,
            peer,
            method,
            stdin,
        }
    }
}
