//! Request type for the broker protocol.

use serde::{Deserialize, Serialize};

/// The only method a broker server executes.
pub const PROCESS_METHOD: &str = "process";

/// A request from a client.
///
/// Field order matches the wire order: `method`, `parameters`, `stdin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The method to invoke (only `"process"` is defined).
    pub method: String,

    /// Method parameters as a JSON object.
    #[serde(default)]
    pub parameters: serde_json::Value,

    /// Data piped to the command's standard input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
}

impl Request {
    /// Create a `process` request for a shell command line.
    pub fn process(command: impl Into<String>, stdin: Option<String>) -> Self {
        Self {
            method: PROCESS_METHOD.to_string(),
            parameters: serde_json::json!({ "command": command.into() }),
            stdin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::to_vec;

    #[test]
    fn test_process_request_without_stdin() {
        let request = Request::process("ls -la", None);
        let bytes = to_vec(&request).unwrap();
        assert_eq!(
            bytes,
            br#"{"method": "process", "parameters": {"command": "ls -la"}}"#
        );
    }

    #[test]
    fn test_process_request_with_stdin() {
        let request = Request::process("grep Hello", Some("Hello World".to_string()));
        let bytes = to_vec(&request).unwrap();
        assert_eq!(
            bytes,
            br#"{"method": "process", "parameters": {"command": "grep Hello"}, "stdin": "Hello World"}"#
        );
    }

    #[test]
    fn test_request_without_parameters_parses() {
        let request: Request = serde_json::from_str(r#"{"method": "bogus"}"#).unwrap();
        assert_eq!(request.method, "bogus");
        assert!(request.parameters.is_null());
        assert!(request.stdin.is_none());
    }
}
