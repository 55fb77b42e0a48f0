//! Error types for cmdbroker.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the broker.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The certificate or key file is missing and generation was not requested.
    #[error("SSL files do not exist. Expected certificate at {} and key at {}", cert.display(), key.display())]
    SslFilesMissing { cert: PathBuf, key: PathBuf },

    /// The key password was entered empty.
    #[error("Password cannot be empty.")]
    EmptyPassword,

    /// An interactive prompt was aborted by the user.
    #[error("Prompt interrupted")]
    Interrupted,

    /// Certificate or key generation failed.
    #[error("Certificate error: {message}")]
    Certificate { message: String },

    /// TLS context setup or handshake failed.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Command dispatch errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// Wire protocol errors.
    #[error("Protocol error: {kind}")]
    Protocol { kind: ProtocolErrorKind },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Unsupported method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Missing required parameter: {param}")]
    MissingParameter { param: String },

    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },
}

/// Protocol error kinds.
#[derive(Error, Debug)]
pub enum ProtocolErrorKind {
    #[error("Payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid length prefix: {prefix:?}")]
    InvalidLengthPrefix { prefix: String },

    #[error("Truncated frame: expected {expected} payload bytes")]
    TruncatedFrame { expected: usize },

    #[error("Invalid JSON payload: {message}")]
    InvalidJson { message: String },

    #[error("Connection closed")]
    ConnectionClosed,
}

impl BrokerError {
    /// Shorthand for a protocol error of the given kind.
    pub fn protocol(kind: ProtocolErrorKind) -> Self {
        Self::Protocol { kind }
    }

    /// Shorthand for a command error of the given kind.
    pub fn command(kind: CommandErrorKind) -> Self {
        Self::Command { kind }
    }
}

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_files_missing_message_prefix() {
        let err = BrokerError::SslFilesMissing {
            cert: PathBuf::from("cert.pem"),
            key: PathBuf::from("key.pem"),
        };
        assert!(err.to_string().starts_with("SSL files do not exist."));
        assert!(err.to_string().contains("cert.pem"));
    }

    #[test]
    fn test_empty_password_message() {
        assert_eq!(BrokerError::EmptyPassword.to_string(), "Password cannot be empty.");
    }
}
