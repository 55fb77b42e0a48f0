//! Command-line arguments and the JSON configuration file.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::BrokerError;

/// Run as server or client.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "cmdbroker", version, about = "Run as server or client.")]
pub struct Cli {
    /// Command line to run on the server (client mode).
    pub command: Option<String>,

    /// JSON configuration file; ignored if it does not exist.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run as the server.
    #[arg(long)]
    pub server: bool,

    /// Address to listen on (server) or connect to (client).
    #[arg(long)]
    pub address: Option<String>,

    /// TCP port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Broker certificate (PEM).
    #[arg(long)]
    pub broker_cert: Option<PathBuf>,

    /// Broker private key (encrypted PKCS#8 PEM).
    #[arg(long)]
    pub broker_key: Option<PathBuf>,

    /// Certificate subject country.
    #[arg(long)]
    pub cert_country: Option<String>,

    /// Certificate subject state or province.
    #[arg(long)]
    pub cert_state: Option<String>,

    /// Certificate subject locality.
    #[arg(long)]
    pub cert_locality: Option<String>,

    /// Certificate subject organization.
    #[arg(long)]
    pub cert_org: Option<String>,

    /// Certificate validity in days.
    #[arg(long)]
    pub cert_days: Option<u32>,

    /// Generate a self-signed certificate and encrypted key, then serve.
    #[arg(long)]
    pub generate_cert_and_key: bool,

    /// Password for the private key; prompted for when absent.
    #[arg(long)]
    pub password: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (pretty or json).
    #[arg(long)]
    pub log_format: Option<String>,
}

/// Contents of the JSON configuration file.
///
/// Keys are the long option names: `{"broker-cert": "cert.pem", "cert-days": 30}`.
/// Values act as defaults beneath the command line, flags included
/// (`"server": true`). Unrecognised keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub command: Option<String>,
    pub server: Option<bool>,
    pub generate_cert_and_key: Option<bool>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub broker_cert: Option<PathBuf>,
    pub broker_key: Option<PathBuf>,
    pub cert_country: Option<String>,
    pub cert_state: Option<String>,
    pub cert_locality: Option<String>,
    pub cert_org: Option<String>,
    pub cert_days: Option<u32>,
    pub password: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl FileConfig {
    /// Load the file at `path`, or an empty config if it does not exist.
    pub fn load_if_exists<P: AsRef<Path>>(path: P) -> Result<Self, BrokerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| BrokerError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| BrokerError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_client_invocation() {
        let cli = Cli::parse_from(["cmdbroker", "ls -la", "--address", "127.0.0.1"]);
        assert_eq!(cli.command.as_deref(), Some("ls -la"));
        assert_eq!(cli.address.as_deref(), Some("127.0.0.1"));
        assert!(!cli.server);
    }

    #[test]
    fn test_parse_server_invocation() {
        let cli = Cli::parse_from([
            "cmdbroker",
            "--server",
            "--address",
            "0.0.0.0",
            "--port",
            "9000",
            "--generate-cert-and-key",
            "--cert-days",
            "30",
        ]);
        assert!(cli.server);
        assert!(cli.generate_cert_and_key);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.cert_days, Some(30));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_file_config_missing_file() {
        let config = FileConfig::load_if_exists("/nonexistent/cmdbroker.json").unwrap();
        assert!(config.address.is_none());
    }

    #[test]
    fn test_file_config_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"broker-cert": "diff-cert.pem", "address": "localhost", "cert-org": "Vandalay Industries", "cert-days": 30}"#,
        )
        .unwrap();

        let config = FileConfig::load_if_exists(&path).unwrap();
        assert_eq!(config.broker_cert, Some(PathBuf::from("diff-cert.pem")));
        assert_eq!(config.address.as_deref(), Some("localhost"));
        assert_eq!(config.cert_org.as_deref(), Some("Vandalay Industries"));
        assert_eq!(config.cert_days, Some(30));
    }

    #[test]
    fn test_file_config_flags_and_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"server": true, "generate-cert-and-key": true, "config": "other.json", "verbose": 1}"#,
        )
        .unwrap();

        let config = FileConfig::load_if_exists(&path).unwrap();
        assert_eq!(config.server, Some(true));
        assert_eq!(config.generate_cert_and_key, Some(true));
        assert!(config.command.is_none());
    }

    #[test]
    fn test_file_config_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            FileConfig::load_if_exists(&path),
            Err(BrokerError::Config { .. })
        ));
    }
}
