//! Resolved settings for a cmdbroker run.

use std::path::PathBuf;

use crate::error::BrokerError;

use super::cli::{Cli, FileConfig};

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub logging: LoggingConfig,
}

/// What this process runs as.
#[derive(Debug, Clone)]
pub enum Mode {
    Server(ServerSettings),
    Client(ClientSettings),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Address to bind; also the certificate's common name.
    pub address: String,
    /// Port to bind (0 picks a free port).
    pub port: u16,
    /// Certificate material settings.
    pub tls: TlsSettings,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Shell command line to run remotely.
    pub command: String,
    /// Server address.
    pub address: String,
    /// Server port.
    pub port: u16,
    /// The only certificate the client trusts.
    pub broker_cert: PathBuf,
}

/// Certificate and key settings for the server.
#[derive(Debug, Clone)]
pub struct TlsSettings {
    /// Path to the PEM certificate.
    pub cert_path: PathBuf,
    /// Path to the encrypted PEM private key.
    pub key_path: PathBuf,
    /// Key password; prompted for when `None`.
    pub password: Option<String>,
    /// Generate a fresh self-signed pair instead of loading one.
    pub generate: bool,
    /// Subject fields for generation; missing ones are prompted for.
    pub subject: SubjectFields,
    /// Validity period of generated certificates.
    pub validity_days: u32,
}

/// Distinguished-name fields of a generated certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFields {
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format ("pretty" or "json").
    pub format: String,
}

// Default value functions
pub fn default_port() -> u16 {
    8889
}

pub fn default_broker_cert() -> PathBuf {
    PathBuf::from("broker-cert.pem")
}

pub fn default_broker_key() -> PathBuf {
    PathBuf::from("broker-key.pem")
}

pub fn default_cert_days() -> u32 {
    365
}

fn default_client_address() -> String {
    "localhost".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Resolve settings from parsed arguments.
    ///
    /// Precedence is command line, then the config file named by
    /// `--config`, then built-in defaults.
    pub fn resolve(cli: Cli) -> Result<Self, BrokerError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load_if_exists(path)?,
            None => FileConfig::default(),
        };
        let settings = Self::merge(cli, file)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge arguments over file values without touching the filesystem.
    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self, BrokerError> {
        let address = cli.address.or(file.address);
        let port = cli.port.or(file.port).unwrap_or_else(default_port);
        let broker_cert = cli
            .broker_cert
            .or(file.broker_cert)
            .unwrap_or_else(default_broker_cert);

        let logging = LoggingConfig {
            level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(default_log_level),
            format: cli
                .log_format
                .or(file.log_format)
                .unwrap_or_else(default_log_format),
        };

        let generate = cli.generate_cert_and_key || file.generate_cert_and_key.unwrap_or(false);

        let mode = if cli.server || file.server.unwrap_or(false) {
            let address = address.ok_or_else(|| BrokerError::Config {
                message: "the following arguments are required: --address".to_string(),
            })?;
            Mode::Server(ServerSettings {
                address,
                port,
                tls: TlsSettings {
                    cert_path: broker_cert,
                    key_path: cli
                        .broker_key
                        .or(file.broker_key)
                        .unwrap_or_else(default_broker_key),
                    password: cli.password.or(file.password),
                    generate,
                    subject: SubjectFields {
                        country: cli.cert_country.or(file.cert_country),
                        state: cli.cert_state.or(file.cert_state),
                        locality: cli.cert_locality.or(file.cert_locality),
                        organization: cli.cert_org.or(file.cert_org),
                    },
                    validity_days: cli.cert_days.or(file.cert_days).unwrap_or_else(default_cert_days),
                },
            })
        } else {
            let command = cli.command.or(file.command).ok_or_else(|| BrokerError::Config {
                message: "You must provide a command when running in client mode".to_string(),
            })?;
            Mode::Client(ClientSettings {
                command,
                address: address.unwrap_or_else(default_client_address),
                port,
                broker_cert,
            })
        };

        Ok(Self { mode, logging })
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), BrokerError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(BrokerError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(BrokerError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        match &self.mode {
            Mode::Client(client) => {
                if !client.broker_cert.exists() {
                    return Err(BrokerError::Config {
                        message: "Broker certificate file not found".to_string(),
                    });
                }
            }
            Mode::Server(server) if !server.tls.generate => {
                if !server.tls.cert_path.exists() {
                    return Err(BrokerError::Config {
                        message: "Broker certificate file not found".to_string(),
                    });
                }
                if !server.tls.key_path.exists() {
                    return Err(BrokerError::Config {
                        message: "Broker key file not found".to_string(),
                    });
                }
            }
            Mode::Server(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cmdbroker").chain(args.iter().copied()))
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_port(), 8889);
        assert_eq!(default_broker_cert(), PathBuf::from("broker-cert.pem"));
        assert_eq!(default_broker_key(), PathBuf::from("broker-key.pem"));
        assert_eq!(default_cert_days(), 365);
        assert_eq!(LoggingConfig::default().level, "warn");
    }

    #[test]
    fn test_server_mode_with_config() {
        let cli = parse(&["--server", "--address", "127.0.0.1", "--generate-cert-and-key"]);
        let file = FileConfig {
            broker_cert: Some(PathBuf::from("diff-cert.pem")),
            address: Some("localhost".to_string()),
            cert_country: Some("US".to_string()),
            cert_state: Some("AZ".to_string()),
            cert_locality: Some("Phoenix".to_string()),
            cert_org: Some("Vandalay Industries".to_string()),
            cert_days: Some(30),
            ..FileConfig::default()
        };

        let settings = Settings::merge(cli, file).unwrap();
        let Mode::Server(server) = settings.mode else {
            panic!("expected server mode");
        };
        assert_eq!(server.address, "127.0.0.1");
        assert_eq!(server.port, 8889);
        assert_eq!(server.tls.cert_path, PathBuf::from("diff-cert.pem"));
        assert_eq!(server.tls.key_path, PathBuf::from("broker-key.pem"));
        assert_eq!(server.tls.validity_days, 30);
        assert!(server.tls.generate);
        assert!(server.tls.password.is_none());
        assert_eq!(
            server.tls.subject,
            SubjectFields {
                country: Some("US".to_string()),
                state: Some("AZ".to_string()),
                locality: Some("Phoenix".to_string()),
                organization: Some("Vandalay Industries".to_string()),
            }
        );
    }

    #[test]
    fn test_server_mode_without_address() {
        let err = Settings::merge(parse(&["--server"]), FileConfig::default()).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("the following arguments are required: --address"));
    }

    #[test]
    fn test_server_mode_with_missing_key_file() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "").unwrap();
        let key = dir.path().join("test-key.pem");

        let cli = parse(&[
            "--server",
            "--address",
            "127.0.0.1",
            "--broker-cert",
            cert.to_str().unwrap(),
            "--broker-key",
            key.to_str().unwrap(),
        ]);
        let err = Settings::resolve(cli).unwrap_err();
        assert!(err.to_string().ends_with("Broker key file not found"));
    }

    #[test]
    fn test_server_generation_skips_file_checks() {
        let cli = parse(&[
            "--server",
            "--address",
            "127.0.0.1",
            "--broker-cert",
            "/nonexistent/cert.pem",
            "--generate-cert-and-key",
        ]);
        assert!(Settings::resolve(cli).is_ok());
    }

    #[test]
    fn test_client_mode_with_command() {
        let settings =
            Settings::merge(parse(&["ls -la", "--address", "127.0.0.1"]), FileConfig::default())
                .unwrap();
        let Mode::Client(client) = settings.mode else {
            panic!("expected client mode");
        };
        assert_eq!(client.command, "ls -la");
        assert_eq!(client.address, "127.0.0.1");
        assert_eq!(client.port, 8889);
        assert_eq!(client.broker_cert, PathBuf::from("broker-cert.pem"));
    }

    #[test]
    fn test_client_mode_default_address() {
        let settings = Settings::merge(parse(&["uptime"]), FileConfig::default()).unwrap();
        let Mode::Client(client) = settings.mode else {
            panic!("expected client mode");
        };
        assert_eq!(client.address, "localhost");
    }

    #[test]
    fn test_client_mode_without_command() {
        let err = Settings::merge(parse(&["--address", "127.0.0.1"]), FileConfig::default())
            .unwrap_err();
        assert!(err
            .to_string()
            .ends_with("You must provide a command when running in client mode"));
    }

    #[test]
    fn test_client_mode_with_missing_cert_file() {
        let cli = parse(&[
            "ls -la",
            "--address",
            "127.0.0.1",
            "--broker-cert",
            "/nonexistent/test-cert.pem",
        ]);
        let err = Settings::resolve(cli).unwrap_err();
        assert!(err.to_string().ends_with("Broker certificate file not found"));
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = FileConfig {
            port: Some(7000),
            log_level: Some("debug".to_string()),
            ..FileConfig::default()
        };
        let settings = Settings::merge(parse(&["ls", "--port", "7001"]), file).unwrap();
        let Mode::Client(client) = &settings.mode else {
            panic!("expected client mode");
        };
        assert_eq!(client.port, 7001);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_file_flags_select_server_mode() {
        let file = FileConfig {
            server: Some(true),
            generate_cert_and_key: Some(true),
            address: Some("127.0.0.1".to_string()),
            ..FileConfig::default()
        };
        let settings = Settings::merge(parse(&[]), file).unwrap();
        let Mode::Server(server) = settings.mode else {
            panic!("expected server mode");
        };
        assert_eq!(server.address, "127.0.0.1");
        assert!(server.tls.generate);
    }

    #[test]
    fn test_file_command_used_in_client_mode() {
        let file = FileConfig {
            command: Some("uptime".to_string()),
            ..FileConfig::default()
        };
        let settings = Settings::merge(parse(&["--port", "7001"]), file).unwrap();
        let Mode::Client(client) = settings.mode else {
            panic!("expected client mode");
        };
        assert_eq!(client.command, "uptime");
    }

    #[test]
    fn test_invalid_log_format() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "").unwrap();

        let cli = parse(&[
            "ls",
            "--broker-cert",
            cert.to_str().unwrap(),
            "--log-format",
            "xml",
        ]);
        assert!(matches!(
            Settings::resolve(cli),
            Err(BrokerError::Config { .. })
        ));
    }
}
