//! cmdbroker - run shell commands on a remote host over TLS.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cmdbroker::client::Client;
use cmdbroker::config::{Cli, LoggingConfig, Mode, Settings};
use cmdbroker::console::Console;
use cmdbroker::error::BrokerError;
use cmdbroker::prompt::TerminalPrompt;
use cmdbroker::server::Server;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::resolve(cli) {
        Ok(s) => s,
        Err(e) => {
            let message = match e {
                BrokerError::Config { message } => message,
                other => other.to_string(),
            };
            eprintln!("{}: error: {}", NAME, message);
            return ExitCode::from(2);
        }
    };

    init_logging(&settings.logging);
    debug!("Starting {} v{}", NAME, VERSION);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match settings.mode {
        Mode::Server(server_settings) => {
            let server = match Server::new(server_settings, &TerminalPrompt, Console::stdout()) {
                Ok(server) => server,
                Err(BrokerError::EmptyPassword) => {
                    println!("{}", BrokerError::EmptyPassword);
                    return ExitCode::FAILURE;
                }
                Err(BrokerError::Interrupted) => return ExitCode::FAILURE,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };

            match runtime.block_on(server.run()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "Server failed");
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Mode::Client(client_settings) => {
            let client = Client::new(client_settings);
            match runtime.block_on(client.run()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "Request failed");
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
