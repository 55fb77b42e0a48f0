//! TCP listener with TLS termination.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::CommandRegistry;
use crate::config::ServerSettings;
use crate::console::Console;
use crate::error::{BrokerError, BrokerResult, ProtocolErrorKind};
use crate::prompt::Prompt;
use crate::tls::{server_acceptor, CertificateMaterial};

use super::handle_connection;

/// Lifecycle of a [`Server`].
#[derive(Debug, Clone)]
enum ServerState {
    Idle,
    Listening {
        shutdown: CancellationToken,
        local_addr: SocketAddr,
    },
    Stopped,
}

/// TLS command server.
pub struct Server {
    settings: ServerSettings,
    material: CertificateMaterial,
    registry: Arc<CommandRegistry>,
    console: Console,
    state: Mutex<ServerState>,
}

impl Server {
    /// Prepare a server, loading or generating its certificate material.
    ///
    /// Prompts for the key password and any missing certificate subject
    /// fields. Nothing is bound until [`Server::serve`] runs.
    pub fn new(
        settings: ServerSettings,
        prompt: &dyn Prompt,
        console: Console,
    ) -> BrokerResult<Self> {
        let material =
            CertificateMaterial::bootstrap(&settings.address, &settings.tls, prompt, &console)?;

        Ok(Self {
            settings,
            material,
            registry: Arc::new(CommandRegistry::new()),
            console,
            state: Mutex::new(ServerState::Idle),
        })
    }

    /// Configured bind address.
    pub fn address(&self) -> &str {
        &self.settings.address
    }

    /// Configured port (0 means any free port).
    pub fn port(&self) -> u16 {
        self.settings.port
    }

    /// The bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state() {
            ServerState::Listening { local_addr, .. } => Some(*local_addr),
            _ => None,
        }
    }

    /// Whether the accept loop is running.
    pub fn is_listening(&self) -> bool {
        matches!(&*self.state(), ServerState::Listening { .. })
    }

    /// Serve until Ctrl+C.
    pub async fn run(&self) -> BrokerResult<()> {
        self.serve(shutdown_signal()).await
    }

    /// Serve until `interrupt` resolves or [`Server::stop`] is called.
    ///
    /// Failure to build the TLS context (for example a wrong key password)
    /// or to bind is returned before anything is accepted.
    pub async fn serve<F>(&self, interrupt: F) -> BrokerResult<()>
    where
        F: Future<Output = ()>,
    {
        let acceptor = server_acceptor(&self.material)?;

        let listener = TcpListener::bind((self.settings.address.as_str(), self.settings.port))
            .await
            .map_err(|e| {
                BrokerError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to bind {}:{}: {}",
                        self.settings.address, self.settings.port, e
                    ),
                ))
            })?;
        let local_addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        *self.state() = ServerState::Listening {
            shutdown: shutdown.clone(),
            local_addr,
        };

        info!(address = %local_addr, "Server listening");
        self.console.say(format!(
            "Server listening on {}:{}.",
            self.settings.address,
            local_addr.port()
        ));
        self.console.say("Press Ctrl+C to stop.");

        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Accept loop cancelled");
                    break;
                }
                _ = &mut interrupt => {
                    info!("Interrupt received, stopping server");
                    self.stop();
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "New connection accepted");
                            let acceptor = acceptor.clone();
                            let registry = Arc::clone(&self.registry);

                            tokio::spawn(async move {
                                match handle_connection(acceptor, stream, peer, registry).await {
                                    Ok(()) => debug!(peer = %peer, "Connection closed"),
                                    Err(BrokerError::Protocol {
                                        kind: ProtocolErrorKind::ConnectionClosed,
                                    }) => debug!(peer = %peer, "Client disconnected"),
                                    Err(e) => error!(peer = %peer, error = %e, "Connection handler error"),
                                }
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }

        *self.state() = ServerState::Stopped;
        info!("Server stopped");
        Ok(())
    }

    /// Stop a listening server.
    pub fn stop(&self) {
        let shutdown = match &*self.state() {
            ServerState::Listening { shutdown, .. } => Some(shutdown.clone()),
            ServerState::Idle | ServerState::Stopped => None,
        };

        match shutdown {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                self.console.say("Server stopped by user.");
            }
            _ => self.console.say("There is no server running."),
        }
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Resolve on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
