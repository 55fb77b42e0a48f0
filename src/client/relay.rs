//! One-shot request relay.

use std::io;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::ClientSettings;
use crate::error::{BrokerError, BrokerResult};
use crate::protocol::{Frame, Request};
use crate::tls::{client_connector, server_name, TrustPolicy};

use super::stdin::{capture_stdin, ProcessStdin, StdinSource};

/// Sends one command to a server and returns its answer.
#[derive(Debug, Clone)]
pub struct Client {
    settings: ClientSettings,
}

impl Client {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Frame a `process` request for the configured command.
    pub fn build_request(&self, stdin: Option<String>) -> BrokerResult<Frame> {
        Frame::build(&Request::process(self.settings.command.as_str(), stdin))
    }

    /// Capture ready input from `source`, relay the request, return the response frame.
    pub async fn exchange<S: StdinSource>(&self, source: S) -> BrokerResult<Frame> {
        let stdin = capture_stdin(source).await?;
        debug!(has_stdin = stdin.is_some(), "Prepared request");

        let request = self.build_request(stdin)?;
        self.relay_to_server(&request).await
    }

    /// Run the command remotely and copy the response to stdout.
    pub async fn run(&self) -> BrokerResult<()> {
        let response = self.exchange(ProcessStdin).await?;
        response.write(&mut io::stdout().lock())
    }

    /// Send `frame` over a pinned TLS connection and read one frame back.
    pub async fn relay_to_server(&self, frame: &Frame) -> BrokerResult<Frame> {
        let connector =
            client_connector(&TrustPolicy::Pinned(self.settings.broker_cert.clone()))?;
        let domain = server_name(&self.settings.address)?;

        let stream = TcpStream::connect((self.settings.address.as_str(), self.settings.port))
            .await?;
        let mut tls = connector
            .connect(domain, stream)
            .await
            .map_err(|e| BrokerError::Tls {
                message: format!(
                    "Handshake with {}:{} failed: {}",
                    self.settings.address, self.settings.port, e
                ),
            })?;
        info!(
            address = %self.settings.address,
            port = self.settings.port,
            "Connected to server"
        );

        frame.async_write(&mut tls).await?;
        let response = Frame::async_read(&mut tls).await?;

        if let Err(e) = tls.shutdown().await {
            debug!(error = %e, "TLS shutdown failed");
        }

        Ok(response)
    }
}
