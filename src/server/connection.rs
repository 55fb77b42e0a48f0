//! Per-connection handler.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};
use uuid::Uuid;

use crate::commands::{CommandParams, CommandRegistry, ExecutionContext};
use crate::error::{BrokerError, BrokerResult, CommandErrorKind};
use crate::protocol::{Frame, Request};

/// Handle a single client connection: handshake, one request, close.
pub async fn handle_connection(
    acceptor: TlsAcceptor,
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<CommandRegistry>,
) -> BrokerResult<()> {
    let mut tls = acceptor.accept(stream).await.map_err(|e| BrokerError::Tls {
        message: format!("Handshake with {} failed: {}", peer, e),
    })?;
    debug!(peer = %peer, "TLS handshake complete");

    let result = handle_request(&mut tls, Some(peer), &registry).await;

    if let Err(e) = tls.shutdown().await {
        debug!(peer = %peer, error = %e, "TLS shutdown failed");
    }

    result
}

/// Read one request frame from `stream`, execute it, and write the raw output.
///
/// On any error nothing is written back; the caller closes the stream.
pub async fn handle_request<S>(
    stream: &mut S,
    peer: Option<SocketAddr>,
    registry: &Arc<CommandRegistry>,
) -> BrokerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = Frame::async_read(stream).await?;
    let request: Request = frame.parse()?;

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        method = %request.method,
        peer = ?peer,
        "Received request"
    );

    let ctx = ExecutionContext::new(request_id, peer, request.method.clone(), request.stdin);
    let params = CommandParams::new(request.parameters);
    let method = request.method;

    let registry = Arc::clone(registry);
    let result = tokio::task::spawn_blocking(move || registry.dispatch(&ctx, &method, params))
        .await
        .map_err(|e| {
            BrokerError::command(CommandErrorKind::ExecutionFailed {
                message: format!("Command task failed: {}", e),
            })
        })??;

    debug!(
        request_id = %request_id,
        bytes = result.output.len(),
        exit_code = ?result.exit_code,
        "Writing response"
    );
    stream.write_all(&result.output).await?;
    stream.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolErrorKind;
    use tokio::io::{duplex, AsyncReadExt};

    async fn exchange(request: &Request) -> (BrokerResult<()>, Vec<u8>) {
        let (mut client, mut server) = duplex(64 * 1024);
        let registry = Arc::new(CommandRegistry::new());

        Frame::build(request)
            .unwrap()
            .async_write(&mut client)
            .await
            .unwrap();

        let result = handle_request(&mut server, None, &registry).await;
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        (result, written)
    }

    #[tokio::test]
    async fn test_echo_command() {
        let (result, written) = exchange(&Request::process("echo 'Hello World'", None)).await;
        result.unwrap();
        assert_eq!(written, b"Hello World\n");
    }

    #[tokio::test]
    async fn test_command_with_stdin() {
        let request = Request::process("grep Hello", Some("Hello World".to_string()));
        let (result, written) = exchange(&request).await;
        result.unwrap();
        assert_eq!(written, b"Hello World\n");
    }

    #[tokio::test]
    async fn test_failing_command_still_answers() {
        let (result, written) =
            exchange(&Request::process("printf partial; exit 3", None)).await;
        result.unwrap();
        assert_eq!(written, b"partial");
    }

    #[tokio::test]
    async fn test_unsupported_method_writes_nothing() {
        let request = Request {
            method: "bogus".to_string(),
            parameters: serde_json::json!({"command": "echo hi"}),
            stdin: None,
        };
        let (result, written) = exchange(&request).await;
        assert!(matches!(
            result,
            Err(BrokerError::Command {
                kind: CommandErrorKind::UnsupportedMethod { .. }
            })
        ));
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_writes_nothing() {
        let (mut client, mut server) = duplex(1024);
        let registry = Arc::new(CommandRegistry::new());

        Frame::from_payload(b"{broken".to_vec())
            .unwrap()
            .async_write(&mut client)
            .await
            .unwrap();

        let result = handle_request(&mut server, None, &registry).await;
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        assert!(matches!(
            result,
            Err(BrokerError::Protocol {
                kind: ProtocolErrorKind::InvalidJson { .. }
            })
        ));
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn test_peer_closes_before_request() {
        let (client, mut server) = duplex(1024);
        drop(client);
        let registry = Arc::new(CommandRegistry::new());

        assert!(matches!(
            handle_request(&mut server, None, &registry).await,
            Err(BrokerError::Protocol {
                kind: ProtocolErrorKind::ConnectionClosed
            })
        ));
    }
}
