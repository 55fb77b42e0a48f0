//! Non-blocking capture of piped standard input.

use std::io::{self, Read};
use std::os::fd::AsFd;

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::{BrokerError, BrokerResult, CommandErrorKind};

/// A source of input to forward with the request.
pub trait StdinSource: Send + 'static {
    /// Whether input is available right now, without waiting.
    fn is_ready(&self) -> BrokerResult<bool>;

    /// Read the source to its end.
    fn read_all(self) -> BrokerResult<String>;
}

/// The process's own standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessStdin;

impl StdinSource for ProcessStdin {
    fn is_ready(&self) -> BrokerResult<bool> {
        let stdin = io::stdin();
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::ZERO)
            .map_err(|e| BrokerError::Io(io::Error::from(e)))?;
        if ready == 0 {
            return Ok(false);
        }

        Ok(fds[0]
            .revents()
            .is_some_and(|events| events.intersects(PollFlags::POLLIN | PollFlags::POLLHUP)))
    }

    fn read_all(self) -> BrokerResult<String> {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Read `source` to completion if, and only if, it is ready now.
///
/// The read runs on the blocking pool.
pub async fn capture_stdin<S: StdinSource>(source: S) -> BrokerResult<Option<String>> {
    if !source.is_ready()? {
        return Ok(None);
    }

    let input = tokio::task::spawn_blocking(move || source.read_all())
        .await
        .map_err(|e| {
            BrokerError::command(CommandErrorKind::ExecutionFailed {
                message: format!("Stdin reader failed: {}", e),
            })
        })??;

    Ok(Some(input))
}
