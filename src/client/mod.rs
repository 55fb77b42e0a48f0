//! Client side: capture stdin, relay one request, print the response.

mod relay;
mod stdin;

pub use relay::Client;
pub use stdin::{capture_stdin, ProcessStdin, StdinSource};
