//! TLS server module.
//!
//! Accepts TLS connections over TCP and runs one request per connection.

mod connection;
mod listener;

pub use connection::{handle_connection, handle_request};
pub use listener::{shutdown_signal, Server};
