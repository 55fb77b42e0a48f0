//! cmdbroker library
//!
//! A TLS-secured command relay. A server accepts framed JSON requests and
//! runs the requested shell command; a client sends one request, optionally
//! forwarding its piped stdin, and prints what comes back.

pub mod client;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod protocol;
pub mod server;
pub mod tls;
