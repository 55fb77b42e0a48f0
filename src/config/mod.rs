//! Configuration module for cmdbroker.
//!
//! Merges command-line arguments with an optional JSON configuration file
//! and validates the result before a client or server is constructed.

mod cli;
mod settings;

pub use cli::{Cli, FileConfig};
pub use settings::*;
