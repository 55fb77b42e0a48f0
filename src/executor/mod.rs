//! Command executor module.
//!
//! Handles subprocess spawning with piped standard input and captured output.

mod subprocess;

pub use subprocess::{run_shell, SubprocessBuilder, SubprocessResult, SHELL};
