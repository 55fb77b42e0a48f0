//! Command handlers module.
//!
//! Maps a request's `method` to the handler that executes it. Only
//! `process` is defined; anything else is rejected as unsupported.

mod process;
mod registry;
mod traits;
mod types;

pub use process::ProcessCommand;
pub use registry::CommandRegistry;
pub use traits::Command;
pub use types::{CommandParams, CommandResult, ExecutionContext};
