//! Command trait definition.

use crate::error::BrokerError;

use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Core trait for every method a server can execute.
///
/// The request's `method` field is matched against [`Command::name`] by the
/// [`CommandRegistry`](super::CommandRegistry).
///
/// # Example
///
/// ```ignore
/// pub struct UptimeCommand;
///
/// impl Command for UptimeCommand {
///     fn name(&self) -> &'static str {
///         "uptime"
///     }
///
///     fn validate(&self, _params: &CommandParams) -> Result<(), BrokerError> {
///         Ok(())
///     }
///
///     fn execute(
///         &self,
///         _ctx: &ExecutionContext,
///         _params: CommandParams,
///     ) -> Result<CommandResult, BrokerError> {
///         let result = run_shell("uptime", None)?;
///         Ok(CommandResult::from(result))
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// Method name used in request messages to invoke this command.
    fn name(&self) -> &'static str;

    /// Validate the parameters before execution.
    fn validate(&self, params: &CommandParams) -> Result<(), BrokerError>;

    /// Execute the command.
    ///
    /// Called from a blocking context via `spawn_blocking`.
    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, BrokerError>;
}
