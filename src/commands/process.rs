//! The `process` method: run a shell command line.

use tracing::{debug, info};

use crate::error::BrokerError;
use crate::executor::run_shell;
use crate::protocol::PROCESS_METHOD;

use super::traits::Command;
use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Runs `parameters.command` through the shell and returns its stdout.
///
/// The request's `stdin`, if any, is piped to the command. Exit codes are
/// not interpreted; a failing command returns whatever it printed.
pub struct ProcessCommand;

impl Command for ProcessCommand {
    fn name(&self) -> &'static str {
        PROCESS_METHOD
    }

    fn validate(&self, params: &CommandParams) -> Result<(), BrokerError> {
        params.require_string("command")
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, BrokerError> {
        let command_line = params.get_string("command")?;
        info!(
            request_id = %ctx.request_id,
            peer = ?ctx.peer,
            method = %ctx.method,
            command = %command_line,
            has_stdin = ctx.stdin.is_some(),
            "Running command"
        );

        let result = run_shell(&command_line, ctx.stdin.as_deref())?;
        if !result.stderr.is_empty() {
            debug!(
                request_id = %ctx.request_id,
                stderr = %String::from_utf8_lossy(&result.stderr),
                "Command wrote to stderr"
            );
        }

        Ok(CommandResult::from(result))
    }
}
