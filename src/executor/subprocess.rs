//! Subprocess execution.
//!
//! Runs a program to completion with:
//! - Optional bytes piped to standard input
//! - Captured stdout/stderr
//! - No timeout (a hung command holds its connection open)

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{BrokerError, CommandErrorKind};

/// Shell used to interpret command lines.
pub const SHELL: &str = "/bin/sh";

/// Result of a subprocess execution.
#[derive(Debug, Clone)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout bytes, unmodified.
    pub stdout: Vec<u8>,
    /// Captured stderr bytes.
    pub stderr: Vec<u8>,
}

impl SubprocessResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Builder that runs `command_line` through [`SHELL`].
    pub fn shell(command_line: &str) -> Self {
        Self::new(SHELL).arg("-c").arg(command_line)
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Bytes to write to the child's standard input before closing it.
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Execute the command and wait for it to exit.
    ///
    /// Exit status is reported, not interpreted: a failing command still
    /// yields `Ok` with whatever it wrote.
    pub fn run(self) -> Result<SubprocessResult, BrokerError> {
        debug!(
            program = %self.program,
            args = ?self.args,
            stdin_bytes = self.stdin.as_ref().map(Vec::len),
            "Executing subprocess"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| BrokerError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to spawn {}: {}", self.program, e),
            },
        })?;

        // Feed stdin from its own thread so a child that fills its stdout
        // pipe before draining stdin cannot deadlock us.
        let feeder = match (self.stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(thread::spawn(move || {
                if let Err(e) = pipe.write_all(&input) {
                    // The child may exit without reading everything.
                    debug!(error = %e, "Subprocess closed stdin early");
                }
            })),
            _ => None,
        };

        let output = child.wait_with_output().map_err(|e| BrokerError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to get output from {}: {}", self.program, e),
            },
        })?;

        if let Some(feeder) = feeder {
            if feeder.join().is_err() {
                warn!(program = %self.program, "Stdin writer thread panicked");
            }
        }

        let result = SubprocessResult::from_output(output);
        debug!(
            success = result.success,
            exit_code = ?result.exit_code,
            stdout_bytes = result.stdout.len(),
            duration_ms = start.elapsed().as_millis(),
            "Subprocess completed"
        );
        Ok(result)
    }
}

/// Run a shell command line, optionally piping `stdin` into it.
pub fn run_shell(command_line: &str, stdin: Option<&str>) -> Result<SubprocessResult, BrokerError> {
    let mut builder = SubprocessBuilder::shell(command_line);
    if let Some(input) = stdin {
        builder = builder.stdin(input);
    }
    builder.run()
}
