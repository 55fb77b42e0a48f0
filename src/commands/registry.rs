//! Command registry for dispatching requests to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{BrokerError, CommandErrorKind};

use super::process::ProcessCommand;
use super::traits::Command;
use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Registry of all available methods.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry holding the built-in `process` method.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };

        registry.register(Arc::new(ProcessCommand));

        info!(
            count = registry.commands.len(),
            "Command registry initialized"
        );

        registry
    }

    /// Register a command.
    fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name();
        debug!(command = name, "Registering command");
        self.commands.insert(name, command);
    }

    /// Get a command by method name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Dispatch a request to the handler for `method`.
    pub fn dispatch(
        &self,
        ctx: &ExecutionContext,
        method: &str,
        params: CommandParams,
    ) -> Result<CommandResult, BrokerError> {
        let command = self.get(method).ok_or_else(|| BrokerError::Command {
            kind: CommandErrorKind::UnsupportedMethod {
                method: method.to_string(),
            },
        })?;

        command.validate(&params)?;

        command.execute(ctx, params)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_test_context(method: &str) -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), None, method.to_string(), None)
    }

    #[test]
    fn test_registry_has_commands() {
        let registry = CommandRegistry::default();
        assert!(registry.get("process").is_some());
        assert!(registry.get("bogus").is_none());
        assert_eq!(registry.get("process").unwrap().name(), "process");
    }

    #[test]
    fn test_dispatch_unsupported_method() {
        let registry = CommandRegistry::default();
        let ctx = create_test_context("bogus");
        let params = CommandParams::new(serde_json::json!({}));

        let result = registry.dispatch(&ctx, "bogus", params);
        assert!(matches!(
            result,
            Err(BrokerError::Command {
                kind: CommandErrorKind::UnsupportedMethod { .. }
            })
        ));
    }

    #[test]
    fn test_dispatch_missing_command_parameter() {
        let registry = CommandRegistry::default();
        let ctx = create_test_context("process");
        let params = CommandParams::new(serde_json::json!({"param1": "value1"}));

        let result = registry.dispatch(&ctx, "process", params);
        assert!(matches!(
            result,
            Err(BrokerError::Command {
                kind: CommandErrorKind::MissingParameter { .. }
            })
        ));
    }

    #[test]
    fn test_dispatch_process() {
        let registry = CommandRegistry::default();
        let ctx = create_test_context("process");
        let params = CommandParams::new(serde_json::json!({"command": "printf abc"}));

        let result = registry.dispatch(&ctx, "process", params).unwrap();
        assert_eq!(result.output, b"abc");
    }
}
