use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    interaction::Interaction,
    permissions::PermissionRequirement,
    response::{CommandOutput, ResponseEnvelope},
};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing required option `{0}`")]
    MissingOption(String),
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: String, reason: String },
    #[error("command service failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command name must not be empty")]
    EmptyName,
    #[error("command `{0}` is already registered")]
    DuplicateName(String),
}

/// A named application command handler.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    /// Requirement the invoking principal must satisfy; `None` lets everyone through.
    fn permission(&self) -> Option<&PermissionRequirement> {
        None
    }

    async fn execute(&self, interaction: &Interaction) -> Result<CommandOutput, CommandError>;
}

/// Name to handler map. Filled during startup, then shared behind an `Arc` and only read.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C>(&mut self, command: C) -> Result<(), RegistryError>
    where
        C: Command + 'static,
    {
        self.register_shared(Arc::new(command))
    }

    pub fn register_shared(&mut self, command: Arc<dyn Command>) -> Result<(), RegistryError> {
        let name = command.name().to_owned();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.commands.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        self.commands.insert(name, command);
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Runs the handler to completion and normalizes its output into an envelope.
pub async fn dispatch(
    command: &dyn Command,
    interaction: &Interaction,
) -> Result<ResponseEnvelope, CommandError> {
    command.execute(interaction).await.map(CommandOutput::into_envelope)
}
