use async_trait::async_trait;

use crate::{
    commands::{Command, CommandError, CommandRegistry, RegistryError},
    interaction::Interaction,
    response::{CommandOutput, MessageData},
};

/// `/ping`: answers `pong`, privately when the `ephemeral` option is true.
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    async fn execute(&self, interaction: &Interaction) -> Result<CommandOutput, CommandError> {
        let ephemeral = match interaction.option("ephemeral").and_then(|option| option.value.as_ref()) {
            None => false,
            Some(value) => value.as_bool().ok_or_else(|| CommandError::InvalidOption {
                name: "ephemeral".to_owned(),
                reason: format!("expected a boolean, got {value}"),
            })?,
        };

        let data = MessageData::content("pong");
        Ok(CommandOutput::Content(if ephemeral { data.ephemeral() } else { data }))
    }
}

pub fn builtin_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    registry.register(PingCommand)?;
    Ok(registry)
}
