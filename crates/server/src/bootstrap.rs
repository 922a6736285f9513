use std::sync::Arc;

use hookline_core::config::AppConfig;
use hookline_discord::{
    builtin::builtin_registry,
    commands::RegistryError,
    permissions::RequirementGate,
    pipeline::InteractionPipeline,
    text::LocalizedText,
    verify::{KeyError, SignatureVerifier},
};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub pipeline: Arc<InteractionPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("discord.public_key could not be loaded: {0}")]
    PublicKey(#[source] KeyError),
    #[error("command registry failed to initialize: {0}")]
    Registry(#[from] RegistryError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        application_id = config.discord.application_id.as_deref().unwrap_or("unset"),
        "starting application bootstrap"
    );

    let verifier = SignatureVerifier::from_hex(config.discord.public_key.as_deref())
        .map_err(BootstrapError::PublicKey)?;
    if !verifier.is_configured() {
        warn!(
            event_name = "system.bootstrap.public_key_missing",
            correlation_id = "bootstrap",
            "discord.public_key is not configured; interaction requests will be answered with 500"
        );
    }

    let registry = builtin_registry()?;
    info!(
        event_name = "system.bootstrap.commands_registered",
        correlation_id = "bootstrap",
        command_count = registry.len(),
        commands = ?registry.names(),
        "command registry initialized"
    );

    let texts = LocalizedText::from_config(&config.messages);
    let pipeline = InteractionPipeline::new(
        verifier,
        Arc::new(registry),
        Arc::new(RequirementGate),
        Arc::new(texts),
    );

    Ok(Application { config, pipeline: Arc::new(pipeline) })
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use hookline_core::config::{AppConfig, DiscordConfig};

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn public_key_hex() -> String {
        hex::encode(SigningKey::from_bytes(&[3u8; 32]).verifying_key().to_bytes())
    }

    #[test]
    fn bootstrap_fails_fast_on_malformed_public_key() {
        let config = AppConfig {
            discord: DiscordConfig { public_key: Some("not-hex".to_string()), application_id: None },
            ..AppConfig::default()
        };

        let result = bootstrap_with_config(config);

        let message = match result {
            Ok(_) => panic!("bootstrap should reject a malformed key"),
            Err(error) => error.to_string(),
        };
        assert!(message.contains("discord.public_key"));
    }

    #[test]
    fn bootstrap_wires_verifier_and_builtin_commands() {
        let config = AppConfig {
            discord: DiscordConfig { public_key: Some(public_key_hex()), application_id: None },
            ..AppConfig::default()
        };

        let app = bootstrap_with_config(config).expect("bootstrap should succeed");

        assert!(app.pipeline.verifier().is_configured());
        assert_eq!(app.pipeline.registry().names(), vec!["ping"]);
    }

    #[test]
    fn bootstrap_tolerates_missing_public_key() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap should succeed");
        assert!(!app.pipeline.verifier().is_configured());
    }

    #[test]
    fn bootstrap_rejects_key_bytes_of_wrong_length() {
        let config = AppConfig {
            discord: DiscordConfig { public_key: Some("abcd".to_string()), application_id: None },
            ..AppConfig::default()
        };

        let result = bootstrap_with_config(config);
        assert!(matches!(result, Err(BootstrapError::PublicKey(_))));
    }
}
