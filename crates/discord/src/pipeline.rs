use std::sync::Arc;

use tracing::debug;

use crate::{
    commands::{dispatch, CommandRegistry},
    error::{DispatchError, IngressError, PipelineError},
    interaction::{read_interaction, Interaction, InteractionType},
    permissions::PermissionGate,
    response::{MessageData, ResponseEnvelope},
    text::{TextCatalog, TextKey},
    verify::{SignatureVerifier, SignedRequest},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// Expected business outcomes that are answered in chat rather than as HTTP errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandledOutcome {
    CommandNameMissing,
    CommandNotFound { name: String },
    NotAuthorized { name: String },
}

impl HandledOutcome {
    pub fn text_key(&self) -> TextKey {
        match self {
            Self::CommandNameMissing => TextKey::CommandNameMissing,
            Self::CommandNotFound { .. } => TextKey::CommandNotFound,
            Self::NotAuthorized { .. } => TextKey::NotAuthorized,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    Pong,
    Handled(HandledOutcome),
    Executed { command: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReply {
    pub envelope: ResponseEnvelope,
    pub kind: ReplyKind,
}

impl PipelineReply {
    fn pong() -> Self {
        Self { envelope: ResponseEnvelope::pong(), kind: ReplyKind::Pong }
    }
}

/// Verify, classify, gate and dispatch a single interaction request.
pub struct InteractionPipeline {
    verifier: SignatureVerifier,
    registry: Arc<CommandRegistry>,
    gate: Arc<dyn PermissionGate>,
    texts: Arc<dyn TextCatalog>,
}

impl InteractionPipeline {
    pub fn new(
        verifier: SignatureVerifier,
        registry: Arc<CommandRegistry>,
        gate: Arc<dyn PermissionGate>,
        texts: Arc<dyn TextCatalog>,
    ) -> Self {
        Self { verifier, registry, gate, texts }
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn process(
        &self,
        request: SignedRequest<'_>,
        ctx: &RequestContext,
    ) -> Result<PipelineReply, PipelineError> {
        let outcome = self.verifier.verify(request)?;
        let Some(body) = outcome.trusted_body() else {
            return Err(IngressError::InvalidSignature.into());
        };

        let raw = read_interaction(body)?;
        debug!(
            event_name = "interaction.classified",
            correlation_id = %ctx.correlation_id,
            interaction_type = raw.kind().code(),
            "interaction payload verified and classified"
        );

        // Pings are answered from the type alone; nothing else in the body is decoded.
        if raw.kind() == InteractionType::Ping {
            return Ok(PipelineReply::pong());
        }

        let interaction = raw.decode()?;
        self.route(&interaction, ctx).await
    }

    pub async fn route(
        &self,
        interaction: &Interaction,
        ctx: &RequestContext,
    ) -> Result<PipelineReply, PipelineError> {
        match interaction.kind {
            InteractionType::Ping => Ok(PipelineReply::pong()),
            InteractionType::ApplicationCommand => {
                self.run_command(interaction, ctx).await.map_err(PipelineError::from)
            }
            other => Err(IngressError::UnsupportedInteraction(other).into()),
        }
    }

    async fn run_command(
        &self,
        interaction: &Interaction,
        ctx: &RequestContext,
    ) -> Result<PipelineReply, DispatchError> {
        let Some(name) = interaction.command_name() else {
            return Ok(self.handled(HandledOutcome::CommandNameMissing, interaction));
        };

        let Some(command) = self.registry.lookup(name) else {
            return Ok(
                self.handled(HandledOutcome::CommandNotFound { name: name.to_owned() }, interaction)
            );
        };

        let allowed = self
            .gate
            .has_permission(command.as_ref(), interaction)
            .await
            .map_err(|source| DispatchError::Permission { command: name.to_owned(), source })?;
        if !allowed {
            return Ok(
                self.handled(HandledOutcome::NotAuthorized { name: name.to_owned() }, interaction)
            );
        }

        debug!(
            event_name = "interaction.command.dispatch",
            correlation_id = %ctx.correlation_id,
            command = name,
            "dispatching command"
        );
        let envelope = dispatch(command.as_ref(), interaction)
            .await
            .map_err(|source| DispatchError::Command { command: name.to_owned(), source })?;

        Ok(PipelineReply { envelope, kind: ReplyKind::Executed { command: name.to_owned() } })
    }

    fn handled(&self, outcome: HandledOutcome, interaction: &Interaction) -> PipelineReply {
        let content = self.texts.text(outcome.text_key(), interaction);
        PipelineReply {
            envelope: ResponseEnvelope::message(MessageData::content(content)),
            kind: ReplyKind::Handled(outcome),
        }
    }
}
