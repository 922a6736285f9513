use hookline_core::errors::{FailureClass, InterfaceError};
use thiserror::Error;

use crate::{
    commands::CommandError,
    interaction::{InteractionType, PayloadError},
    permissions::PermissionError,
    verify::MissingPublicKey,
};

/// Failures before a command is resolved. Every variant ends the request with an HTTP error.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("method `{0}` is not allowed; interactions must be sent with POST")]
    MethodNotAllowed(String),
    #[error("missing required header `{0}`")]
    MissingHeader(&'static str),
    #[error("invalid header value for `{0}`; expected visible ASCII")]
    InvalidHeader(&'static str),
    #[error(transparent)]
    MissingPublicKey(#[from] MissingPublicKey),
    #[error("Invalid request; could not verify the request")]
    InvalidSignature,
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("Bad request")]
    UnsupportedInteraction(InteractionType),
}

impl IngressError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MethodNotAllowed(_)
            | Self::MissingHeader(_)
            | Self::InvalidHeader(_)
            | Self::Payload(_)
            | Self::UnsupportedInteraction(_) => FailureClass::Transport,
            Self::InvalidSignature => FailureClass::Authentication,
            Self::MissingPublicKey(_) => FailureClass::Configuration,
        }
    }
}

/// Collaborator failures after a command was resolved. These are defects, not chat outcomes.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("permission check for `{command}` failed: {source}")]
    Permission {
        command: String,
        #[source]
        source: PermissionError,
    },
    #[error("command `{command}` failed: {source}")]
    Command {
        command: String,
        #[source]
        source: CommandError,
    },
}

impl DispatchError {
    pub fn command(&self) -> &str {
        match self {
            Self::Permission { command, .. } | Self::Command { command, .. } => command,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingress(#[from] IngressError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PipelineError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Ingress(error) => error.class(),
            Self::Dispatch(_) => FailureClass::Unexpected,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError::new(self.class(), self.to_string()).with_correlation_id(correlation_id)
    }
}

impl From<MissingPublicKey> for PipelineError {
    fn from(value: MissingPublicKey) -> Self {
        Self::Ingress(IngressError::from(value))
    }
}

impl From<PayloadError> for PipelineError {
    fn from(value: PayloadError) -> Self {
        Self::Ingress(IngressError::from(value))
    }
}
