use thiserror::Error;

/// Failure classes a request can end in at the transport layer. Handled chat outcomes
/// (unknown command, not authorized, ...) are successes at this layer and never map here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Transport,
    Authentication,
    Configuration,
    Unexpected,
}

impl FailureClass {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Transport => 400,
            Self::Authentication => 401,
            Self::Configuration | Self::Unexpected => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Authentication => "authentication",
            Self::Configuration => "configuration",
            Self::Unexpected => "unexpected",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("misconfigured: {message}")]
    Misconfigured { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn new(class: FailureClass, message: impl Into<String>) -> Self {
        let message = message.into();
        let correlation_id = "unassigned".to_owned();
        match class {
            FailureClass::Transport => Self::BadRequest { message, correlation_id },
            FailureClass::Authentication => Self::Unauthorized { message, correlation_id },
            FailureClass::Configuration => Self::Misconfigured { message, correlation_id },
            FailureClass::Unexpected => Self::Internal { message, correlation_id },
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        match &mut self {
            Self::BadRequest { correlation_id: id, .. }
            | Self::Unauthorized { correlation_id: id, .. }
            | Self::Misconfigured { correlation_id: id, .. }
            | Self::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        self
    }

    pub fn class(&self) -> FailureClass {
        match self {
            Self::BadRequest { .. } => FailureClass::Transport,
            Self::Unauthorized { .. } => FailureClass::Authentication,
            Self::Misconfigured { .. } => FailureClass::Configuration,
            Self::Internal { .. } => FailureClass::Unexpected,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::Misconfigured { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    /// Message placed in the `{ "error": ... }` response body. Internal failures never
    /// expose their underlying cause on the wire.
    pub fn wire_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Misconfigured { message, .. } => message,
            Self::Internal { .. } => "internal server error",
        }
    }
}
