use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Message flag that hides the reply from everyone but the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InteractionResponseType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
    ApplicationCommandAutocompleteResult,
    Modal,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown interaction response type `{0}`")]
pub struct UnknownResponseType(pub u8);

impl From<InteractionResponseType> for u8 {
    fn from(value: InteractionResponseType) -> Self {
        match value {
            InteractionResponseType::Pong => 1,
            InteractionResponseType::ChannelMessageWithSource => 4,
            InteractionResponseType::DeferredChannelMessageWithSource => 5,
            InteractionResponseType::DeferredUpdateMessage => 6,
            InteractionResponseType::UpdateMessage => 7,
            InteractionResponseType::ApplicationCommandAutocompleteResult => 8,
            InteractionResponseType::Modal => 9,
        }
    }
}

impl TryFrom<u8> for InteractionResponseType {
    type Error = UnknownResponseType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            6 => Ok(Self::DeferredUpdateMessage),
            7 => Ok(Self::UpdateMessage),
            8 => Ok(Self::ApplicationCommandAutocompleteResult),
            9 => Ok(Self::Modal),
            other => Err(UnknownResponseType(other)),
        }
    }
}

/// Response payload. Known message fields are typed; anything else a handler needs to send
/// (modal `title`, autocomplete `choices`, ...) rides along in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageData {
    pub fn content(text: impl Into<String>) -> Self {
        Self { content: Some(text.into()), ..Self::default() }
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or_default() | EPHEMERAL_FLAG);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "type")]
    pub kind: InteractionResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

impl ResponseEnvelope {
    pub fn new(kind: InteractionResponseType, data: Option<MessageData>) -> Self {
        Self { kind, data }
    }

    pub fn pong() -> Self {
        Self::new(InteractionResponseType::Pong, None)
    }

    pub fn message(data: MessageData) -> Self {
        Self::new(InteractionResponseType::ChannelMessageWithSource, Some(data))
    }
}

/// What a command handler hands back. The variant is chosen by the handler; the dispatcher
/// never guesses from the payload's shape.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutput {
    /// Raw message content, wrapped into a `ChannelMessageWithSource` envelope.
    Content(MessageData),
    /// A complete envelope, sent unchanged.
    Response(ResponseEnvelope),
}

impl CommandOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Content(MessageData::content(text))
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            Self::Content(data) => ResponseEnvelope::message(data),
            Self::Response(envelope) => envelope,
        }
    }
}

impl From<MessageData> for CommandOutput {
    fn from(value: MessageData) -> Self {
        Self::Content(value)
    }
}

impl From<ResponseEnvelope> for CommandOutput {
    fn from(value: ResponseEnvelope) -> Self {
        Self::Response(value)
    }
}
