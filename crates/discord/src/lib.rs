//! Discord interactions - signed webhook ingress
//!
//! This crate provides the interaction pipeline for hookline:
//! - **Verification** (`verify`) - Ed25519 signature check over `timestamp || body`
//! - **Interactions** (`interaction`) - payload parsing, key normalization, classification
//! - **Commands** (`commands`) - `Command` trait, registry, dispatch
//! - **Permissions** (`permissions`) - gate evaluated before any handler runs
//! - **Text** (`text`) - localized messages for handled outcomes
//! - **Responses** (`response`) - response envelopes and command output
//!
//! # Architecture
//!
//! ```text
//! POST /interactions → SignatureVerifier → read_interaction → CommandRegistry
//!                                                                    ↓
//!               ResponseEnvelope ← dispatch ← PermissionGate ← Command
//! ```
//!
//! # Key Types
//!
//! - `InteractionPipeline` - verify, classify, gate, and dispatch one request
//! - `CommandRegistry` - immutable name to handler map
//! - `CommandOutput` - tagged handler result (`Content` or `Response`)
//! - `PermissionGate` - trait for authorization collaborators

pub mod builtin;
pub mod commands;
pub mod error;
pub mod interaction;
pub mod permissions;
pub mod pipeline;
pub mod response;
pub mod text;
pub mod verify;

pub use commands::{Command, CommandError, CommandRegistry, RegistryError};
pub use error::{DispatchError, IngressError, PipelineError};
pub use interaction::{Interaction, InteractionType};
pub use permissions::{PermissionError, PermissionGate, PermissionRequirement, RequirementGate};
pub use pipeline::{HandledOutcome, InteractionPipeline, PipelineReply, ReplyKind, RequestContext};
pub use response::{CommandOutput, InteractionResponseType, MessageData, ResponseEnvelope};
pub use text::{LocalizedText, TextCatalog, TextKey};
pub use verify::{SignatureVerifier, SignedRequest, VerificationOutcome};
