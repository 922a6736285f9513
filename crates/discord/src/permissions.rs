use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::{commands::Command, interaction::Interaction};

/// Administrator permission bit; members holding it satisfy any bitfield requirement.
pub const ADMINISTRATOR: u64 = 1 << 3;
pub const MANAGE_GUILD: u64 = 1 << 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionRequirement {
    Anyone,
    GuildOnly,
    /// Every listed bit must be present in the member's permission bitfield.
    MemberPermissions(u64),
    Users(BTreeSet<String>),
}

impl PermissionRequirement {
    pub fn users<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Users(ids.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("member permission bitfield `{0}` is not a valid integer")]
    InvalidBitfield(String),
    #[error("permission source unavailable: {0}")]
    Unavailable(String),
}

/// Authorization collaborator consulted after a command resolves and before it runs.
/// An `Err` means the decision could not be made; callers must not treat it as a denial.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn has_permission(
        &self,
        command: &dyn Command,
        interaction: &Interaction,
    ) -> Result<bool, PermissionError>;
}

/// Gate that enforces each command's declared [`PermissionRequirement`] against the
/// interaction's own member data.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequirementGate;

#[async_trait]
impl PermissionGate for RequirementGate {
    async fn has_permission(
        &self,
        command: &dyn Command,
        interaction: &Interaction,
    ) -> Result<bool, PermissionError> {
        match command.permission() {
            Some(requirement) => evaluate(requirement, interaction),
            None => Ok(true),
        }
    }
}

pub fn evaluate(
    requirement: &PermissionRequirement,
    interaction: &Interaction,
) -> Result<bool, PermissionError> {
    match requirement {
        PermissionRequirement::Anyone => Ok(true),
        PermissionRequirement::GuildOnly => Ok(interaction.guild_id.is_some()),
        PermissionRequirement::MemberPermissions(required) => {
            let Some(raw) = interaction.member.as_ref().and_then(|member| member.permissions.as_deref())
            else {
                return Ok(false);
            };
            let granted = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| PermissionError::InvalidBitfield(raw.to_owned()))?;

            Ok(granted & ADMINISTRATOR != 0 || granted & required == *required)
        }
        PermissionRequirement::Users(allowed) => {
            Ok(interaction.invoker().is_some_and(|user| allowed.contains(&user.id)))
        }
    }
}
