/*!
 * Role Model
 */

use super::context::RoleContext;
use super::target::RoleTarget;
use crate::core::errors::PermissionError;
use crate::core::types::{GuildId, PermissionResult, RoleId};
use crate::permissions::tree::PermSpec;
use serde::{Deserialize, Serialize};

/// A named group of grants and denies assignable to targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Absolute id: `<guild>:<local>` for guild roles
    pub id: RoleId,
    pub name: String,
    pub context: RoleContext,
    pub guild_id: Option<GuildId>,
    /// Index inside the role's order, lower wins
    pub position: usize,
    #[serde(default)]
    pub grant: Vec<PermSpec>,
    #[serde(default)]
    pub deny: Vec<PermSpec>,
    /// Absolute ids of the roles this one inherits from
    #[serde(default)]
    pub base_ids: Vec<RoleId>,
    #[serde(default)]
    pub targets: Vec<RoleTarget>,
}

impl Role {
    pub fn new(
        context: RoleContext,
        guild_id: Option<GuildId>,
        local_id: &str,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: absolute_id(guild_id, local_id),
            name: name.into(),
            context,
            guild_id,
            position: 0,
            grant: Vec::new(),
            deny: Vec::new(),
            base_ids: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn global(local_id: &str, name: impl Into<String>) -> Self {
        Self::new(RoleContext::Global, None, local_id, name)
    }

    pub fn superglobal(local_id: &str, name: impl Into<String>) -> Self {
        Self::new(RoleContext::Superglobal, None, local_id, name)
    }

    pub fn guild_default(local_id: &str, name: impl Into<String>) -> Self {
        Self::new(RoleContext::GuildDefault, None, local_id, name)
    }

    pub fn guild(guild_id: GuildId, local_id: &str, name: impl Into<String>) -> Self {
        Self::new(RoleContext::Guild, Some(guild_id), local_id, name)
    }

    pub fn with_grant<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PermSpec>,
    {
        self.grant.extend(specs.into_iter().map(Into::into));
        self
    }

    pub fn with_deny<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PermSpec>,
    {
        self.deny.extend(specs.into_iter().map(Into::into));
        self
    }

    pub fn with_bases<I, S>(mut self, base_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoleId>,
    {
        self.base_ids.extend(base_ids.into_iter().map(Into::into));
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = RoleTarget>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Id without the guild prefix
    pub fn local_id(&self) -> &str {
        match self.guild_id {
            Some(_) => self
                .id
                .split_once(':')
                .map(|(_, local)| local)
                .unwrap_or(&self.id),
            None => &self.id,
        }
    }

    pub fn order_id(&self) -> String {
        self.context.order_id(self.guild_id)
    }

    /// Declares neither bases nor grants nor denies
    pub fn is_empty(&self) -> bool {
        self.base_ids.is_empty() && self.grant.is_empty() && self.deny.is_empty()
    }

    /// Same (context, guild) scope
    pub fn shares_scope(&self, other: &Role) -> bool {
        self.context == other.context && self.guild_id == other.guild_id
    }

    /// Whether the target lives in the same world as the role
    ///
    /// Guild-section roles only take guild-context targets; everything else
    /// only takes owner, everyone and plain user targets. Bound targets must
    /// match the role's guild.
    pub fn check_target(&self, target: RoleTarget) -> PermissionResult<()> {
        let raw = target.to_string();

        if !target.is_guild_context() {
            if self.context.is_guild_scoped() {
                return Err(PermissionError::invalid_target(
                    raw,
                    "guild roles can only target guild members, guild roles, guild owners and admins",
                ));
            }
            return Ok(());
        }

        if !self.context.is_guild_scoped() {
            return Err(PermissionError::invalid_target(
                raw,
                "only guild roles can use guild targets",
            ));
        }

        match (target.guild_id(), self.guild_id) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(PermissionError::invalid_target(
                raw,
                "guild-specific target needs a role bound to that guild",
            )),
            (Some(target_guild), Some(role_guild)) if target_guild != role_guild => Err(
                PermissionError::invalid_target(raw, format!("role is bound to guild {role_guild}")),
            ),
            _ => Ok(()),
        }
    }

    /// Whether `base` may be inherited from by this role
    pub fn accepts_base(&self, base: &Role) -> bool {
        self.shares_scope(base)
            || (self.context == RoleContext::Guild && base.context == RoleContext::GuildDefault)
    }
}

/// Absolute role id for a local id
pub fn absolute_id(guild_id: Option<GuildId>, local_id: &str) -> RoleId {
    match guild_id {
        Some(guild_id) => format!("{guild_id}:{local_id}"),
        None => local_id.to_string(),
    }
}
