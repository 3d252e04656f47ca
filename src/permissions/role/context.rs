/*!
 * Role Context
 * Scope a role lives in and its resolution priority
 */

use crate::core::errors::PermissionError;
use crate::core::types::GuildId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scope of a role; lower order value wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleContext {
    Superglobal,
    Guild,
    GuildDefault,
    Global,
}

impl RoleContext {
    /// Contexts from highest to lowest priority
    pub const ALL: [RoleContext; 4] = [
        RoleContext::Superglobal,
        RoleContext::Guild,
        RoleContext::GuildDefault,
        RoleContext::Global,
    ];

    pub fn order_value(self) -> u8 {
        match self {
            RoleContext::Superglobal => 0,
            RoleContext::Guild => 1,
            RoleContext::GuildDefault => 2,
            RoleContext::Global => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleContext::Superglobal => "superglobal",
            RoleContext::Guild => "guild",
            RoleContext::GuildDefault => "guild_default",
            RoleContext::Global => "global",
        }
    }

    /// Declared in the guild section; may only target guild-context targets
    pub fn is_guild_scoped(self) -> bool {
        matches!(self, RoleContext::Guild | RoleContext::GuildDefault)
    }

    /// Order id of the role order a role in this context belongs to
    pub fn order_id(self, guild_id: Option<GuildId>) -> String {
        match (self, guild_id) {
            (RoleContext::Guild, Some(guild_id)) => guild_id.to_string(),
            _ => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for RoleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleContext {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|context| context.as_str() == s)
            .ok_or_else(|| PermissionError::InvalidRole(format!("unknown role context {s:?}")))
    }
}
