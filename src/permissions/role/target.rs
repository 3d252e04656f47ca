/*!
 * Role Targets
 * Canonical string form of whatever a role can be assigned to
 *
 * ```text
 * #owner                   bot owner
 * #everyone                anyone at all
 * #guild_owner             owner of whichever guild the check runs in
 * #guild_admin             administrator of whichever guild
 * #<guild>:guild_owner     owner of one guild
 * #<guild>:guild_admin     administrator of one guild
 * <user>                   a user everywhere
 * <guild>:<user>           a user inside one guild
 * @<guild>:<role>          holders of a guild role
 * ```
 */

use crate::core::errors::PermissionError;
use crate::core::types::{GuildId, GuildRoleId, PermissionResult, UserId};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

const GUILD_SPLIT: char = ':';
const SPECIAL_PREFIX: char = '#';
const ROLE_PREFIX: char = '@';

/// Something a role can be assigned to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub enum RoleTarget {
    Owner,
    Everyone,
    GuildOwner(Option<GuildId>),
    GuildAdmin(Option<GuildId>),
    User(UserId),
    Member { guild_id: GuildId, user_id: UserId },
    GuildRole { guild_id: GuildId, role_id: GuildRoleId },
}

impl RoleTarget {
    pub fn is_user(&self) -> bool {
        matches!(self, RoleTarget::User(_))
    }

    pub fn is_member(&self) -> bool {
        matches!(self, RoleTarget::Member { .. })
    }

    pub fn is_role(&self) -> bool {
        matches!(self, RoleTarget::GuildRole { .. })
    }

    /// `#`-prefixed targets
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            RoleTarget::Owner
                | RoleTarget::Everyone
                | RoleTarget::GuildOwner(_)
                | RoleTarget::GuildAdmin(_)
        )
    }

    /// Guild this target is bound to
    pub fn guild_id(&self) -> Option<GuildId> {
        match *self {
            RoleTarget::GuildOwner(guild_id) | RoleTarget::GuildAdmin(guild_id) => guild_id,
            RoleTarget::Member { guild_id, .. } | RoleTarget::GuildRole { guild_id, .. } => {
                Some(guild_id)
            }
            RoleTarget::Owner | RoleTarget::Everyone | RoleTarget::User(_) => None,
        }
    }

    /// Only meaningful inside a guild
    pub fn is_guild_context(&self) -> bool {
        !matches!(
            self,
            RoleTarget::Owner | RoleTarget::Everyone | RoleTarget::User(_)
        )
    }

    /// Parse a target, also accepting bare numeric ids
    pub fn parse(target: &str) -> PermissionResult<Self> {
        target.parse()
    }
}

impl From<UserId> for RoleTarget {
    fn from(user_id: UserId) -> Self {
        RoleTarget::User(user_id)
    }
}

impl fmt::Display for RoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleTarget::Owner => write!(f, "#owner"),
            RoleTarget::Everyone => write!(f, "#everyone"),
            RoleTarget::GuildOwner(None) => write!(f, "#guild_owner"),
            RoleTarget::GuildOwner(Some(guild_id)) => write!(f, "#{guild_id}:guild_owner"),
            RoleTarget::GuildAdmin(None) => write!(f, "#guild_admin"),
            RoleTarget::GuildAdmin(Some(guild_id)) => write!(f, "#{guild_id}:guild_admin"),
            RoleTarget::User(user_id) => write!(f, "{user_id}"),
            RoleTarget::Member { guild_id, user_id } => write!(f, "{guild_id}:{user_id}"),
            RoleTarget::GuildRole { guild_id, role_id } => write!(f, "@{guild_id}:{role_id}"),
        }
    }
}

impl FromStr for RoleTarget {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(special) = s.strip_prefix(SPECIAL_PREFIX) {
            return parse_special(s, special);
        }

        if let Some(role) = s.strip_prefix(ROLE_PREFIX) {
            let (guild, role) = role
                .split_once(GUILD_SPLIT)
                .ok_or_else(|| PermissionError::invalid_target(s, "role target needs a guild"))?;
            return Ok(RoleTarget::GuildRole {
                guild_id: parse_id(s, guild)?,
                role_id: parse_id(s, role)?,
            });
        }

        if let Some((guild, user)) = s.split_once(GUILD_SPLIT) {
            return Ok(RoleTarget::Member {
                guild_id: parse_id(s, guild)?,
                user_id: parse_id(s, user)?,
            });
        }

        parse_id(s, s).map(RoleTarget::User)
    }
}

fn parse_special(raw: &str, special: &str) -> PermissionResult<RoleTarget> {
    let (guild_id, name) = match special.split_once(GUILD_SPLIT) {
        Some((guild, name)) => (Some(parse_id(raw, guild)?), name),
        None => (None, special),
    };

    match (name, guild_id) {
        ("owner", None) => Ok(RoleTarget::Owner),
        ("everyone", None) => Ok(RoleTarget::Everyone),
        ("guild_owner", guild_id) => Ok(RoleTarget::GuildOwner(guild_id)),
        ("guild_admin", guild_id) => Ok(RoleTarget::GuildAdmin(guild_id)),
        ("owner" | "everyone", Some(_)) => Err(PermissionError::invalid_target(
            raw,
            "special target cannot be bound to a guild",
        )),
        _ => Err(PermissionError::invalid_target(raw, "unknown special target")),
    }
}

fn parse_id(raw: &str, id: &str) -> PermissionResult<u64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PermissionError::invalid_target(raw, format!("{id:?} is not a numeric id")));
    }
    id.parse()
        .map_err(|_| PermissionError::invalid_target(raw, "id out of range"))
}
