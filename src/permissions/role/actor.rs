/*!
 * Actor Resolution
 * Map a caller to its role targets, most specific first
 */

use super::target::RoleTarget;
use crate::core::types::{GuildId, GuildRoleId, UserId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Whoever a permission check runs for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub membership: Option<Membership>,
}

impl Actor {
    /// Actor outside of any guild
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            membership: None,
        }
    }

    /// Actor inside a guild
    pub fn member(user_id: UserId, membership: Membership) -> Self {
        Self {
            user_id,
            membership: Some(membership),
        }
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.membership.as_ref().map(|m| m.guild_id)
    }
}

/// Guild membership of an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub guild_id: GuildId,
    pub is_guild_owner: bool,
    #[serde(default)]
    pub roles: Vec<HeldRole>,
}

impl Membership {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            is_guild_owner: false,
            roles: Vec::new(),
        }
    }

    pub fn owner(mut self) -> Self {
        self.is_guild_owner = true;
        self
    }

    pub fn with_role(mut self, role: HeldRole) -> Self {
        self.roles.push(role);
        self
    }
}

/// A guild role held by a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldRole {
    pub id: GuildRoleId,
    /// Hierarchy position, higher is more powerful
    pub position: u32,
    pub administrator: bool,
}

impl HeldRole {
    pub fn new(id: GuildRoleId, position: u32) -> Self {
        Self {
            id,
            position,
            administrator: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.administrator = true;
        self
    }
}

/// Which targets a check considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScope {
    #[default]
    All,
    /// Ignore guild membership entirely
    GlobalOnly,
    /// Ignore owner and plain user targets
    GuildOnly,
}

impl TargetScope {
    fn includes_global(self) -> bool {
        self != TargetScope::GuildOnly
    }

    fn includes_guild(self) -> bool {
        self != TargetScope::GlobalOnly
    }
}

/// Knows who the owners are and expands actors into targets
#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    owners: AHashSet<UserId>,
}

impl TargetResolver {
    pub fn new(owners: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owners.contains(&user_id)
    }

    pub fn owners(&self) -> impl Iterator<Item = UserId> + '_ {
        self.owners.iter().copied()
    }

    /// Ordered targets for an actor; `#everyone` is always last
    pub fn targets_for(&self, actor: &Actor, scope: TargetScope) -> Vec<RoleTarget> {
        let mut targets = Vec::with_capacity(8);

        if scope.includes_global() {
            if self.is_owner(actor.user_id) {
                targets.push(RoleTarget::Owner);
            }
            targets.push(RoleTarget::User(actor.user_id));
        }

        if let Some(membership) = actor.membership.as_ref().filter(|_| scope.includes_guild()) {
            let guild_id = membership.guild_id;
            targets.push(RoleTarget::Member {
                guild_id,
                user_id: actor.user_id,
            });

            if membership.is_guild_owner {
                targets.push(RoleTarget::GuildOwner(Some(guild_id)));
                targets.push(RoleTarget::GuildOwner(None));
            }

            let mut roles: Vec<&HeldRole> = membership.roles.iter().collect();
            roles.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));

            let mut admin_emitted = false;
            for role in roles {
                if role.administrator && !admin_emitted {
                    targets.push(RoleTarget::GuildAdmin(Some(guild_id)));
                    targets.push(RoleTarget::GuildAdmin(None));
                    admin_emitted = true;
                }
                targets.push(RoleTarget::GuildRole {
                    guild_id,
                    role_id: role.id,
                });
            }
        }

        targets.push(RoleTarget::Everyone);
        targets
    }
}
