/*!
 * Role Store
 * Authoritative copy of roles and orders
 *
 * The cache is only a projection of what lives here. Readers take an
 * immutable snapshot; writers clone, modify and swap it, so a reader never
 * sees a half-applied change.
 */

mod json;
mod memory;

pub use json::JsonFileRoleStore;
pub use memory::MemoryRoleStore;

use super::loader::LoadedRoles;
use super::role::{build_order_map, OrderMap, Role, RoleContext, RoleOrder, RoleTarget, Target};
use crate::core::errors::PermissionError;
use crate::core::types::{GuildId, PermissionResult};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persistent home of roles and role orders
pub trait RoleStore: Send + Sync {
    /// Current state
    fn snapshot(&self) -> Arc<StoreSnapshot>;

    /// Swap in a whole new state
    fn replace(&self, snapshot: StoreSnapshot) -> PermissionResult<Arc<StoreSnapshot>>;

    /// Insert or overwrite one role
    fn save_role(&self, role: Role) -> PermissionResult<Arc<StoreSnapshot>>;

    /// Remove one role and its order entry
    fn delete_role(&self, role_id: &str) -> PermissionResult<Arc<StoreSnapshot>>;
}

/// Immutable view of the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub roles: Vec<Role>,
    pub orders: Vec<RoleOrder>,
}

impl StoreSnapshot {
    pub fn from_loaded(loaded: LoadedRoles) -> Self {
        Self {
            roles: loaded.roles,
            orders: loaded.orders,
        }
    }

    pub fn role(&self, role_id: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == role_id)
    }

    pub fn order_map(&self) -> OrderMap {
        build_order_map(&self.orders)
    }

    /// Every target with its roles sorted by priority
    pub fn targets(&self) -> Vec<Target> {
        let order_map = self.order_map();
        let mut targets = Target::invert(&self.roles);
        for target in &mut targets {
            target.sort(&order_map);
        }
        targets
    }

    /// Sorted roles of one target (possibly empty)
    pub fn target(&self, target_id: RoleTarget) -> Target {
        let role_ids = self
            .roles
            .iter()
            .filter(|role| role.targets.contains(&target_id))
            .map(|role| role.id.clone())
            .collect();
        let mut target = Target::new(target_id, role_ids);
        target.sort(&self.order_map());
        target
    }

    /// Roles of a (context, guild) scope in priority order
    pub fn roles_in(&self, context: RoleContext, guild_id: Option<GuildId>) -> Vec<&Role> {
        let order_id = context.order_id(guild_id);
        self.orders
            .iter()
            .filter(|order| order.order_id == order_id)
            .flat_map(|order| order.role_ids.iter())
            .filter_map(|role_id| self.role(role_id))
            .collect()
    }

    /// Look a role up by absolute id, local id or case-insensitive name
    pub fn find_role(
        &self,
        context: Option<RoleContext>,
        guild_id: Option<GuildId>,
        query: &str,
    ) -> Option<&Role> {
        let in_scope = |role: &&Role| {
            context.map_or(true, |context| role.context == context)
                && (guild_id.is_none() || role.guild_id.is_none() || role.guild_id == guild_id)
        };

        self.role(query)
            .filter(|role| in_scope(role))
            .or_else(|| {
                self.roles
                    .iter()
                    .filter(in_scope)
                    .find(|role| role.local_id() == query)
            })
            .or_else(|| {
                self.roles
                    .iter()
                    .filter(in_scope)
                    .find(|role| role.name.eq_ignore_ascii_case(query))
            })
    }

    /// Copy with one role inserted or overwritten
    ///
    /// New roles go to the end of their order, i.e. lowest priority.
    pub fn with_role(&self, role: Role) -> Self {
        let mut next = self.clone();
        let previous_order = next.role(&role.id).map(Role::order_id);
        let order_id = role.order_id();

        if previous_order.as_deref() != Some(order_id.as_str()) {
            next.detach(&role.id);
            match next.orders.iter_mut().find(|order| order.order_id == order_id) {
                Some(order) => order.role_ids.push(role.id.clone()),
                None => {
                    let mut order = RoleOrder::new(role.context, role.guild_id);
                    order.role_ids.push(role.id.clone());
                    next.orders.push(order);
                }
            }
        }

        match next.roles.iter_mut().find(|existing| existing.id == role.id) {
            Some(existing) => *existing = role,
            None => next.roles.push(role),
        }
        next.renumber();
        next
    }

    /// Copy with one role removed
    pub fn without_role(&self, role_id: &str) -> PermissionResult<Self> {
        if self.role(role_id).is_none() {
            return Err(PermissionError::RoleNotFound(role_id.to_string()));
        }
        let mut next = self.clone();
        next.roles.retain(|role| role.id != role_id);
        next.detach(role_id);
        next.renumber();
        Ok(next)
    }

    fn detach(&mut self, role_id: &str) {
        for order in &mut self.orders {
            order.role_ids.retain(|id| id != role_id);
        }
        self.orders.retain(|order| !order.role_ids.is_empty());
    }

    fn renumber(&mut self) {
        let order_map = self.order_map();
        for role in &mut self.roles {
            if let Some((_, position)) = order_map.get(&role.id) {
                role.position = *position;
            }
        }
    }
}

/// Clone-modify-swap cell with serialized writers
pub(crate) struct SnapshotCell {
    current: ArcSwap<StoreSnapshot>,
    writer: Mutex<()>,
}

impl SnapshotCell {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
        }
    }

    pub fn load(&self) -> Arc<StoreSnapshot> {
        self.current.load_full()
    }

    /// Build the next snapshot, persist it, then publish it
    pub fn commit<F, P>(&self, build: F, persist: P) -> PermissionResult<Arc<StoreSnapshot>>
    where
        F: FnOnce(&StoreSnapshot) -> PermissionResult<StoreSnapshot>,
        P: FnOnce(&StoreSnapshot) -> PermissionResult<()>,
    {
        let _guard = self.writer.lock();
        let next = Arc::new(build(&self.current.load())?);
        persist(&next)?;
        self.current.store(Arc::clone(&next));
        Ok(next)
    }
}
