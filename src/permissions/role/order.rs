/*!
 * Role Order
 * Priority of roles within and across scopes
 */

use super::context::RoleContext;
use super::model::Role;
use super::target::RoleTarget;
use crate::core::types::{GuildId, RoleId};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rank of a role: (context order value, index in its order); lower wins
pub type OrderValue = (u8, usize);

/// Role id to rank
pub type OrderMap = AHashMap<RoleId, OrderValue>;

const UNORDERED: OrderValue = (u8::MAX, usize::MAX);

/// Ordered role ids of one (context, guild) scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOrder {
    /// Guild id for guild scopes, context name otherwise
    pub order_id: String,
    pub context: RoleContext,
    pub guild_id: Option<GuildId>,
    pub role_ids: Vec<RoleId>,
}

impl RoleOrder {
    pub fn new(context: RoleContext, guild_id: Option<GuildId>) -> Self {
        Self {
            order_id: context.order_id(guild_id),
            context,
            guild_id,
            role_ids: Vec::new(),
        }
    }

    pub fn order_value(&self) -> u8 {
        self.context.order_value()
    }

    pub fn index_of(&self, role_id: &str) -> Option<usize> {
        self.role_ids.iter().position(|id| id == role_id)
    }

    /// Rank of every role in this order
    pub fn order_map(&self) -> impl Iterator<Item = (RoleId, OrderValue)> + '_ {
        let value = self.order_value();
        self.role_ids
            .iter()
            .enumerate()
            .map(move |(index, role_id)| (role_id.clone(), (value, index)))
    }

    /// Group roles by scope keeping their relative order
    pub fn from_roles<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Vec<RoleOrder> {
        let mut orders: Vec<RoleOrder> = Vec::new();
        for role in roles {
            let order_id = role.order_id();
            match orders.iter_mut().find(|order| order.order_id == order_id) {
                Some(order) => order.role_ids.push(role.id.clone()),
                None => {
                    let mut order = RoleOrder::new(role.context, role.guild_id);
                    order.role_ids.push(role.id.clone());
                    orders.push(order);
                }
            }
        }
        orders
    }
}

/// Merge every order into one rank lookup
pub fn build_order_map<'a>(orders: impl IntoIterator<Item = &'a RoleOrder>) -> OrderMap {
    let mut map = OrderMap::default();
    for order in orders {
        map.extend(order.order_map());
    }
    map
}

/// Roles assigned to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target_id: RoleTarget,
    pub role_ids: Vec<RoleId>,
}

impl Target {
    pub fn new(target_id: RoleTarget, role_ids: Vec<RoleId>) -> Self {
        Self { target_id, role_ids }
    }

    /// Sort roles most-powerful-first; roles missing from the map go last
    pub fn sort(&mut self, order_map: &OrderMap) {
        for role_id in &self.role_ids {
            if !order_map.contains_key(role_id) {
                warn!(target_id = %self.target_id, role_id = %role_id, "Role has no order, ranking it last");
            }
        }

        self.role_ids
            .sort_by_key(|role_id| order_map.get(role_id).copied().unwrap_or(UNORDERED));
    }

    /// Invert role -> targets into target -> roles, in first-seen order
    pub fn invert<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Vec<Target> {
        let mut targets: Vec<Target> = Vec::new();
        let mut index: AHashMap<RoleTarget, usize> = AHashMap::new();

        for role in roles {
            for target_id in &role.targets {
                match index.get(target_id) {
                    Some(&i) => targets[i].role_ids.push(role.id.clone()),
                    None => {
                        index.insert(*target_id, targets.len());
                        targets.push(Target::new(*target_id, vec![role.id.clone()]));
                    }
                }
            }
        }
        targets
    }
}
