/*!
 * Role Model
 * Roles, the targets they are assigned to and their priority order
 */

pub mod actor;
mod context;
mod model;
mod order;
mod target;

pub use actor::{Actor, HeldRole, Membership, TargetResolver, TargetScope};
pub use context::RoleContext;
pub use model::{absolute_id, Role};
pub use order::{build_order_map, OrderMap, OrderValue, RoleOrder, Target};
pub use target::RoleTarget;
