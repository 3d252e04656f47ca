/*!
 * Rolegate Library
 * Role-based permission engine exposed as a library
 */

pub mod config;
pub mod core;
pub mod monitoring;
pub mod permissions;

// Re-exports
pub use config::EngineConfig;
pub use crate::core::errors::{FileLocation, PermissionError, PermissionFileError, TreeError};
pub use crate::core::types::{GuildId, PermissionKey, PermissionResult, RoleId, UserId};
pub use monitoring::init_tracing;
pub use permissions::tree::taxonomy as perms;
pub use permissions::{
    Actor, HeldRole, Membership, PermissionGate, PermissionManager, PermissionTree, Role,
    RoleContext, RoleDraft, RoleTarget, TargetScope,
};
