/*!
 * Permissions Module
 * Role-based permission resolution for multi-guild deployments
 *
 * Roles are declared in a YAML document, validated by the loader, kept in an
 * authoritative store and projected into a key/value cache that answers a
 * check in a single round trip.
 *
 * ## Usage
 * ```ignore
 * use rolegate::permissions::{Actor, Membership, PermissionManager};
 * use rolegate::perms;
 *
 * let actor = Actor::member(user_id, Membership::new(guild_id));
 * if manager.has(&actor, perms::queue::remove, false) {
 *     // Perform operation
 * }
 *
 * // Name the missing keys
 * if let Err(e) = manager.ensure_all(&actor, &[perms::player::skip, perms::player::seek]) {
 *     eprintln!("{e}");
 * }
 * ```
 */

pub mod audit;
pub mod cache;
pub mod compiler;
pub mod editor;
pub mod gate;
pub mod loader;
pub mod manager;
pub mod role;
pub mod store;
pub mod tree;

// Re-export commonly used items
pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats, Decision};
pub use cache::{BatchOutcome, CacheBackend, CacheStats, MemoryBackend, PermissionCache};
pub use compiler::{dependents_of, CompiledPermissions, PermissionCompiler, RoleLookup, RolePool};
pub use editor::RoleDraft;
pub use gate::PermissionGate;
pub use loader::{FileLoader, LoadedRoles};
pub use manager::PermissionManager;
pub use role::{
    Actor, HeldRole, Membership, Role, RoleContext, RoleOrder, RoleTarget, Target, TargetResolver,
    TargetScope,
};
pub use store::{JsonFileRoleStore, MemoryRoleStore, RoleStore, StoreSnapshot};
pub use tree::{taxonomy, NamespaceDef, PermSpec, PermissionTree, Selector, TreeEntry};
