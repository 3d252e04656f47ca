/*!
 * Core Types
 * Common identifiers used across the permission engine
 */

/// Snowflake id of a user (global account)
pub type UserId = u64;

/// Snowflake id of a guild (tenant)
pub type GuildId = u64;

/// Snowflake id of a guild-managed role (the tenant's own role, not an engine [`Role`])
///
/// [`Role`]: crate::permissions::role::Role
pub type GuildRoleId = u64;

/// Absolute id of an engine role (`<guildId>:<localId>` for guild roles)
pub type RoleId = String;

/// Fully qualified dotted permission key
pub type PermissionKey = String;

/// Common result type for engine operations
pub type PermissionResult<T> = Result<T, super::errors::PermissionError>;
