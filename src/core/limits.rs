/*!
 * Engine Limits and Constants
 *
 * Centralized location for the engine's fixed values, grouped by domain.
 * Security-critical constants are marked with [SECURITY].
 */

// =============================================================================
// CACHE LAYOUT
// =============================================================================

/// Default key namespace inside a shared cache store
pub const DEFAULT_CACHE_NAMESPACE: &str = "permissions";

/// Cached value of an explicit grant
pub const GRANT_VALUE: &str = "1";

/// Cached value of an explicit deny
pub const DENY_VALUE: &str = "0";

// =============================================================================
// ROLE VALIDATION
// =============================================================================

/// Maximum length of a role name
pub const MAX_ROLE_NAME_LEN: usize = 100;

/// Maximum length of a local role id
pub const MAX_ROLE_ID_LEN: usize = 64;

/// Maximum inheritance depth followed by the compiler
/// [SECURITY] Bounds recursion on hand-edited stores that bypassed validation
pub const MAX_INHERITANCE_DEPTH: usize = 64;

// =============================================================================
// AUDIT
// =============================================================================

/// Maximum events kept in the global audit ring buffer
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum events kept per user
pub const MAX_AUDIT_EVENTS_PER_USER: usize = 100;

/// Maximum users with their own event log; the oldest tracked user is evicted
/// [PERF] Bounds memory when many distinct users are denied
pub const MAX_AUDIT_USERS: usize = 1_024;

// =============================================================================
// DEFAULT FILES
// =============================================================================

/// Role document used when no path is configured
pub const DEFAULT_ROLE_FILE: &str = "permissions.yml";
