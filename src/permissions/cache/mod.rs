/*!
 * Permission Cache
 * Denormalized projection answering checks in one round trip
 *
 * Layout under the namespace prefix `<ns>`:
 *
 * ```text
 * <ns>:roles:<roleId>:permissions   hash   key -> "1" | "0"
 * <ns>:targets:<targetId>           list   role ids, highest priority first
 * ```
 *
 * Only compiled, persisted roles are ever written here; every write is a
 * single atomic pipeline.
 */

mod backend;
mod memory;

pub use backend::{CacheBackend, Command, Pipeline, Script, ScriptReply};
pub use memory::MemoryBackend;

use super::compiler::CompiledPermissions;
use super::role::{RoleTarget, Target};
use crate::core::errors::PermissionError;
use crate::core::limits::{DENY_VALUE, GRANT_VALUE};
use crate::core::types::{PermissionKey, PermissionResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Answer to a multi-key check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub granted: bool,
    /// Keys without an explicit grant, including an explicitly denied one
    pub missing: Vec<PermissionKey>,
}

impl BatchOutcome {
    pub fn granted() -> Self {
        Self {
            granted: true,
            missing: Vec::new(),
        }
    }
}

/// Fast-path permission store
pub struct PermissionCache {
    backend: Arc<dyn CacheBackend>,
    namespace: String,
    lookups: AtomicU64,
    explicit: AtomicU64,
    unresolved: AtomicU64,
    failures: AtomicU64,
}

impl PermissionCache {
    pub fn new(backend: Arc<dyn CacheBackend>, namespace: impl Into<String>) -> PermissionResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self {
            backend,
            namespace,
            lookups: AtomicU64::new(0),
            explicit: AtomicU64::new(0),
            unresolved: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn role_key(&self, role_id: &str) -> String {
        format!("{}:roles:{role_id}:permissions", self.namespace)
    }

    pub fn target_key(&self, target: &RoleTarget) -> String {
        format!("{}:targets:{target}", self.namespace)
    }

    /// First explicit value of `key` for the ordered targets
    pub fn has(&self, targets: &[RoleTarget], key: &str) -> PermissionResult<Option<bool>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let reply = self.eval(Script::HasPermission {
            prefix: self.namespace.clone(),
            targets: target_strings(targets),
            key: key.to_string(),
        })?;

        let value = match reply {
            ScriptReply::Value(value) => Some(value == GRANT_VALUE),
            _ => None,
        };

        match value {
            Some(_) => self.explicit.fetch_add(1, Ordering::Relaxed),
            None => self.unresolved.fetch_add(1, Ordering::Relaxed),
        };
        Ok(value)
    }

    /// Whether every key is explicitly granted
    pub fn has_all(&self, targets: &[RoleTarget], keys: &[PermissionKey]) -> PermissionResult<BatchOutcome> {
        if keys.is_empty() {
            return Ok(BatchOutcome::granted());
        }
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let reply = self.eval(Script::HasAllPermissions {
            prefix: self.namespace.clone(),
            targets: target_strings(targets),
            keys: keys.to_vec(),
        })?;

        let missing = match reply {
            ScriptReply::List(missing) => missing,
            other => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                return Err(PermissionError::CacheUnavailable(format!(
                    "unexpected script reply {other:?}"
                )));
            }
        };

        if missing.is_empty() {
            self.explicit.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unresolved.fetch_add(1, Ordering::Relaxed);
        }
        Ok(BatchOutcome {
            granted: missing.is_empty(),
            missing,
        })
    }

    /// Whether any of the targets holds the role
    pub fn has_role(&self, targets: &[RoleTarget], role_id: &str) -> PermissionResult<bool> {
        let reply = self.eval(Script::AnyTargetHasRole {
            prefix: self.namespace.clone(),
            targets: target_strings(targets),
            role_id: role_id.to_string(),
        })?;
        Ok(reply == ScriptReply::Value(GRANT_VALUE.to_string()))
    }

    /// Wipe the namespace and project everything in one pipeline
    pub fn rebuild(&self, compiled: &[CompiledPermissions], targets: &[Target]) -> PermissionResult<()> {
        let mut pipeline = Pipeline::new();
        pipeline
            .del_matching(format!("{}:roles:*", self.namespace))
            .del_matching(format!("{}:targets:*", self.namespace));
        self.push_roles(&mut pipeline, compiled);
        self.push_targets(&mut pipeline, targets);

        debug!(
            namespace = %self.namespace,
            roles = compiled.len(),
            targets = targets.len(),
            "Rebuilding permission cache"
        );
        self.exec(&pipeline)
    }

    /// Overwrite some roles and target lists, drop others, atomically
    pub fn project(
        &self,
        compiled: &[CompiledPermissions],
        targets: &[Target],
        removed: &[String],
    ) -> PermissionResult<()> {
        let mut pipeline = Pipeline::new();
        for role_id in removed {
            pipeline.del(self.role_key(role_id));
        }
        self.push_roles(&mut pipeline, compiled);
        self.push_targets(&mut pipeline, targets);

        debug!(
            roles = compiled.len(),
            targets = targets.len(),
            removed = removed.len(),
            "Projecting roles into cache"
        );
        self.exec(&pipeline)
    }

    fn push_roles(&self, pipeline: &mut Pipeline, compiled: &[CompiledPermissions]) {
        for role in compiled {
            let key = self.role_key(&role.role_id);
            pipeline.del(key.clone());
            if role.flat.is_empty() {
                warn!(role_id = %role.role_id, "Role compiles to no permissions, skipping");
                continue;
            }
            let fields = role
                .flat
                .iter()
                .map(|(perm, granted)| {
                    let value = if *granted { GRANT_VALUE } else { DENY_VALUE };
                    (perm.clone(), value.to_string())
                })
                .collect();
            pipeline.hset(key, fields);
        }
    }

    fn push_targets(&self, pipeline: &mut Pipeline, targets: &[Target]) {
        for target in targets {
            let key = self.target_key(&target.target_id);
            pipeline.del(key.clone());
            if target.role_ids.is_empty() {
                continue;
            }
            pipeline.rpush(key, target.role_ids.clone());
        }
    }

    fn exec(&self, pipeline: &Pipeline) -> PermissionResult<()> {
        self.backend.exec(pipeline).inspect_err(|e| {
            self.failures.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, commands = pipeline.len(), "Cache write failed");
        })
    }

    fn eval(&self, script: Script) -> PermissionResult<ScriptReply> {
        self.backend.eval(&script).inspect_err(|e| {
            self.failures.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, "Cache lookup failed");
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let explicit = self.explicit.load(Ordering::Relaxed);
        let explicit_rate = if lookups > 0 {
            (explicit as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            lookups,
            explicit,
            unresolved: self.unresolved.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            explicit_rate,
        }
    }
}

/// A namespace is one key segment: no ':' and no glob syntax
pub fn validate_namespace(namespace: &str) -> PermissionResult<()> {
    let valid = !namespace.is_empty()
        && namespace
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(PermissionError::InvalidNamespace(namespace.to_string()))
    }
}

fn target_strings(targets: &[RoleTarget]) -> Vec<String> {
    targets.iter().map(ToString::to_string).collect()
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub lookups: u64,
    pub explicit: u64,
    pub unresolved: u64,
    pub failures: u64,
    pub explicit_rate: f64,
}
