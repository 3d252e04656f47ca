/*!
 * Permission Manager
 * Single entry point for permission checks, loading and role editing
 */

mod roles;

use super::audit::{AuditEvent, AuditLogger, AuditStats, Decision};
use super::cache::{CacheStats, PermissionCache};
use super::compiler::PermissionCompiler;
use super::gate::PermissionGate;
use super::loader::{FileLoader, LoadedRoles};
use super::role::{Actor, Role, RoleContext, TargetResolver, TargetScope};
use super::store::{RoleStore, StoreSnapshot};
use super::tree::{PermissionTree, TreeEntry};
use crate::core::errors::{PermissionError, PermissionFileError};
use crate::core::types::{GuildId, PermissionKey, PermissionResult};
use crate::monitoring::span_operation;
use ahash::AHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Central permission manager
#[derive(Clone)]
pub struct PermissionManager {
    tree: Arc<PermissionTree>,
    compiler: PermissionCompiler,
    loader: FileLoader,
    resolver: Arc<TargetResolver>,
    /// Authoritative roles and orders
    store: Arc<dyn RoleStore>,
    /// Fast-path projection of the store
    cache: Arc<PermissionCache>,
    audit: Arc<AuditLogger>,
    role_file: Option<PathBuf>,
}

impl PermissionManager {
    pub fn new(
        tree: Arc<PermissionTree>,
        store: Arc<dyn RoleStore>,
        cache: Arc<PermissionCache>,
        resolver: TargetResolver,
    ) -> Self {
        debug!(keys = tree.len(), "Initializing permission manager");
        Self {
            compiler: PermissionCompiler::new(Arc::clone(&tree)),
            loader: FileLoader::new(Arc::clone(&tree)),
            tree,
            resolver: Arc::new(resolver),
            store,
            cache,
            audit: Arc::new(AuditLogger::new()),
            role_file: None,
        }
    }

    /// Role document used by [`reload`](Self::reload)
    pub fn with_role_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.role_file = Some(path.into());
        self
    }

    pub fn tree(&self) -> &Arc<PermissionTree> {
        &self.tree
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn role_file(&self) -> Option<&Path> {
        self.role_file.as_deref()
    }

    /// Get audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit.stats()
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store.snapshot()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the actor may use `key`; unmentioned keys yield `default`
    ///
    /// Owners are granted before the key is even looked up. A key the tree
    /// does not know yields `default`. A namespace path is checked like
    /// [`has_all`](Self::has_all): every key below it needs an explicit
    /// grant and `default` is not consulted. An unreachable cache denies.
    pub fn has(&self, actor: &Actor, key: &str, default: bool) -> bool {
        self.has_scoped(actor, key, default, TargetScope::All)
    }

    /// [`has`](Self::has) restricted to a target scope
    pub fn has_scoped(&self, actor: &Actor, key: &str, default: bool, scope: TargetScope) -> bool {
        if self.resolver.is_owner(actor.user_id) {
            let keys = self.unfold(key).unwrap_or_else(|| vec![key.to_string()]);
            self.record(actor, keys, Decision::OwnerBypass, None);
            return true;
        }

        let keys = match self.unfold(key) {
            Some(keys) => keys,
            None => {
                warn!(key = %key, "Checked a permission the tree does not know");
                return default;
            }
        };
        if keys.len() != 1 {
            return self.has_all_scoped(actor, &keys, scope);
        }
        let leaf = keys[0].clone();

        let targets = self.resolver.targets_for(actor, scope);
        match self.cache.has(&targets, &leaf) {
            Ok(Some(granted)) => {
                let decision = if granted {
                    Decision::Granted
                } else {
                    Decision::Denied
                };
                self.record(actor, keys, decision, None);
                granted
            }
            Ok(None) => {
                self.record(actor, keys, Decision::Defaulted, None);
                default
            }
            Err(e) => {
                self.cache_failure(actor, keys, &e);
                false
            }
        }
    }

    /// Whether every key (or every key below a namespace) is explicitly granted
    pub fn has_all<S: AsRef<str>>(&self, actor: &Actor, keys: &[S]) -> bool {
        self.ensure_all(actor, keys).is_ok()
    }

    /// Like [`has_all`](Self::has_all) but names the missing keys
    pub fn ensure_all<S: AsRef<str>>(&self, actor: &Actor, keys: &[S]) -> PermissionResult<()> {
        self.ensure_all_scoped(actor, keys, TargetScope::All)
    }

    fn has_all_scoped(&self, actor: &Actor, keys: &[PermissionKey], scope: TargetScope) -> bool {
        self.ensure_all_scoped(actor, keys, scope).is_ok()
    }

    fn ensure_all_scoped<S: AsRef<str>>(
        &self,
        actor: &Actor,
        keys: &[S],
        scope: TargetScope,
    ) -> PermissionResult<()> {
        let mut unfolded: Vec<PermissionKey> = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let expanded = self
                .unfold(key)
                .ok_or_else(|| PermissionError::UnknownPermission(key.to_string()))?;
            for key in expanded {
                if !unfolded.contains(&key) {
                    unfolded.push(key);
                }
            }
        }

        if unfolded.is_empty() {
            return Ok(());
        }

        if self.resolver.is_owner(actor.user_id) {
            self.record(actor, unfolded, Decision::OwnerBypass, None);
            return Ok(());
        }

        let targets = self.resolver.targets_for(actor, scope);
        match self.cache.has_all(&targets, &unfolded) {
            Ok(outcome) if outcome.granted => {
                self.record(actor, unfolded, Decision::Granted, None);
                Ok(())
            }
            Ok(outcome) => {
                self.record(actor, outcome.missing.clone(), Decision::Denied, None);
                Err(PermissionError::Denied {
                    missing: outcome.missing,
                })
            }
            Err(e) => {
                self.cache_failure(actor, unfolded, &e);
                Err(e)
            }
        }
    }

    /// Pre-dispatch check of a gated operation
    pub fn check_gate(&self, actor: &Actor, gate: &PermissionGate) -> PermissionResult<()> {
        let mut missing = Vec::new();
        for (scope, keys) in gate.requirements() {
            match self.ensure_all_scoped(actor, keys, scope) {
                Ok(()) => {}
                Err(PermissionError::Denied { missing: keys }) => missing.extend(keys),
                Err(e) => return Err(e),
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PermissionError::Denied { missing })
        }
    }

    /// Whether any of the actor's targets holds the role
    pub fn has_role(&self, actor: &Actor, role_id: &str) -> bool {
        let targets = self.resolver.targets_for(actor, TargetScope::All);
        self.cache.has_role(&targets, role_id).unwrap_or_else(|e| {
            self.cache_failure(actor, Vec::new(), &e);
            false
        })
    }

    /// Roles reaching the actor, in resolution order
    pub fn get_roles_for(&self, actor: &Actor) -> Vec<Role> {
        let snapshot = self.store.snapshot();
        let mut seen = AHashSet::new();
        let mut roles = Vec::new();

        for target in self.resolver.targets_for(actor, TargetScope::All) {
            for role_id in snapshot.target(target).role_ids {
                if seen.insert(role_id.clone()) {
                    if let Some(role) = snapshot.role(&role_id) {
                        roles.push(role.clone());
                    }
                }
            }
        }
        roles
    }

    /// Look a role up by id or name within an optional scope
    pub fn find_role(
        &self,
        context: Option<RoleContext>,
        guild_id: Option<GuildId>,
        query: &str,
    ) -> Option<Role> {
        self.store
            .snapshot()
            .find_role(context, guild_id, query)
            .cloned()
    }

    fn unfold(&self, key: &str) -> Option<Vec<PermissionKey>> {
        self.tree.traverse(key).map(TreeEntry::keys)
    }

    fn record(&self, actor: &Actor, keys: Vec<PermissionKey>, decision: Decision, detail: Option<String>) {
        let mut event = AuditEvent::new(actor.user_id, actor.guild_id(), keys, decision);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.audit.log(event);
    }

    fn cache_failure(&self, actor: &Actor, keys: Vec<PermissionKey>, err: &PermissionError) {
        error!(
            user_id = actor.user_id,
            keys = ?keys,
            error = %err,
            "Permission check failed closed"
        );
        self.record(actor, keys, Decision::CacheFailure, Some(err.to_string()));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Project the stored roles, seeding the store from the role file when empty
    pub fn initialize(&self) -> PermissionResult<()> {
        if self.store.snapshot().roles.is_empty() && self.role_file.is_some() {
            return self.reload();
        }
        self.rebuild_cache()
    }

    /// Re-read the role file; on failure the active roles stay untouched
    pub fn reload(&self) -> PermissionResult<()> {
        let path = self
            .role_file
            .as_ref()
            .ok_or_else(|| PermissionFileError::document("no role file configured"))?;
        let loaded = self.loader.load_from_path(path)?;
        self.apply(loaded)
    }

    /// Replace every role with the ones in a document
    pub fn load_document(&self, source: &str) -> PermissionResult<()> {
        let loaded = self.loader.load_from_str(source)?;
        self.apply(loaded)
    }

    /// Replace every role with an already loaded set
    pub fn apply(&self, loaded: LoadedRoles) -> PermissionResult<()> {
        let span = span_operation("apply_roles");
        let _entered = span.enter();
        span.record_roles(loaded.roles.len());

        let result = self.replace_all(loaded);
        span.record_result(&result);
        result
    }

    fn replace_all(&self, loaded: LoadedRoles) -> PermissionResult<()> {
        let compiled = self.compiler.compile_all(&loaded.roles)?;
        let snapshot = self.store.replace(StoreSnapshot::from_loaded(loaded))?;
        self.cache.rebuild(&compiled, &snapshot.targets())?;

        info!(
            roles = snapshot.roles.len(),
            orders = snapshot.orders.len(),
            "Permission roles applied"
        );
        Ok(())
    }

    /// Wipe the cache namespace and project the store again
    pub fn rebuild_cache(&self) -> PermissionResult<()> {
        let span = span_operation("rebuild_cache");
        let _entered = span.enter();

        let snapshot = self.store.snapshot();
        span.record_roles(snapshot.roles.len());
        let result = self
            .compiler
            .compile_all(&snapshot.roles)
            .and_then(|compiled| self.cache.rebuild(&compiled, &snapshot.targets()));
        span.record_result(&result);

        if result.is_ok() {
            info!(roles = snapshot.roles.len(), "Permission cache rebuilt");
        }
        result
    }
}
