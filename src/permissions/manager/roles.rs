/*!
 * Role Editing
 * Persisting editor drafts and deleting roles
 */

use super::PermissionManager;
use crate::core::errors::PermissionError;
use crate::core::types::{PermissionKey, PermissionResult, RoleId};
use crate::permissions::compiler::{dependents_of, CompiledPermissions};
use crate::permissions::editor::RoleDraft;
use crate::permissions::role::{Actor, Role, RoleTarget, Target};
use crate::permissions::store::StoreSnapshot;
use crate::permissions::tree::taxonomy;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

impl PermissionManager {
    /// Start a draft for a new role
    pub fn create_role(&self, role: Role) -> PermissionResult<RoleDraft> {
        RoleDraft::create(Arc::clone(&self.tree), role)
    }

    /// Start a draft for an existing role
    pub fn edit_role(&self, role_id: &str) -> PermissionResult<RoleDraft> {
        let role = self
            .store
            .snapshot()
            .role(role_id)
            .cloned()
            .ok_or_else(|| PermissionError::RoleNotFound(role_id.to_string()))?;
        RoleDraft::edit(Arc::clone(&self.tree), role)
    }

    /// Validate and persist a draft, then re-project it into the cache
    ///
    /// The actor needs `roles.edit`, `roles.assign` when targets changed, and
    /// must itself hold every key whose effective state the save changes.
    pub fn save_role(&self, actor: &Actor, draft: RoleDraft) -> PermissionResult<Role> {
        let problems = draft.problems();
        if !problems.is_empty() {
            return Err(PermissionError::InvalidRole(problems.join("; ")));
        }

        let current = self.store.snapshot();
        let role = draft.to_role();
        self.check_draft(&current, &draft, &role)?;

        let next = current.with_role(role.clone());
        let before = match draft.original() {
            Some(original) => self.effective(&current, original)?,
            None => BTreeMap::new(),
        };
        let after = self.effective(&next, &role)?;

        let mut required: Vec<PermissionKey> = vec![taxonomy::roles::edit.to_string()];
        if draft.targets_changed() {
            required.push(taxonomy::roles::assign.to_string());
        }
        required.extend(changed_keys(&before, &after));
        self.ensure_all(actor, &required)?;

        let next = self.store.save_role(role.clone())?;

        let mut affected: Vec<RoleId> = vec![role.id.clone()];
        affected.extend(dependents_of(&role.id, &next.roles));
        let compiled = self.compile_ids(&next, &affected)?;

        let mut touched: Vec<RoleTarget> = role.targets.clone();
        if let Some(original) = draft.original() {
            touched.extend(original.targets.iter().copied());
        }
        let targets = sorted_targets(&next, touched);

        self.cache.project(&compiled, &targets, &[])?;

        info!(
            role_id = %role.id,
            user_id = actor.user_id,
            dependents = affected.len() - 1,
            created = draft.is_new(),
            "Role saved"
        );
        Ok(role)
    }

    /// Delete a role nothing inherits from
    pub fn delete_role(&self, actor: &Actor, role_id: &str) -> PermissionResult<()> {
        let current = self.store.snapshot();
        let role = current
            .role(role_id)
            .cloned()
            .ok_or_else(|| PermissionError::RoleNotFound(role_id.to_string()))?;

        let dependents = dependents_of(role_id, &current.roles);
        if !dependents.is_empty() {
            return Err(PermissionError::RoleInUse {
                role: role_id.to_string(),
                dependents,
            });
        }

        self.ensure_all(actor, &[taxonomy::roles::edit])?;

        let next = self.store.delete_role(role_id)?;
        let targets = sorted_targets(&next, role.targets.clone());
        self.cache.project(&[], &targets, &[role.id.clone()])?;

        info!(role_id = %role_id, user_id = actor.user_id, "Role deleted");
        Ok(())
    }

    fn check_draft(&self, current: &StoreSnapshot, draft: &RoleDraft, role: &Role) -> PermissionResult<()> {
        match (draft.is_new(), current.role(&role.id)) {
            (true, Some(_)) => return Err(PermissionError::DuplicateRoleId(role.id.clone())),
            (false, None) => return Err(PermissionError::RoleNotFound(role.id.clone())),
            _ => {}
        }

        let name_taken = current.roles.iter().any(|other| {
            other.id != role.id && other.shares_scope(role) && other.name == role.name
        });
        if name_taken {
            return Err(PermissionError::DuplicateRoleName(role.name.clone()));
        }

        for base_id in &role.base_ids {
            let base = current
                .role(base_id)
                .ok_or_else(|| PermissionError::MissingBase {
                    role: role.id.clone(),
                    base: base_id.clone(),
                })?;
            if !role.accepts_base(base) {
                return Err(PermissionError::InvalidRole(format!(
                    "{} cannot inherit from {} ({} role)",
                    role.id, base.id, base.context
                )));
            }
        }

        for target in &role.targets {
            role.check_target(*target)?;
        }
        Ok(())
    }

    fn effective(&self, snapshot: &StoreSnapshot, role: &Role) -> PermissionResult<BTreeMap<PermissionKey, bool>> {
        Ok(self.compiler.compile(role, snapshot.roles.as_slice())?.flat)
    }

    fn compile_ids(&self, snapshot: &StoreSnapshot, ids: &[RoleId]) -> PermissionResult<Vec<CompiledPermissions>> {
        ids.iter()
            .filter_map(|id| snapshot.role(id))
            .map(|role| self.compiler.compile(role, snapshot.roles.as_slice()))
            .collect()
    }
}

/// Keys whose explicit state differs between two flat maps
fn changed_keys(
    before: &BTreeMap<PermissionKey, bool>,
    after: &BTreeMap<PermissionKey, bool>,
) -> Vec<PermissionKey> {
    before
        .keys()
        .chain(after.keys())
        .filter(|key| before.get(*key) != after.get(*key))
        .fold(Vec::new(), |mut keys, key| {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
            keys
        })
}

fn sorted_targets(snapshot: &StoreSnapshot, mut targets: Vec<RoleTarget>) -> Vec<Target> {
    targets.sort();
    targets.dedup();
    targets
        .into_iter()
        .map(|target| snapshot.target(target))
        .collect()
}
