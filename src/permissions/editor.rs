/*!
 * Role Editor
 * Single-role draft, validated and persisted through the manager
 *
 * A draft works on the role's own flat permission map; grants and denies are
 * written back in their shortest form when the draft is finished.
 */

use super::role::{Role, RoleTarget};
use super::tree::{PermSpec, PermissionTree};
use crate::core::errors::PermissionError;
use crate::core::limits::MAX_ROLE_NAME_LEN;
use crate::core::types::{PermissionKey, PermissionResult, RoleId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Editor session for one role
#[derive(Debug, Clone)]
pub struct RoleDraft {
    tree: Arc<PermissionTree>,
    original: Option<Role>,
    role: Role,
    own: BTreeMap<PermissionKey, bool>,
}

impl RoleDraft {
    /// Draft of a role that does not exist yet
    pub fn create(tree: Arc<PermissionTree>, role: Role) -> PermissionResult<Self> {
        Self::open(tree, None, role)
    }

    /// Draft of a persisted role
    pub fn edit(tree: Arc<PermissionTree>, role: Role) -> PermissionResult<Self> {
        Self::open(tree, Some(role.clone()), role)
    }

    fn open(tree: Arc<PermissionTree>, original: Option<Role>, role: Role) -> PermissionResult<Self> {
        let own = tree.compile(&role.grant, &role.deny)?;
        Ok(Self {
            tree,
            original,
            role,
            own,
        })
    }

    pub fn id(&self) -> &str {
        &self.role.id
    }

    pub fn name(&self) -> &str {
        &self.role.name
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    /// Persisted version the draft started from
    pub fn original(&self) -> Option<&Role> {
        self.original.as_ref()
    }

    pub fn base_ids(&self) -> &[RoleId] {
        &self.role.base_ids
    }

    pub fn targets(&self) -> &[RoleTarget] {
        &self.role.targets
    }

    /// Own explicit value of a key
    pub fn own_value(&self, key: &str) -> Option<bool> {
        self.own.get(key).copied()
    }

    pub fn rename(&mut self, name: impl Into<String>) -> PermissionResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PermissionError::InvalidRole("role needs a name".into()));
        }
        if name.len() > MAX_ROLE_NAME_LEN {
            return Err(PermissionError::InvalidRole("name is too long".into()));
        }
        self.role.name = name;
        Ok(())
    }

    /// Explicitly grant every key the entry stands for
    pub fn grant(&mut self, spec: impl Into<PermSpec>) -> PermissionResult<Vec<PermissionKey>> {
        self.set(spec.into(), Some(true))
    }

    /// Explicitly deny every key the entry stands for
    pub fn deny(&mut self, spec: impl Into<PermSpec>) -> PermissionResult<Vec<PermissionKey>> {
        self.set(spec.into(), Some(false))
    }

    /// Drop own entries so the keys fall back to the bases
    pub fn unset(&mut self, spec: impl Into<PermSpec>) -> PermissionResult<Vec<PermissionKey>> {
        self.set(spec.into(), None)
    }

    fn set(&mut self, spec: PermSpec, value: Option<bool>) -> PermissionResult<Vec<PermissionKey>> {
        let keys = self.tree.resolve_spec(&spec)?;
        for key in &keys {
            match value {
                Some(value) => {
                    self.own.insert(key.clone(), value);
                }
                None => {
                    self.own.remove(key);
                }
            }
        }
        Ok(keys)
    }

    pub fn add_base(&mut self, base_id: impl Into<RoleId>) -> PermissionResult<()> {
        let base_id = base_id.into();
        if base_id == self.role.id {
            return Err(PermissionError::CyclicBase {
                role: self.role.id.clone(),
                base: base_id,
                reason: "a role cannot inherit from itself".into(),
            });
        }
        if self.role.base_ids.contains(&base_id) {
            return Err(PermissionError::InvalidRole(format!(
                "{base_id} is already a base of {}",
                self.role.id
            )));
        }
        self.role.base_ids.push(base_id);
        Ok(())
    }

    pub fn remove_base(&mut self, base_id: &str) -> PermissionResult<()> {
        let before = self.role.base_ids.len();
        self.role.base_ids.retain(|id| id != base_id);
        if self.role.base_ids.len() == before {
            return Err(PermissionError::InvalidRole(format!(
                "{base_id} is not a base of {}",
                self.role.id
            )));
        }
        Ok(())
    }

    /// Assign the role to a target
    pub fn assign(&mut self, target: RoleTarget) -> PermissionResult<bool> {
        self.role.check_target(target)?;
        if self.role.targets.contains(&target) {
            return Ok(false);
        }
        self.role.targets.push(target);
        Ok(true)
    }

    pub fn unassign(&mut self, target: RoleTarget) -> bool {
        let before = self.role.targets.len();
        self.role.targets.retain(|existing| *existing != target);
        self.role.targets.len() != before
    }

    /// Whether the targets differ from the persisted role
    pub fn targets_changed(&self) -> bool {
        match &self.original {
            Some(original) => original.targets != self.role.targets,
            None => !self.role.targets.is_empty(),
        }
    }

    /// Reasons the draft cannot be saved as it is
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.role.name.trim().is_empty() {
            problems.push("role needs a name".to_string());
        }
        if self.own.is_empty() && self.role.base_ids.is_empty() {
            problems.push("role grants and denies nothing and inherits from nothing".to_string());
        }
        problems
    }

    /// Role as it would be persisted
    pub fn to_role(&self) -> Role {
        let mut role = self.role.clone();
        role.grant.clear();
        role.deny.clear();
        for (path, granted) in self.tree.shortest_representation(&self.own) {
            if granted {
                role.grant.push(PermSpec::Key(path));
            } else {
                role.deny.push(PermSpec::Key(path));
            }
        }
        role
    }
}
