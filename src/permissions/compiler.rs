/*!
 * Permission Compiler
 * Flattens a role and its inheritance chain into key -> granted
 *
 * Bases are merged in reverse declaration order so the first declared base
 * wins a collision, then the role's own grants and denies are applied on top.
 * An own deny is final and never falls through to a base.
 */

use super::role::Role;
use super::tree::PermissionTree;
use crate::core::errors::PermissionError;
use crate::core::limits::MAX_INHERITANCE_DEPTH;
use crate::core::types::{PermissionKey, PermissionResult, RoleId};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flat permission map of one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPermissions {
    pub role_id: RoleId,
    pub flat: BTreeMap<PermissionKey, bool>,
}

impl CompiledPermissions {
    /// Explicit value for a key, if the role mentions it
    pub fn get(&self, key: &str) -> Option<bool> {
        self.flat.get(key).copied()
    }
}

/// Source of base roles during compilation
pub trait RoleLookup {
    fn role(&self, id: &str) -> Option<&Role>;
}

impl RoleLookup for [Role] {
    fn role(&self, id: &str) -> Option<&Role> {
        self.iter().find(|role| role.id == id)
    }
}

impl<S: std::hash::BuildHasher> RoleLookup for std::collections::HashMap<RoleId, Role, S> {
    fn role(&self, id: &str) -> Option<&Role> {
        self.get(id)
    }
}

impl RoleLookup for BTreeMap<RoleId, Role> {
    fn role(&self, id: &str) -> Option<&Role> {
        self.get(id)
    }
}

/// Borrowed index over a role list
pub struct RolePool<'a> {
    roles: AHashMap<&'a str, &'a Role>,
}

impl<'a> RolePool<'a> {
    pub fn new(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|role| (role.id.as_str(), role)).collect(),
        }
    }
}

impl RoleLookup for RolePool<'_> {
    fn role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id).copied()
    }
}

/// Compiles roles against a registered tree
#[derive(Debug, Clone)]
pub struct PermissionCompiler {
    tree: Arc<PermissionTree>,
}

impl PermissionCompiler {
    pub fn new(tree: Arc<PermissionTree>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<PermissionTree> {
        &self.tree
    }

    /// Compile one role, resolving bases through `lookup`
    pub fn compile<L>(&self, role: &Role, lookup: &L) -> PermissionResult<CompiledPermissions>
    where
        L: RoleLookup + ?Sized,
    {
        let mut memo = AHashMap::new();
        let flat = self.compile_into(role, lookup, &mut Vec::new(), &mut memo)?;
        Ok(CompiledPermissions {
            role_id: role.id.clone(),
            flat,
        })
    }

    /// Compile every role of a pool, sharing work between common bases
    pub fn compile_all(&self, roles: &[Role]) -> PermissionResult<Vec<CompiledPermissions>> {
        let pool = RolePool::new(roles);
        let mut memo = AHashMap::new();
        roles
            .iter()
            .map(|role| {
                let flat = self.compile_into(role, &pool, &mut Vec::new(), &mut memo)?;
                Ok(CompiledPermissions {
                    role_id: role.id.clone(),
                    flat,
                })
            })
            .collect()
    }

    fn compile_into<L>(
        &self,
        role: &Role,
        lookup: &L,
        visiting: &mut Vec<RoleId>,
        memo: &mut AHashMap<RoleId, BTreeMap<PermissionKey, bool>>,
    ) -> PermissionResult<BTreeMap<PermissionKey, bool>>
    where
        L: RoleLookup + ?Sized,
    {
        if let Some(flat) = memo.get(&role.id) {
            return Ok(flat.clone());
        }

        visiting.push(role.id.clone());

        let mut flat = BTreeMap::new();
        for base_id in role.base_ids.iter().rev() {
            if visiting.contains(base_id) {
                return Err(PermissionError::CyclicBase {
                    role: role.id.clone(),
                    base: base_id.clone(),
                    reason: "inheritance cycle".into(),
                });
            }
            if visiting.len() >= MAX_INHERITANCE_DEPTH {
                return Err(PermissionError::CyclicBase {
                    role: role.id.clone(),
                    base: base_id.clone(),
                    reason: "inheritance chain too deep".into(),
                });
            }

            let base = lookup
                .role(base_id)
                .ok_or_else(|| PermissionError::MissingBase {
                    role: role.id.clone(),
                    base: base_id.clone(),
                })?;
            flat.extend(self.compile_into(base, lookup, visiting, memo)?);
        }

        flat.extend(self.tree.compile(&role.grant, &role.deny)?);

        visiting.pop();
        memo.insert(role.id.clone(), flat.clone());
        Ok(flat)
    }
}

/// Every role that inherits from `role_id`, directly or transitively
pub fn dependents_of(role_id: &str, roles: &[Role]) -> Vec<RoleId> {
    let mut affected: AHashSet<&str> = AHashSet::new();
    affected.insert(role_id);

    let mut dependents = Vec::new();
    loop {
        let before = dependents.len();
        for role in roles {
            if affected.contains(role.id.as_str()) {
                continue;
            }
            if role.base_ids.iter().any(|base| affected.contains(base.as_str())) {
                affected.insert(&role.id);
                dependents.push(role.id.clone());
            }
        }
        if dependents.len() == before {
            return dependents;
        }
    }
}
