/*!
 * Permission Gates
 * Keys an operation declares up front, checked before it runs
 */

use super::role::TargetScope;
use crate::core::types::PermissionKey;
use serde::{Deserialize, Serialize};

/// Required keys of one gated operation
///
/// ```ignore
/// let gate = PermissionGate::new()
///     .require(perms::player::skip)
///     .require_global(perms::admin::control::execute);
/// manager.check_gate(&actor, &gate)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGate {
    scoped: Vec<PermissionKey>,
    global: Vec<PermissionKey>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a key, resolved with the actor's guild roles
    pub fn require(mut self, key: impl Into<PermissionKey>) -> Self {
        push_unique(&mut self.scoped, key.into());
        self
    }

    /// Require a key, resolved from global targets only
    pub fn require_global(mut self, key: impl Into<PermissionKey>) -> Self {
        push_unique(&mut self.global, key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scoped.is_empty() && self.global.is_empty()
    }

    /// Key groups with the scope each is checked in
    pub fn requirements(&self) -> impl Iterator<Item = (TargetScope, &[PermissionKey])> {
        [
            (TargetScope::All, self.scoped.as_slice()),
            (TargetScope::GlobalOnly, self.global.as_slice()),
        ]
        .into_iter()
        .filter(|(_, keys)| !keys.is_empty())
    }
}

fn push_unique(keys: &mut Vec<PermissionKey>, key: PermissionKey) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}
