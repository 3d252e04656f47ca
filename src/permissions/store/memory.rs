/*!
 * In-Memory Role Store
 */

use super::{RoleStore, SnapshotCell, StoreSnapshot};
use crate::core::types::PermissionResult;
use crate::permissions::role::Role;
use std::sync::Arc;

/// Store that lives and dies with the process
pub struct MemoryRoleStore {
    cell: SnapshotCell,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::with_snapshot(StoreSnapshot::default())
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            cell: SnapshotCell::new(snapshot),
        }
    }
}

impl Default for MemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleStore for MemoryRoleStore {
    fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.cell.load()
    }

    fn replace(&self, snapshot: StoreSnapshot) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell.commit(|_| Ok(snapshot), |_| Ok(()))
    }

    fn save_role(&self, role: Role) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell.commit(|current| Ok(current.with_role(role)), |_| Ok(()))
    }

    fn delete_role(&self, role_id: &str) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell.commit(|current| current.without_role(role_id), |_| Ok(()))
    }
}
