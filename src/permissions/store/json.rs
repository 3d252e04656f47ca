/*!
 * JSON Snapshot Store
 * Role store persisted as one JSON document
 */

use super::{RoleStore, SnapshotCell, StoreSnapshot};
use crate::core::errors::PermissionError;
use crate::core::types::PermissionResult;
use crate::permissions::role::Role;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Store written through to a JSON file on every change
pub struct JsonFileRoleStore {
    path: PathBuf,
    cell: SnapshotCell,
}

impl JsonFileRoleStore {
    /// Open the file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> PermissionResult<Self> {
        let path = path.into();
        let snapshot: StoreSnapshot = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| store_error(&path, e))?;
            serde_json::from_str(&raw).map_err(|e| store_error(&path, e))?
        } else {
            StoreSnapshot::default()
        };

        info!(
            path = %path.display(),
            roles = snapshot.roles.len(),
            "Opened role store"
        );
        Ok(Self {
            path,
            cell: SnapshotCell::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(path: &Path, snapshot: &StoreSnapshot) -> PermissionResult<()> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| store_error(path, e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| store_error(path, e))?;
        debug!(path = %path.display(), roles = snapshot.roles.len(), "Role store persisted");
        Ok(())
    }
}

fn store_error(path: &Path, err: impl std::fmt::Display) -> PermissionError {
    PermissionError::Store(format!("{}: {err}", path.display()))
}

impl RoleStore for JsonFileRoleStore {
    fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.cell.load()
    }

    fn replace(&self, snapshot: StoreSnapshot) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell
            .commit(|_| Ok(snapshot), |next| Self::persist(&self.path, next))
    }

    fn save_role(&self, role: Role) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell.commit(
            |current| Ok(current.with_role(role)),
            |next| Self::persist(&self.path, next),
        )
    }

    fn delete_role(&self, role_id: &str) -> PermissionResult<Arc<StoreSnapshot>> {
        self.cell.commit(
            |current| current.without_role(role_id),
            |next| Self::persist(&self.path, next),
        )
    }
}
