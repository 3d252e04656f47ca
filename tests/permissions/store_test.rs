/*!
 * Role Store Persistence Tests
 */

use crate::support::{member, owner, tree, DOCUMENT, OWNER};
use rolegate::permissions::{
    JsonFileRoleStore, MemoryBackend, PermissionCache, PermissionManager, Role, RoleStore,
    RoleTarget, TargetResolver,
};
use rolegate::perms;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn manager(store_path: &Path, role_file: &Path) -> (PermissionManager, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = JsonFileRoleStore::open(store_path).unwrap();
    let manager = PermissionManager::new(
        tree(),
        Arc::new(store),
        Arc::new(PermissionCache::new(backend.clone(), "permissions").unwrap()),
        TargetResolver::new([OWNER]),
    )
    .with_role_file(role_file);
    (manager, backend)
}

#[test]
fn test_store_survives_restart_without_role_file() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("roles.json");
    let role_file = dir.path().join("permissions.yml");
    fs::write(&role_file, DOCUMENT).unwrap();

    let (first, _) = manager(&store_path, &role_file);
    first.initialize().unwrap();
    assert!(!first.has(&member(), perms::queue::remove, false));

    let mut draft = first
        .create_role(Role::guild(100, "helper", "Helper"))
        .unwrap();
    draft.grant(perms::queue::remove).unwrap();
    draft
        .assign(RoleTarget::Member {
            guild_id: 100,
            user_id: 3,
        })
        .unwrap();
    first.save_role(&owner(), draft).unwrap();
    assert!(first.has(&member(), perms::queue::remove, false));

    // the second process never sees the document
    fs::remove_file(&role_file).unwrap();

    let (second, backend) = manager(&store_path, &role_file);
    assert!(backend.keys().is_empty());
    second.initialize().unwrap();

    assert!(second.has(&member(), perms::queue::remove, false));
    assert!(second.snapshot().role("100:helper").is_some());
    assert_eq!(second.snapshot().roles.len(), 6);
}

#[test]
fn test_empty_store_without_role_file_initializes() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileRoleStore::open(dir.path().join("roles.json")).unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let manager = PermissionManager::new(
        tree(),
        Arc::new(store),
        Arc::new(PermissionCache::new(backend.clone(), "permissions").unwrap()),
        TargetResolver::default(),
    );

    manager.initialize().unwrap();
    assert!(manager.snapshot().roles.is_empty());
    assert!(backend.keys().is_empty());
    assert!(manager.has(&member(), perms::queue::remove, true));
}

#[test]
fn test_store_snapshot_orders_follow_document() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileRoleStore::open(dir.path().join("roles.json")).unwrap();
    let loaded = rolegate::permissions::FileLoader::new(tree())
        .load_from_str(DOCUMENT)
        .unwrap();
    let snapshot = store
        .replace(rolegate::permissions::StoreSnapshot::from_loaded(loaded))
        .unwrap();

    let everyone = snapshot.target(RoleTarget::Everyone);
    assert_eq!(everyone.role_ids, vec!["member"]);
    assert_eq!(
        snapshot
            .find_role(None, Some(100), "dj")
            .map(|role| role.id.as_str()),
        Some("100:dj")
    );
}
