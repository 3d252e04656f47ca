/*!
 * Reload Tests
 */

use crate::support::*;
use rolegate::{perms, PermissionError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_initialize_seeds_from_role_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permissions.yml");
    fs::write(&path, DOCUMENT).unwrap();

    let h = empty_harness();
    let manager = h.manager.clone().with_role_file(&path);
    manager.initialize().unwrap();

    assert_eq!(manager.snapshot().roles.len(), 5);
    assert!(manager.has(&guild_owner(), perms::queue::remove, false));
}

#[test]
fn test_failed_reload_keeps_active_roles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permissions.yml");
    fs::write(&path, DOCUMENT).unwrap();

    let h = empty_harness();
    let manager = h.manager.clone().with_role_file(&path);
    manager.initialize().unwrap();
    let before = manager.snapshot();
    let keys_before = h.backend.keys();

    fs::write(
        &path,
        "global_roles:\n  - id: member\n    name: Member\n    grant: queue.nope\n",
    )
    .unwrap();
    assert!(matches!(manager.reload(), Err(PermissionError::File(_))));

    assert_eq!(*manager.snapshot(), *before);
    assert_eq!(h.backend.keys(), keys_before);
    assert!(manager.has(&guild_owner(), perms::queue::remove, false));
    assert!(!manager.has(&member(), perms::queue::add::stream, true));
}

#[test]
fn test_reload_replaces_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permissions.yml");
    fs::write(&path, DOCUMENT).unwrap();

    let h = empty_harness();
    let manager = h.manager.clone().with_role_file(&path);
    manager.initialize().unwrap();

    fs::write(
        &path,
        "global_roles:\n  - id: everyone\n    name: Everyone\n    targets: \"#everyone\"\n    grant: player\n",
    )
    .unwrap();
    manager.reload().unwrap();

    assert_eq!(manager.snapshot().roles.len(), 1);
    assert!(!manager.has(&guild_owner(), perms::queue::remove, false));
    assert!(manager.has(&member(), perms::player::skip, false));
    assert!(h
        .backend
        .keys()
        .iter()
        .all(|key| !key.contains("guild_owner")));
}

#[test]
fn test_reload_without_file_or_with_missing_file() {
    let h = harness();
    assert!(matches!(h.manager.reload(), Err(PermissionError::File(_))));

    let dir = TempDir::new().unwrap();
    let manager = h.manager.clone().with_role_file(dir.path().join("absent.yml"));
    assert!(matches!(manager.reload(), Err(PermissionError::File(_))));
    assert_eq!(manager.snapshot().roles.len(), 5);
}

#[test]
fn test_failed_cache_write_surfaces_but_store_is_updated() {
    let h = harness();
    h.backend.set_available(false);
    assert!(matches!(
        h.manager.load_document("global_roles: []\n"),
        Err(PermissionError::CacheUnavailable(_))
    ));
    assert!(h.manager.snapshot().roles.is_empty());

    h.backend.set_available(true);
    h.manager.rebuild_cache().unwrap();
    assert!(h.backend.keys().is_empty());
    assert!(h.manager.has(&member(), perms::queue::add::entry, true));
}
