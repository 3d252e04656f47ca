/*!
 * Role Editing Tests
 */

use crate::support::*;
use pretty_assertions::assert_eq;
use rolegate::permissions::{Role, RoleTarget};
use rolegate::{perms, PermissionError};

fn member_target() -> RoleTarget {
    RoleTarget::Member {
        guild_id: GUILD,
        user_id: MEMBER,
    }
}

fn denied_keys(result: Result<impl std::fmt::Debug, PermissionError>) -> Vec<String> {
    match result {
        Err(PermissionError::Denied { missing }) => missing,
        other => panic!("expected a denial, got {other:?}"),
    }
}

#[test]
fn test_guild_owner_creates_role() {
    let h = harness();
    let mut draft = h
        .manager
        .create_role(Role::guild(GUILD, "helper", "Helper"))
        .unwrap();
    draft.grant(perms::queue::remove).unwrap();
    assert!(draft.assign(member_target()).unwrap());

    let saved = h.manager.save_role(&guild_owner(), draft).unwrap();
    assert_eq!(saved.id, "100:helper");
    assert!(h.manager.has(&member(), perms::queue::remove, false));

    // new roles are ranked last in their order
    let order = h
        .manager
        .snapshot()
        .orders
        .iter()
        .find(|order| order.order_id == "100")
        .map(|order| order.role_ids.clone())
        .unwrap();
    assert_eq!(order, vec!["100:restricted", "100:dj", "100:helper"]);
}

#[test]
fn test_editor_needs_roles_edit() {
    let h = harness();
    let mut draft = h
        .manager
        .create_role(Role::guild(GUILD, "helper", "Helper"))
        .unwrap();
    draft.grant(perms::queue::remove).unwrap();
    draft.assign(member_target()).unwrap();

    let missing = denied_keys(h.manager.save_role(&member(), draft));
    assert_eq!(
        missing,
        vec![perms::roles::edit, perms::roles::assign, perms::queue::remove]
    );
    assert!(h.manager.snapshot().role("100:helper").is_none());
}

#[test]
fn test_editor_cannot_grant_what_it_lacks() {
    let h = harness();
    let mut draft = h.manager.edit_role("100:dj").unwrap();
    draft.grant("summon").unwrap();

    let missing = denied_keys(h.manager.save_role(&guild_owner(), draft));
    assert_eq!(missing, vec![perms::summon::join, perms::summon::steal]);
    assert!(!h.manager.has(&dj(), perms::summon::join, false));
}

#[test]
fn test_assigning_needs_roles_assign() {
    let h = harness();
    let mut editor = h
        .manager
        .create_role(Role::guild(GUILD, "editor", "Editor"))
        .unwrap();
    editor.grant(perms::roles::edit).unwrap();
    editor.assign(member_target()).unwrap();
    h.manager.save_role(&owner(), editor).unwrap();

    let mut draft = h.manager.edit_role("100:restricted").unwrap();
    draft.assign(member_target()).unwrap();
    let missing = denied_keys(h.manager.save_role(&member(), draft));
    assert_eq!(missing, vec![perms::roles::assign]);

    // renaming leaves targets and keys alone
    let mut draft = h.manager.edit_role("100:restricted").unwrap();
    draft.rename("Muted").unwrap();
    assert!(h.manager.save_role(&member(), draft).is_ok());
    assert_eq!(h.manager.snapshot().role("100:restricted").unwrap().name, "Muted");
}

#[test]
fn test_edit_takes_effect_and_round_trips() {
    let h = harness();
    let mut draft = h.manager.edit_role("100:dj").unwrap();
    draft.deny(perms::queue::reorder).unwrap();
    h.manager.save_role(&guild_owner(), draft).unwrap();

    assert!(!h.manager.has(&dj(), perms::queue::reorder, true));
    assert!(h.manager.has(&dj(), perms::queue::remove, false));

    let reopened = h.manager.edit_role("100:dj").unwrap();
    assert_eq!(reopened.own_value(perms::queue::reorder), Some(false));
    assert_eq!(reopened.own_value(perms::roles::view), Some(false));
    assert_eq!(reopened.own_value(perms::queue::remove), None);
}

#[test]
fn test_base_edit_reaches_dependents() {
    let h = harness();
    let mut draft = h.manager.edit_role("guild_owner").unwrap();
    draft.grant("summon").unwrap();
    h.manager.save_role(&owner(), draft).unwrap();

    assert!(h.manager.has(&dj(), perms::summon::join, false));
    assert!(h.manager.has(&guild_owner(), perms::summon::steal, false));
}

#[test]
fn test_invalid_drafts_rejected_before_permission_check() {
    let h = harness();

    let draft = h
        .manager
        .create_role(Role::guild(GUILD, "empty", "Empty"))
        .unwrap();
    assert!(matches!(
        h.manager.save_role(&member(), draft),
        Err(PermissionError::InvalidRole(_))
    ));

    let mut draft = h
        .manager
        .create_role(Role::guild(GUILD, "other", "DJ"))
        .unwrap();
    draft.grant(perms::queue::remove).unwrap();
    assert_eq!(
        h.manager.save_role(&member(), draft),
        Err(PermissionError::DuplicateRoleName("DJ".into()))
    );

    let mut draft = h
        .manager
        .create_role(Role::guild(GUILD, "orphan", "Orphan"))
        .unwrap();
    draft.add_base("nope").unwrap();
    assert!(matches!(
        h.manager.save_role(&member(), draft),
        Err(PermissionError::MissingBase { .. })
    ));

    let mut draft = h
        .manager
        .create_role(Role::global("copycat", "Copycat"))
        .unwrap();
    draft.add_base("100:dj").unwrap();
    assert!(matches!(
        h.manager.save_role(&owner(), draft),
        Err(PermissionError::InvalidRole(_))
    ));
}

#[test]
fn test_delete_role() {
    let h = harness();

    assert_eq!(
        h.manager.delete_role(&owner(), "guild_owner"),
        Err(PermissionError::RoleInUse {
            role: "guild_owner".into(),
            dependents: vec!["100:dj".into()],
        })
    );
    assert_eq!(
        h.manager.delete_role(&owner(), "missing"),
        Err(PermissionError::RoleNotFound("missing".into()))
    );

    let missing = denied_keys(h.manager.delete_role(&member(), "100:restricted"));
    assert_eq!(missing, vec![perms::roles::edit]);

    h.manager
        .delete_role(&guild_owner(), "100:restricted")
        .unwrap();
    assert!(h.manager.has(&restricted(), perms::queue::remove, true));
    assert!(!h
        .backend
        .keys()
        .iter()
        .any(|key| key.contains("restricted") || key.ends_with(":100:50")));
    assert!(matches!(
        h.manager.edit_role("100:restricted"),
        Err(PermissionError::RoleNotFound(_))
    ));
}

#[test]
fn test_stale_draft_of_deleted_role() {
    let h = harness();
    let mut draft = h.manager.edit_role("100:restricted").unwrap();
    h.manager.delete_role(&owner(), "100:restricted").unwrap();

    draft.rename("Ghost").unwrap();
    assert_eq!(
        h.manager.save_role(&owner(), draft),
        Err(PermissionError::RoleNotFound("100:restricted".into()))
    );
}
