/*!
 * Role Document Loader Tests
 */

use crate::support::{tree, DOCUMENT};
use pretty_assertions::assert_eq;
use rolegate::permissions::{FileLoader, RoleContext, RoleTarget};
use rolegate::{FileLocation, PermissionError};

fn load_err(source: &str) -> (FileLocation, PermissionError) {
    match FileLoader::new(tree()).load_from_str(source) {
        Err(PermissionError::File(file)) => (file.location.clone(), file.cause().clone()),
        other => panic!("expected a file error, got {other:?}"),
    }
}

#[test]
fn test_fixture_document_loads() {
    let loaded = FileLoader::new(tree()).load_from_str(DOCUMENT).unwrap();

    let ids: Vec<&str> = loaded.roles.iter().map(|role| role.id.as_str()).collect();
    assert_eq!(ids, vec!["banned", "guild_owner", "100:restricted", "100:dj", "member"]);

    let dj = &loaded.roles[3];
    assert_eq!(dj.context, RoleContext::Guild);
    assert_eq!(dj.base_ids, vec!["guild_owner"]);
    assert_eq!(
        dj.targets,
        vec![RoleTarget::GuildRole {
            guild_id: 100,
            role_id: 10
        }]
    );
    assert_eq!(dj.position, 1);

    let order_ids: Vec<&str> = loaded
        .orders
        .iter()
        .map(|order| order.order_id.as_str())
        .collect();
    assert_eq!(order_ids.len(), 4);
    assert!(order_ids.contains(&"100"));
}

#[test]
fn test_forward_reference_is_cyclic() {
    let (location, cause) = load_err(
        r#"
global_roles:
  - id: child
    name: Child
    base: parent
  - id: parent
    name: Parent
    grant: queue
"#,
    );
    assert_eq!(location.section.as_deref(), Some("global_roles"));
    assert_eq!(location.role.as_deref(), Some("Child"));
    assert_eq!(location.field.as_deref(), Some("base"));
    assert!(matches!(cause, PermissionError::CyclicBase { .. }));
}

#[test]
fn test_base_from_other_section_is_missing() {
    let (_, cause) = load_err(
        r#"
superglobal_roles:
  - id: root
    name: Root
    grant: queue
global_roles:
  - id: child
    name: Child
    base: root
"#,
    );
    assert!(matches!(cause, PermissionError::MissingBase { .. }));
}

#[test]
fn test_guild_roles_need_guild_targets() {
    let (location, cause) = load_err(
        r##"
guild_roles:
  - id: dj
    name: DJ
    targets: "#everyone"
    grant: queue
"##,
    );
    assert_eq!(location.field.as_deref(), Some("targets"));
    assert!(matches!(cause, PermissionError::InvalidTarget { .. }));

    let (_, cause) = load_err(
        r##"
global_roles:
  - id: admins
    name: Admins
    targets: "#guild_admin"
    grant: queue
"##,
    );
    assert!(matches!(cause, PermissionError::InvalidTarget { .. }));
}

#[test]
fn test_bound_targets_need_matching_guild() {
    let (_, cause) = load_err(
        r#"
guild_roles:
  - id: dj
    name: DJ
    targets: "@5:10"
    grant: queue
"#,
    );
    assert!(matches!(cause, PermissionError::InvalidTarget { .. }));

    let (_, cause) = load_err(
        r#"
guild_roles:
  - id: dj
    guild: 6
    name: DJ
    targets: "5:10"
    grant: queue
"#,
    );
    assert!(matches!(cause, PermissionError::InvalidTarget { .. }));
}

#[test]
fn test_unknown_permission_and_empty_selector() {
    let (location, cause) = load_err("global_roles:\n  - id: a\n    name: A\n    grant: queue.nope\n");
    assert_eq!(location.field.as_deref(), Some("grant"));
    assert_eq!(cause, PermissionError::UnknownPermission("queue.nope".into()));

    let (location, cause) =
        load_err("global_roles:\n  - id: a\n    name: A\n    deny:\n      match: \"nothing.*\"\n");
    assert_eq!(location.field.as_deref(), Some("deny"));
    assert!(matches!(cause, PermissionError::InvalidSelector { .. }));
}

#[test]
fn test_duplicates_rejected() {
    let (_, cause) = load_err(
        "global_roles:\n  - id: a\n    name: A\n    grant: queue\n  - id: a\n    name: B\n    grant: queue\n",
    );
    assert_eq!(cause, PermissionError::DuplicateRoleId("a".into()));

    let (_, cause) = load_err(
        "global_roles:\n  - id: a\n    name: A\n    grant: queue\n  - id: b\n    name: A\n    grant: queue\n",
    );
    assert_eq!(cause, PermissionError::DuplicateRoleName("A".into()));
}

#[test]
fn test_same_name_in_different_scopes() {
    let loaded = FileLoader::new(tree())
        .load_from_str(
            r#"
guild_roles:
  - id: dj
    name: DJ
    grant: queue
  - id: dj
    guild: 3
    name: DJ
    base: dj
global_roles:
  - id: dj_global
    name: DJ
    grant: player
"#,
        )
        .unwrap();
    assert_eq!(loaded.roles.len(), 3);
    assert_eq!(loaded.roles[1].id, "3:dj");
    assert_eq!(loaded.roles[1].base_ids, vec!["dj"]);
}

#[test]
fn test_empty_role_rejected() {
    let (location, cause) = load_err("global_roles:\n  - id: a\n    name: A\n");
    assert_eq!(location.field, None);
    assert!(matches!(cause, PermissionError::InvalidRole(_)));
}

#[test]
fn test_unknown_section_rejected() {
    let (location, cause) = load_err("guilds_roles: []\n");
    assert_eq!(location, FileLocation::default());
    assert!(matches!(cause, PermissionError::InvalidRole(_)));
}
