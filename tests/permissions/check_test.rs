/*!
 * Permission Check Scenarios
 */

use crate::support::*;
use pretty_assertions::assert_eq;
use rolegate::permissions::{Actor, Decision, Membership, PermissionGate, TargetScope};
use rolegate::{perms, PermissionError};

#[test]
fn test_guild_owner_beats_everyone_default() {
    let h = harness();
    assert!(h.manager.has(&guild_owner(), perms::queue::remove, false));
    assert!(h.manager.has(&guild_owner(), perms::player::skip, false));
    assert!(h.manager.has(&guild_owner(), perms::queue::add::stream, false));
    assert!(!h.manager.has(&member(), perms::queue::add::stream, true));

    // unmentioned for plain members, so the caller's default decides
    assert!(!h.manager.has(&member(), perms::queue::remove, false));
    assert!(h.manager.has(&member(), perms::queue::remove, true));
    assert!(!h.manager.has(&guild_owner(), perms::admin::control::shutdown, false));
}

#[test]
fn test_explicit_deny_ignores_default() {
    let h = harness();
    assert!(h.manager.has(&member(), perms::queue::add::entry, false));
    assert!(!h.manager.has(&member(), perms::queue::add::stream, true));
    assert!(!h.manager.has(&restricted(), perms::queue::remove, true));
}

#[test]
fn test_superglobal_role_wins_over_guild_owner() {
    let h = harness();
    assert!(!h.manager.has(&banned(), perms::queue::remove, true));
    assert!(!h.manager.has(&banned(), perms::queue::add::entry, true));
}

#[test]
fn test_inherited_role_with_own_deny() {
    let h = harness();
    assert!(h.manager.has(&dj(), perms::queue::remove, false));
    assert!(h.manager.has(&dj(), perms::player::volume, false));
    assert!(!h.manager.has(&dj(), perms::roles::view, true));
}

#[test]
fn test_namespace_check_requires_every_key() {
    let h = harness();
    assert!(h.manager.has(&guild_owner(), "queue", false));
    assert!(!h.manager.has(&member(), "queue.add", true));
    assert!(h.manager.has(&member(), "queue.inspect", false));
}

#[test]
fn test_unknown_key_uses_default() {
    let h = harness();
    assert!(h.manager.has(&member(), "queue.nope", true));
    assert!(!h.manager.has(&member(), "queue.nope", false));
    assert_eq!(
        h.manager.ensure_all(&member(), &["queue.nope"]),
        Err(PermissionError::UnknownPermission("queue.nope".into()))
    );
}

#[test]
fn test_owner_bypass_precedes_key_lookup() {
    let h = harness();
    assert!(h.manager.has(&owner(), "queue.nope", false));
    let events = h.manager.audit().for_user(OWNER, 1);
    assert_eq!(events[0].decision, Decision::OwnerBypass);
    assert_eq!(events[0].keys, vec!["queue.nope".to_string()]);
}

#[test]
fn test_namespace_path_ignores_default() {
    let h = harness();
    assert!(!h.manager.has(&member(), "admin", true));
    assert!(h.manager.has(&guild_owner(), "queue", false));
}

#[test]
fn test_ensure_all_names_missing_keys() {
    let h = harness();
    assert_eq!(
        h.manager
            .ensure_all(&member(), &[perms::queue::add::entry, perms::queue::remove]),
        Err(PermissionError::Denied {
            missing: vec![perms::queue::remove.to_string()]
        })
    );
    assert_eq!(
        h.manager.ensure_all(&member(), &["queue.add"]),
        Err(PermissionError::Denied {
            missing: vec![perms::queue::add::stream.to_string()]
        })
    );
    assert!(h.manager.has_all(&guild_owner(), &["queue", "player"]));
    assert!(h.manager.has_all::<&str>(&member(), &[]));
}

#[test]
fn test_owner_bypasses_everything() {
    let h = harness();
    assert!(h.manager.has(&owner(), perms::admin::control::shutdown, false));
    assert!(h.manager.has_all(&owner(), &["admin", "queue"]));

    let events = h.manager.audit().for_user(OWNER, 10);
    assert!(events
        .iter()
        .all(|event| event.decision == Decision::OwnerBypass));
}

#[test]
fn test_cache_down_fails_closed_except_for_owners() {
    let h = harness();
    h.backend.set_available(false);

    assert!(!h.manager.has(&member(), perms::queue::add::entry, true));
    assert!(!h.manager.has(&guild_owner(), perms::queue::remove, true));
    assert!(!h.manager.has_role(&guild_owner(), "guild_owner"));
    assert!(matches!(
        h.manager.ensure_all(&member(), &[perms::queue::add::entry]),
        Err(PermissionError::CacheUnavailable(_))
    ));

    assert!(h.manager.has(&owner(), perms::queue::remove, false));
    assert!(h.manager.ensure_all(&owner(), &["admin"]).is_ok());

    let stats = h.manager.audit_stats();
    assert!(stats.cache_failures >= 3);
    assert!(h.manager.cache_stats().failures >= 3);

    h.backend.set_available(true);
    assert!(h.manager.has(&member(), perms::queue::add::entry, false));
}

#[test]
fn test_has_role_and_roles_for() {
    let h = harness();
    assert!(h.manager.has_role(&guild_owner(), "guild_owner"));
    assert!(!h.manager.has_role(&member(), "guild_owner"));
    assert!(h.manager.has_role(&member(), "member"));

    let roles: Vec<String> = h
        .manager
        .get_roles_for(&dj())
        .into_iter()
        .map(|role| role.id)
        .collect();
    assert_eq!(roles, vec!["100:dj", "member"]);

    let roles: Vec<String> = h
        .manager
        .get_roles_for(&banned())
        .into_iter()
        .map(|role| role.id)
        .collect();
    assert_eq!(roles, vec!["banned", "guild_owner", "member"]);
}

#[test]
fn test_gate_collects_missing_keys() {
    let h = harness();
    let gate = PermissionGate::new()
        .require(perms::queue::remove)
        .require_global(perms::queue::add::entry);

    assert!(h.manager.check_gate(&guild_owner(), &gate).is_ok());
    assert_eq!(
        h.manager.check_gate(&member(), &gate),
        Err(PermissionError::Denied {
            missing: vec![perms::queue::remove.to_string()]
        })
    );

    // guild grants do not count for globally gated keys
    let global = PermissionGate::new().require_global(perms::queue::remove);
    assert_eq!(
        h.manager.check_gate(&guild_owner(), &global),
        Err(PermissionError::Denied {
            missing: vec![perms::queue::remove.to_string()]
        })
    );
    assert!(h.manager.check_gate(&member(), &PermissionGate::new()).is_ok());
}

#[test]
fn test_scoped_check_ignores_guild() {
    let h = harness();
    assert!(!h.manager.has_scoped(
        &guild_owner(),
        perms::queue::remove,
        false,
        TargetScope::GlobalOnly
    ));
    assert!(h.manager.has_scoped(
        &guild_owner(),
        perms::queue::remove,
        false,
        TargetScope::GuildOnly
    ));
}

#[test]
fn test_denials_are_audited() {
    let h = harness();
    h.manager.has(&member(), perms::queue::add::stream, true);
    let _ = h.manager.ensure_all(&member(), &[perms::queue::remove]);

    assert_eq!(h.manager.audit().denial_count(MEMBER), 2);
    let recent = h.manager.audit().for_user(MEMBER, 10);
    assert_eq!(recent.len(), 2);
    assert!(recent
        .iter()
        .any(|event| event.keys == vec![perms::queue::remove.to_string()]));
}

#[test]
fn test_granted_checks_leave_no_per_user_state() {
    let h = harness();
    for user_id in 1_000..6_000 {
        let actor = Actor::member(user_id, Membership::new(GUILD));
        assert!(h.manager.has(&actor, perms::queue::add::entry, false));
    }

    let stats = h.manager.audit_stats();
    assert_eq!(stats.users_tracked, 0);
    assert_eq!(stats.total_events, 0);
    assert_eq!(stats.total_granted, 5_000);
}

#[test]
fn test_cache_layout_after_load() {
    let h = harness();
    let keys = h.backend.keys();
    assert!(keys.contains(&"permissions:roles:100:dj:permissions".to_string()));
    assert!(keys.contains(&"permissions:targets:#everyone".to_string()));
    assert!(keys.contains(&"permissions:targets:@100:10".to_string()));

    let dj = h
        .backend
        .hgetall("permissions:roles:100:dj:permissions")
        .unwrap();
    assert_eq!(dj.get("roles.view").map(String::as_str), Some("0"));
    assert_eq!(dj.get("queue.remove").map(String::as_str), Some("1"));
}

#[test]
fn test_check_is_one_round_trip() {
    let h = harness();
    let before = h.backend.round_trips();
    assert!(h.manager.has_all(&dj(), &["queue", "player"]));
    assert!(!h.manager.has(&member(), perms::queue::remove, false));
    assert_eq!(h.backend.round_trips(), before + 2);
}
