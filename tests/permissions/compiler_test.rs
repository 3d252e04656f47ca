/*!
 * Compiler Property Tests
 */

use crate::support::tree;
use proptest::prelude::*;
use proptest::sample::subsequence;
use rolegate::permissions::{PermissionCompiler, Role};

fn all_keys() -> Vec<String> {
    tree().keys().to_vec()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_deny_overrides_grant_within_role(
        grant in subsequence(all_keys(), 0..12),
        deny in subsequence(all_keys(), 0..12),
    ) {
        let compiler = PermissionCompiler::new(tree());
        let role = Role::global("r", "R")
            .with_grant(grant.iter().map(String::as_str))
            .with_deny(deny.iter().map(String::as_str));
        let compiled = compiler.compile(&role, &[] as &[Role]).unwrap();

        for key in all_keys() {
            let expected = if deny.contains(&key) {
                Some(false)
            } else if grant.contains(&key) {
                Some(true)
            } else {
                None
            };
            prop_assert_eq!(compiled.get(&key), expected, "key {}", key);
        }
    }

    #[test]
    fn test_own_entries_override_bases(
        base_grant in subsequence(all_keys(), 1..12),
        own_deny in subsequence(all_keys(), 0..12),
    ) {
        let compiler = PermissionCompiler::new(tree());
        let base = Role::global("base", "Base").with_grant(base_grant.iter().map(String::as_str));
        let child = Role::global("child", "Child")
            .with_bases(["base"])
            .with_deny(own_deny.iter().map(String::as_str));
        let roles = vec![base, child];

        let compiled = compiler.compile_all(&roles).unwrap();
        let child = &compiled[1];
        for key in &base_grant {
            let expected = !own_deny.contains(key);
            prop_assert_eq!(child.get(key), Some(expected));
        }
        for key in &own_deny {
            prop_assert_eq!(child.get(key), Some(false));
        }
    }
}

#[test]
fn test_diamond_inheritance_prefers_first_base() {
    let compiler = PermissionCompiler::new(tree());
    let roles = vec![
        Role::global("root", "Root").with_grant(["queue"]),
        Role::global("left", "Left").with_bases(["root"]).with_deny(["queue.remove"]),
        Role::global("right", "Right").with_bases(["root"]).with_grant(["queue.remove"]),
        Role::global("bottom", "Bottom").with_bases(["left", "right"]),
    ];

    let compiled = compiler.compile_all(&roles).unwrap();
    let bottom = &compiled[3];
    assert_eq!(bottom.get("queue.remove"), Some(false));
    assert_eq!(bottom.get("queue.reorder"), Some(true));

    let flipped = Role::global("bottom", "Bottom").with_bases(["right", "left"]);
    let compiled = compiler.compile(&flipped, roles.as_slice()).unwrap();
    assert_eq!(compiled.get("queue.remove"), Some(true));
}
