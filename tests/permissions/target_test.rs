/*!
 * Role Target Tests
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rolegate::permissions::{Actor, HeldRole, Membership, RoleTarget, TargetResolver, TargetScope};

fn arb_target() -> impl Strategy<Value = RoleTarget> {
    prop_oneof![
        Just(RoleTarget::Owner),
        Just(RoleTarget::Everyone),
        proptest::option::of(any::<u64>()).prop_map(RoleTarget::GuildOwner),
        proptest::option::of(any::<u64>()).prop_map(RoleTarget::GuildAdmin),
        any::<u64>().prop_map(RoleTarget::User),
        (any::<u64>(), any::<u64>())
            .prop_map(|(guild_id, user_id)| RoleTarget::Member { guild_id, user_id }),
        (any::<u64>(), any::<u64>())
            .prop_map(|(guild_id, role_id)| RoleTarget::GuildRole { guild_id, role_id }),
    ]
}

proptest! {
    #[test]
    fn test_target_string_form_is_canonical(target in arb_target()) {
        let text = target.to_string();
        prop_assert_eq!(RoleTarget::parse(&text).unwrap(), target);

        let json = serde_json::to_string(&target).unwrap();
        prop_assert_eq!(json, format!("\"{text}\""));
    }
}

#[test]
fn test_everyone_is_always_last() {
    let resolver = TargetResolver::default();
    let plain = resolver.targets_for(&Actor::user(5), TargetScope::All);
    assert_eq!(plain, vec![RoleTarget::User(5), RoleTarget::Everyone]);

    let actor = Actor::member(5, Membership::new(8).with_role(HeldRole::new(3, 2)));
    let guild_only = resolver.targets_for(&actor, TargetScope::GuildOnly);
    assert_eq!(
        guild_only,
        vec![
            RoleTarget::Member {
                guild_id: 8,
                user_id: 5
            },
            RoleTarget::GuildRole {
                guild_id: 8,
                role_id: 3
            },
            RoleTarget::Everyone,
        ]
    );

    let global_only = resolver.targets_for(&actor, TargetScope::GlobalOnly);
    assert_eq!(global_only, vec![RoleTarget::User(5), RoleTarget::Everyone]);
}
