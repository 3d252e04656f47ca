/*!
 * Shared fixtures for permission tests
 */

#![allow(dead_code)]

use rolegate::permissions::{
    Actor, HeldRole, Membership, MemoryBackend, MemoryRoleStore, PermissionCache,
    PermissionManager, PermissionTree, TargetResolver,
};
use std::sync::Arc;

pub const OWNER: u64 = 1;
pub const GUILD_OWNER: u64 = 2;
pub const MEMBER: u64 = 3;
pub const DJ: u64 = 4;
pub const RESTRICTED: u64 = 50;
pub const BANNED: u64 = 666;

pub const GUILD: u64 = 100;
pub const DJ_ROLE: u64 = 10;

pub const DOCUMENT: &str = r##"
superglobal_roles:
  - id: banned
    name: Banned
    targets: 666
    deny:
      match: "*"

guild_roles:
  - id: guild_owner
    name: Guild Owner
    targets: "#guild_owner"
    grant: [queue, player, roles]

  - id: restricted
    guild: 100
    name: Restricted
    targets: "100:50"
    deny: queue.remove

  - id: dj
    guild: 100
    name: DJ
    targets: "@100:10"
    base: guild_owner
    deny: roles

global_roles:
  - id: member
    name: Member
    targets: "#everyone"
    grant: [queue.add, queue.inspect]
    deny: queue.add.stream
"##;

pub struct Harness {
    pub manager: PermissionManager,
    pub backend: Arc<MemoryBackend>,
    pub tree: Arc<PermissionTree>,
}

pub fn tree() -> Arc<PermissionTree> {
    Arc::new(PermissionTree::with_defaults().unwrap())
}

pub fn empty_harness() -> Harness {
    let tree = tree();
    let backend = Arc::new(MemoryBackend::new());
    let cache = Arc::new(PermissionCache::new(backend.clone(), "permissions").unwrap());
    let manager = PermissionManager::new(
        Arc::clone(&tree),
        Arc::new(MemoryRoleStore::new()),
        cache,
        TargetResolver::new([OWNER]),
    );
    Harness {
        manager,
        backend,
        tree,
    }
}

pub fn harness() -> Harness {
    let harness = empty_harness();
    harness.manager.load_document(DOCUMENT).unwrap();
    harness
}

pub fn owner() -> Actor {
    Actor::member(OWNER, Membership::new(GUILD))
}

pub fn guild_owner() -> Actor {
    Actor::member(GUILD_OWNER, Membership::new(GUILD).owner())
}

pub fn member() -> Actor {
    Actor::member(MEMBER, Membership::new(GUILD))
}

pub fn dj() -> Actor {
    Actor::member(
        DJ,
        Membership::new(GUILD).with_role(HeldRole::new(DJ_ROLE, 1)),
    )
}

pub fn restricted() -> Actor {
    Actor::member(RESTRICTED, Membership::new(GUILD))
}

pub fn banned() -> Actor {
    Actor::member(BANNED, Membership::new(GUILD).owner())
}
