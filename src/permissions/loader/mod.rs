/*!
 * Role File Loader
 * Parses and validates a declarative role document
 *
 * Loading is all-or-nothing: the whole document is validated into memory
 * before anything is returned, and the first violation is reported with the
 * section, role and field it was found in.
 *
 * ```yaml
 * superglobal_roles:
 *   - id: banned
 *     name: Banned
 *     deny: { match: "*" }
 * guild_roles:
 *   - id: dj
 *     name: DJ
 *     targets: "#guild_admin"
 *     grant: [queue, player]
 * global_roles:
 *   - id: member
 *     name: Member
 *     targets: "#everyone"
 *     grant: queue.inspect
 * ```
 */

mod raw;

use self::raw::{declared_id, label_of, RawDocument, RawRole};
use super::role::{absolute_id, Role, RoleContext, RoleOrder, RoleTarget, Target};
use super::tree::PermissionTree;
use crate::core::errors::{FileLocation, PermissionError, PermissionFileError};
use crate::core::limits::{MAX_ROLE_ID_LEN, MAX_ROLE_NAME_LEN};
use crate::core::types::{GuildId, PermissionResult, RoleId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Output of a successful load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedRoles {
    pub roles: Vec<Role>,
    pub orders: Vec<RoleOrder>,
    /// Target -> roles in declaration order, not yet sorted
    pub targets: Vec<Target>,
}

impl LoadedRoles {
    /// Derive orders and targets from a flat role list
    pub fn from_roles(mut roles: Vec<Role>) -> Self {
        let orders = RoleOrder::from_roles(&roles);
        for order in &orders {
            for (position, role_id) in order.role_ids.iter().enumerate() {
                if let Some(role) = roles.iter_mut().find(|role| &role.id == role_id) {
                    role.position = position;
                }
            }
        }
        let targets = Target::invert(&roles);
        Self {
            roles,
            orders,
            targets,
        }
    }
}

/// Document sections in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Superglobal,
    Guild,
    Global,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Superglobal => "superglobal_roles",
            Section::Guild => "guild_roles",
            Section::Global => "global_roles",
        }
    }

    fn context(self, guild_id: Option<GuildId>) -> RoleContext {
        match (self, guild_id) {
            (Section::Superglobal, _) => RoleContext::Superglobal,
            (Section::Guild, Some(_)) => RoleContext::Guild,
            (Section::Guild, None) => RoleContext::GuildDefault,
            (Section::Global, _) => RoleContext::Global,
        }
    }
}

/// Loads role documents against a registered tree
#[derive(Debug, Clone)]
pub struct FileLoader {
    tree: Arc<PermissionTree>,
}

impl FileLoader {
    pub fn new(tree: Arc<PermissionTree>) -> Self {
        Self { tree }
    }

    /// Load a document from disk
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> PermissionResult<LoadedRoles> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            PermissionFileError::document(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Loading role document");
        self.load_from_str(&source)
    }

    /// Load a YAML (or JSON) document
    pub fn load_from_str(&self, source: &str) -> PermissionResult<LoadedRoles> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)
            .map_err(|e| PermissionFileError::document(format!("malformed document: {e}")))?;
        self.load_from_value(value)
    }

    /// Load an already parsed document
    pub fn load_from_value(&self, value: serde_yaml::Value) -> PermissionResult<LoadedRoles> {
        let document = if value.is_null() {
            RawDocument::default()
        } else {
            serde_yaml::from_value::<RawDocument>(value)
                .map_err(|e| PermissionFileError::document(format!("invalid document: {e}")))?
        };

        let mut state = LoadState::default();
        for (section, entries) in [
            (Section::Superglobal, document.superglobal_roles),
            (Section::Guild, document.guild_roles),
            (Section::Global, document.global_roles),
        ] {
            self.load_section(section, entries.unwrap_or_default(), &mut state)?;
        }

        let loaded = LoadedRoles::from_roles(state.roles);
        info!(
            roles = loaded.roles.len(),
            orders = loaded.orders.len(),
            targets = loaded.targets.len(),
            "Role document loaded"
        );
        Ok(loaded)
    }

    fn load_section(
        &self,
        section: Section,
        entries: Vec<serde_yaml::Value>,
        state: &mut LoadState,
    ) -> PermissionResult<()> {
        let section_ids: AHashSet<(Option<GuildId>, String)> = entries
            .iter()
            .filter_map(declared_id)
            .map(|(guild, id)| (guild, id.to_string()))
            .collect();
        let first = state.roles.len();

        for (index, value) in entries.into_iter().enumerate() {
            let location = FileLocation::section(section.name()).with_role(label_of(&value, index));
            let raw: RawRole = serde_yaml::from_value(value).map_err(|e| {
                file_error(location.clone(), PermissionError::InvalidRole(e.to_string()))
            })?;

            let role = self.load_role(section, raw, &location, &section_ids, &state.roles[first..])?;
            state.claim(&role, &location)?;
            state.roles.push(role);
        }

        Ok(())
    }

    fn load_role(
        &self,
        section: Section,
        raw: RawRole,
        location: &FileLocation,
        section_ids: &AHashSet<(Option<GuildId>, String)>,
        declared: &[Role],
    ) -> PermissionResult<Role> {
        let at = |field: &str, cause: PermissionError| {
            file_error(location.clone().with_field(field), cause)
        };

        let name = raw.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(at("name", PermissionError::InvalidRole("role needs a name".into())));
        }
        if name.len() > MAX_ROLE_NAME_LEN {
            return Err(at("name", PermissionError::InvalidRole("name is too long".into())));
        }

        let local_id = match raw.id {
            Some(id) => {
                if !is_valid_id(&id) {
                    return Err(at(
                        "id",
                        PermissionError::InvalidRole(format!(
                            "id {id:?} may only contain letters, digits, '_' and '-'"
                        )),
                    ));
                }
                id
            }
            None => Uuid::new_v4().simple().to_string(),
        };

        if raw.guild.is_some() && section != Section::Guild {
            return Err(at(
                "guild",
                PermissionError::InvalidRole("only guild roles can be bound to a guild".into()),
            ));
        }

        let mut role = Role::new(section.context(raw.guild), raw.guild, &local_id, name);

        for raw_target in raw.targets {
            let target = RoleTarget::parse(&raw_target.into_string()).map_err(|e| at("targets", e))?;
            role.check_target(target).map_err(|e| at("targets", e))?;
            if !role.targets.contains(&target) {
                role.targets.push(target);
            }
        }

        self.tree.check_specs(&raw.grant).map_err(|e| at("grant", e))?;
        self.tree.check_specs(&raw.deny).map_err(|e| at("deny", e))?;
        role.grant = raw.grant;
        role.deny = raw.deny;

        for base in raw.base {
            let base_id = resolve_base(&role, &local_id, &base, section_ids, declared)
                .map_err(|e| at("base", e))?;
            role.base_ids.push(base_id);
        }

        if role.is_empty() {
            return Err(file_error(
                location.clone(),
                PermissionError::InvalidRole(
                    "role grants and denies nothing and inherits from nothing".into(),
                ),
            ));
        }

        Ok(role)
    }
}

/// Ids and names claimed so far across the whole load
#[derive(Default)]
struct LoadState {
    roles: Vec<Role>,
    ids: AHashSet<RoleId>,
    names: AHashSet<(RoleContext, Option<GuildId>, String)>,
}

impl LoadState {
    fn claim(&mut self, role: &Role, location: &FileLocation) -> PermissionResult<()> {
        if !self.ids.insert(role.id.clone()) {
            return Err(file_error(
                location.clone().with_field("id"),
                PermissionError::DuplicateRoleId(role.id.clone()),
            ));
        }
        if !self
            .names
            .insert((role.context, role.guild_id, role.name.clone()))
        {
            return Err(file_error(
                location.clone().with_field("name"),
                PermissionError::DuplicateRoleName(role.name.clone()),
            ));
        }
        Ok(())
    }
}

fn file_error(location: FileLocation, cause: PermissionError) -> PermissionError {
    PermissionFileError::new(location, cause).into()
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ROLE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Resolve a local base id against roles declared earlier in the section
fn resolve_base(
    role: &Role,
    local_id: &str,
    base: &str,
    section_ids: &AHashSet<(Option<GuildId>, String)>,
    declared: &[Role],
) -> PermissionResult<RoleId> {
    let mut candidates = vec![absolute_id(role.guild_id, base)];
    if role.context == RoleContext::Guild {
        candidates.push(base.to_string());
    }

    for candidate in &candidates {
        if let Some(found) = declared.iter().find(|other| &other.id == candidate) {
            if role.accepts_base(found) {
                return Ok(found.id.clone());
            }
        }
    }

    if base == local_id {
        return Err(PermissionError::CyclicBase {
            role: role.id.clone(),
            base: base.to_string(),
            reason: "a role cannot inherit from itself".into(),
        });
    }

    // anything in scope declared earlier was matched above, so a hit here comes later
    let in_scope = |guild_id: Option<GuildId>| section_ids.contains(&(guild_id, base.to_string()));
    let declared_later =
        in_scope(role.guild_id) || (role.context == RoleContext::Guild && in_scope(None));
    if declared_later {
        return Err(PermissionError::CyclicBase {
            role: role.id.clone(),
            base: base.to_string(),
            reason: "bases must be declared before the roles inheriting from them".into(),
        });
    }

    Err(PermissionError::MissingBase {
        role: role.id.clone(),
        base: base.to_string(),
    })
}
