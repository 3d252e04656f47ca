/*!
 * Raw Role Document
 * Serde shapes of the YAML document before validation
 */

use crate::core::types::GuildId;
use crate::permissions::tree::PermSpec;
use serde::Deserialize;
use serde_with::{serde_as, OneOrMany};

/// Top level of the document; every section is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawDocument {
    #[serde(default, alias = "superglobal")]
    pub superglobal_roles: Option<Vec<serde_yaml::Value>>,
    #[serde(default, alias = "guild")]
    pub guild_roles: Option<Vec<serde_yaml::Value>>,
    #[serde(default, alias = "global")]
    pub global_roles: Option<Vec<serde_yaml::Value>>,
}

/// One role entry, synonyms folded onto a single field
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawRole {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "server")]
    pub guild: Option<GuildId>,
    #[serde_as(deserialize_as = "OneOrMany<_>")]
    #[serde(default, alias = "target")]
    pub targets: Vec<RawTarget>,
    #[serde_as(deserialize_as = "OneOrMany<_>")]
    #[serde(default, alias = "bases", alias = "inherit")]
    pub base: Vec<String>,
    #[serde_as(deserialize_as = "OneOrMany<_>")]
    #[serde(default, alias = "grants", alias = "allow", alias = "allows")]
    pub grant: Vec<PermSpec>,
    #[serde_as(deserialize_as = "OneOrMany<_>")]
    #[serde(default, alias = "denies", alias = "forbid", alias = "forbids")]
    pub deny: Vec<PermSpec>,
}

/// Targets may be written as bare numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawTarget {
    Id(u64),
    Text(String),
}

impl RawTarget {
    pub fn into_string(self) -> String {
        match self {
            RawTarget::Id(id) => id.to_string(),
            RawTarget::Text(text) => text,
        }
    }
}

/// Best-effort label of a role entry for error locations
pub(super) fn label_of(value: &serde_yaml::Value, index: usize) -> String {
    value
        .get("name")
        .and_then(serde_yaml::Value::as_str)
        .or_else(|| value.get("id").and_then(serde_yaml::Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index + 1))
}

/// Guild binding and local id a role entry declares
pub(super) fn declared_id(value: &serde_yaml::Value) -> Option<(Option<GuildId>, &str)> {
    let id = value.get("id").and_then(serde_yaml::Value::as_str)?;
    let guild = ["guild", "server"]
        .iter()
        .find_map(|field| value.get(*field).and_then(serde_yaml::Value::as_u64));
    Some((guild, id))
}
