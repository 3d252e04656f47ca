/*!
 * Engine Configuration
 * Environment defaults with optional YAML overrides
 */

use crate::core::limits::{DEFAULT_CACHE_NAMESPACE, DEFAULT_ROLE_FILE};
use crate::core::types::UserId;
use crate::permissions::cache::validate_namespace;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Engine configuration sourced from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix of every cache key
    pub namespace: String,
    /// Role document loaded at startup and on reload
    pub role_file: PathBuf,
    /// Users that bypass every check
    pub owner_ids: Vec<UserId>,
    /// JSON snapshot of the role store; in-memory when unset
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineConfigOverride {
    namespace: Option<String>,
    role_file: Option<PathBuf>,
    owner_ids: Option<Vec<UserId>>,
    store_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            role_file: PathBuf::from(DEFAULT_ROLE_FILE),
            owner_ids: Vec::new(),
            store_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let namespace = std::env::var("ROLEGATE_NAMESPACE")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_NAMESPACE.to_string());
        let role_file = std::env::var("ROLEGATE_ROLE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ROLE_FILE));
        let owner_ids = match std::env::var("ROLEGATE_OWNER_IDS") {
            Ok(value) => parse_owner_ids(&value).with_context(|| "parse ROLEGATE_OWNER_IDS")?,
            Err(_) => Vec::new(),
        };
        let store_path = std::env::var("ROLEGATE_STORE_PATH")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            namespace,
            role_file,
            owner_ids,
            store_path,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("ROLEGATE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read ROLEGATE_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlay the fields present in a YAML document
    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: EngineConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse engine config yaml")?;
        if let Some(value) = override_cfg.namespace {
            self.namespace = value;
        }
        if let Some(value) = override_cfg.role_file {
            self.role_file = value;
        }
        if let Some(value) = override_cfg.owner_ids {
            self.owner_ids = value;
        }
        if let Some(value) = override_cfg.store_path {
            self.store_path = Some(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace).context("invalid ROLEGATE_NAMESPACE")
    }
}

/// Comma separated user ids, blanks ignored
pub fn parse_owner_ids(value: &str) -> Result<Vec<UserId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<UserId>()
                .with_context(|| format!("invalid owner id {part:?}"))
        })
        .collect()
}
