/*!
 * In-Memory Cache Backend
 * Hashes and lists behind one lock, scripts evaluated in place
 */

use super::backend::{CacheBackend, Command, Pipeline, Script, ScriptReply};
use crate::core::errors::PermissionError;
use crate::core::limits::{DENY_VALUE, GRANT_VALUE};
use crate::core::types::PermissionResult;
use crate::permissions::tree::wildcard_match;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Keyspace {
    hashes: AHashMap<String, AHashMap<String, String>>,
    lists: AHashMap<String, Vec<String>>,
}

impl Keyspace {
    fn apply(&mut self, command: &Command) {
        match command {
            Command::HashSet { key, fields } => {
                self.lists.remove(key);
                let hash = self.hashes.entry(key.clone()).or_default();
                hash.extend(fields.iter().cloned());
            }
            Command::ListPush { key, values } => {
                self.hashes.remove(key);
                self.lists
                    .entry(key.clone())
                    .or_default()
                    .extend(values.iter().cloned());
            }
            Command::Delete { key } => {
                self.hashes.remove(key);
                self.lists.remove(key);
            }
            Command::DeleteMatching { pattern } => {
                self.hashes.retain(|key, _| !wildcard_match(pattern, key));
                self.lists.retain(|key, _| !wildcard_match(pattern, key));
            }
        }
    }

    fn roles_of(&self, prefix: &str, target: &str) -> &[String] {
        self.lists
            .get(&format!("{prefix}:targets:{target}"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn value_of(&self, prefix: &str, role: &str, key: &str) -> Option<&str> {
        self.hashes
            .get(&format!("{prefix}:roles:{role}:permissions"))
            .and_then(|hash| hash.get(key))
            .map(String::as_str)
    }

    fn has_permission(&self, prefix: &str, targets: &[String], key: &str) -> ScriptReply {
        for target in targets {
            for role in self.roles_of(prefix, target) {
                if let Some(value) = self.value_of(prefix, role, key) {
                    return ScriptReply::Value(value.to_string());
                }
            }
        }
        ScriptReply::Nil
    }

    fn has_all_permissions(&self, prefix: &str, targets: &[String], keys: &[String]) -> ScriptReply {
        let mut remaining: Vec<&String> = keys.iter().collect();

        for target in targets {
            for role in self.roles_of(prefix, target) {
                let mut denied = false;
                remaining.retain(|key| match self.value_of(prefix, role, key) {
                    Some(GRANT_VALUE) => false,
                    Some(DENY_VALUE) => {
                        denied = true;
                        true
                    }
                    _ => true,
                });

                if denied || remaining.is_empty() {
                    return ScriptReply::List(remaining.into_iter().cloned().collect());
                }
            }
        }

        ScriptReply::List(remaining.into_iter().cloned().collect())
    }

    fn any_target_has_role(&self, prefix: &str, targets: &[String], role_id: &str) -> ScriptReply {
        let found = targets
            .iter()
            .any(|target| self.roles_of(prefix, target).iter().any(|role| role == role_id));
        ScriptReply::Value(if found { GRANT_VALUE } else { DENY_VALUE }.to_string())
    }
}

/// Process-local backend, mainly for tests and single-node setups
#[derive(Debug)]
pub struct MemoryBackend {
    keyspace: RwLock<Keyspace>,
    available: AtomicBool,
    round_trips: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            keyspace: RwLock::new(Keyspace::default()),
            available: AtomicBool::new(true),
            round_trips: AtomicU64::new(0),
        }
    }

    /// Simulate the store going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of exec/eval calls served
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Contents of a hash
    pub fn hgetall(&self, key: &str) -> Option<AHashMap<String, String>> {
        self.keyspace.read().hashes.get(key).cloned()
    }

    /// Contents of a list
    pub fn lrange(&self, key: &str) -> Option<Vec<String>> {
        self.keyspace.read().lists.get(key).cloned()
    }

    /// Every key currently stored
    pub fn keys(&self) -> Vec<String> {
        let keyspace = self.keyspace.read();
        let mut keys: Vec<String> = keyspace
            .hashes
            .keys()
            .chain(keyspace.lists.keys())
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn check_available(&self) -> PermissionResult<()> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        if self.is_available() {
            Ok(())
        } else {
            Err(PermissionError::CacheUnavailable(
                "memory backend switched off".into(),
            ))
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryBackend {
    fn exec(&self, pipeline: &Pipeline) -> PermissionResult<()> {
        self.check_available()?;
        let mut keyspace = self.keyspace.write();
        for command in pipeline.commands() {
            keyspace.apply(command);
        }
        Ok(())
    }

    fn eval(&self, script: &Script) -> PermissionResult<ScriptReply> {
        self.check_available()?;
        let keyspace = self.keyspace.read();
        Ok(match script {
            Script::HasPermission {
                prefix,
                targets,
                key,
            } => keyspace.has_permission(prefix, targets, key),
            Script::HasAllPermissions {
                prefix,
                targets,
                keys,
            } => keyspace.has_all_permissions(prefix, targets, keys),
            Script::AnyTargetHasRole {
                prefix,
                targets,
                role_id,
            } => keyspace.any_target_has_role(prefix, targets, role_id),
        })
    }
}
