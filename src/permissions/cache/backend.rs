/*!
 * Cache Backend
 * Key/value store seam with hashes, lists, pipelines and scripts
 */

use crate::core::types::PermissionResult;
use serde::{Deserialize, Serialize};

/// One write inside a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Set fields of a hash
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Append to the tail of a list
    ListPush { key: String, values: Vec<String> },
    /// Remove a key of any type
    Delete { key: String },
    /// Remove every key matching a glob
    DeleteMatching { pattern: String },
}

/// Writes applied atomically, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hset(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.commands.push(Command::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn rpush(&mut self, key: impl Into<String>, values: Vec<String>) -> &mut Self {
        self.commands.push(Command::ListPush {
            key: key.into(),
            values,
        });
        self
    }

    pub fn del(&mut self, key: impl Into<String>) -> &mut Self {
        self.commands.push(Command::Delete { key: key.into() });
        self
    }

    pub fn del_matching(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DeleteMatching {
            pattern: pattern.into(),
        });
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Server-side lookups, each answered in one round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// First explicit value of `key` across targets, then roles
    HasPermission {
        prefix: String,
        targets: Vec<String>,
        key: String,
    },
    /// Keys still lacking an explicit grant; stops at the first explicit deny
    HasAllPermissions {
        prefix: String,
        targets: Vec<String>,
        keys: Vec<String>,
    },
    /// Whether any target holds the role
    AnyTargetHasRole {
        prefix: String,
        targets: Vec<String>,
        role_id: String,
    },
}

/// Reply of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptReply {
    Nil,
    Value(String),
    List(Vec<String>),
}

/// Key/value store the permission cache projects into
pub trait CacheBackend: Send + Sync {
    /// Apply every command of the pipeline atomically
    fn exec(&self, pipeline: &Pipeline) -> PermissionResult<()>;

    /// Run a lookup script
    fn eval(&self, script: &Script) -> PermissionResult<ScriptReply>;
}
