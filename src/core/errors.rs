/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while registering the permission namespace
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum TreeError {
    #[error("Permission tree is already registered")]
    #[diagnostic(
        code(tree::already_registered),
        help("The namespace is registered once at startup. Construct a new tree instead.")
    )]
    AlreadyRegistered,

    #[error("Invalid namespace segment {0:?}")]
    #[diagnostic(
        code(tree::invalid_name),
        help("Segments may only contain lowercase letters, digits and underscores.")
    )]
    InvalidName(String),

    #[error("Duplicate namespace entry {0}")]
    #[diagnostic(code(tree::duplicate_name))]
    DuplicateName(String),

    #[error("Namespace {0} has no children")]
    #[diagnostic(
        code(tree::empty_namespace),
        help("Declare at least one permission below every namespace.")
    )]
    EmptyNamespace(String),
}

/// Permission engine errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PermissionError {
    #[error("Invalid permission selector {selector}: {reason}")]
    #[diagnostic(
        code(permission::invalid_selector),
        help("Selectors look like {{match: \"queue.*\"}} and must match at least one permission.")
    )]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid role target {target:?}: {reason}")]
    #[diagnostic(
        code(permission::invalid_target),
        help("Valid targets: #owner, #everyone, #<guild>:guild_owner, #<guild>:guild_admin, <user>, <guild>:<member>, @<guild>:<role>.")
    )]
    InvalidTarget { target: String, reason: String },

    #[error("Unknown permission {0}")]
    #[diagnostic(code(permission::unknown_permission))]
    UnknownPermission(String),

    #[error("Role {role} references missing base {base}")]
    #[diagnostic(code(permission::missing_base))]
    MissingBase { role: String, base: String },

    #[error("Role {role} cannot use {base} as a base: {reason}")]
    #[diagnostic(
        code(permission::cyclic_base),
        help("Bases must be declared before the roles inheriting from them.")
    )]
    CyclicBase {
        role: String,
        base: String,
        reason: String,
    },

    #[error("Duplicate role id {0}")]
    #[diagnostic(code(permission::duplicate_role_id))]
    DuplicateRoleId(String),

    #[error("Duplicate role name {0:?}")]
    #[diagnostic(code(permission::duplicate_role_name))]
    DuplicateRoleName(String),

    #[error("Invalid role: {0}")]
    #[diagnostic(code(permission::invalid_role))]
    InvalidRole(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    File(#[from] PermissionFileError),

    #[error("Permission denied, missing: {}", .missing.join(", "))]
    #[diagnostic(
        code(permission::denied),
        help("Ask a guild administrator for the missing permissions.")
    )]
    Denied { missing: Vec<String> },

    #[error("Permission cache unavailable: {0}")]
    #[diagnostic(
        code(permission::cache_unavailable),
        help("Checks fail closed until the cache store is reachable again.")
    )]
    CacheUnavailable(String),

    #[error("Role {0} not found")]
    #[diagnostic(code(permission::role_not_found))]
    RoleNotFound(String),

    #[error("Role {role} is still a base of {}", .dependents.join(", "))]
    #[diagnostic(
        code(permission::role_in_use),
        help("Remove the role from every inheriting role first.")
    )]
    RoleInUse {
        role: String,
        dependents: Vec<String>,
    },

    #[error("Invalid cache namespace {0:?}")]
    #[diagnostic(
        code(permission::invalid_namespace),
        help("Namespaces may only contain letters, digits, '_', '-' and '.'; ':' and glob syntax would overlap other namespaces.")
    )]
    InvalidNamespace(String),

    #[error("Role store error: {0}")]
    #[diagnostic(code(permission::store))]
    Store(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),
}

impl PermissionError {
    /// Whether the error is a normal rejection rather than an internal failure
    pub fn is_denied(&self) -> bool {
        matches!(self, PermissionError::Denied { .. })
    }

    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        PermissionError::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        PermissionError::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// Loader-time violation, located in the role document
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("Permission file error in {location}: {cause}")]
#[diagnostic(
    code(permission::file),
    help("Fix the role document; the previously active roles stay in effect.")
)]
pub struct PermissionFileError {
    pub location: FileLocation,
    pub cause: Box<PermissionError>,
}

impl PermissionFileError {
    pub fn new(location: FileLocation, cause: PermissionError) -> Self {
        Self {
            location,
            cause: Box::new(cause),
        }
    }

    /// Error for the document as a whole
    pub fn document(reason: impl Into<String>) -> Self {
        Self::new(
            FileLocation::default(),
            PermissionError::InvalidRole(reason.into()),
        )
    }

    pub fn cause(&self) -> &PermissionError {
        &self.cause
    }
}

/// Where in the role document a violation was found
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileLocation {
    pub section: Option<String>,
    pub role: Option<String>,
    pub field: Option<String>,
}

impl FileLocation {
    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: Some(section.into()),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if let Some(section) = &self.section {
            parts.push(section.clone());
        }
        if let Some(role) = &self.role {
            parts.push(format!("role {role:?}"));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field {field}"));
        }

        if parts.is_empty() {
            write!(f, "document")
        } else {
            write!(f, "{}", parts.join(" / "))
        }
    }
}
