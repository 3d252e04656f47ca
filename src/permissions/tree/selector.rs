/*!
 * Permission Specifiers
 * Literal keys and wildcard selectors used in grant/deny lists
 */

use crate::core::errors::PermissionError;
use crate::core::types::PermissionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grant/deny entry: a literal key or namespace, or a wildcard selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermSpec {
    Key(String),
    Selector(Selector),
}

impl PermSpec {
    pub fn key(key: impl Into<String>) -> Self {
        PermSpec::Key(key.into())
    }

    pub fn matching(pattern: impl Into<String>) -> Self {
        PermSpec::Selector(Selector::new(pattern))
    }
}

impl From<&str> for PermSpec {
    fn from(key: &str) -> Self {
        PermSpec::Key(key.to_string())
    }
}

impl fmt::Display for PermSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermSpec::Key(key) => write!(f, "{key}"),
            PermSpec::Selector(selector) => write!(f, "{{match: {}}}", selector.pattern),
        }
    }
}

/// Wildcard selector, `{match: "queue.*"}` in role documents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    #[serde(rename = "match")]
    pattern: String,
}

impl Selector {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Reject syntax the matcher does not support
    pub fn validate(&self) -> PermissionResult<()> {
        if self.pattern.is_empty() {
            return Err(PermissionError::invalid_selector("", "empty pattern"));
        }

        let supported = self.pattern.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'*')
        });
        if !supported {
            return Err(PermissionError::invalid_selector(
                &self.pattern,
                "only lowercase letters, digits, '_', '.' and '*' are supported",
            ));
        }

        if self.pattern.split('.').any(str::is_empty) {
            return Err(PermissionError::invalid_selector(
                &self.pattern,
                "empty namespace segment",
            ));
        }

        Ok(())
    }
}

/// Glob match where `*` spans any run of characters, dots included
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let (mut p_idx, mut v_idx) = (0usize, 0usize);
    let (mut star_idx, mut match_idx) = (None, 0usize);
    let pattern = pattern.as_bytes();
    let value = value.as_bytes();

    while v_idx < value.len() {
        if p_idx < pattern.len() && pattern[p_idx] == b'*' {
            star_idx = Some(p_idx);
            match_idx = v_idx;
            p_idx += 1;
            continue;
        }

        if p_idx < pattern.len() && pattern[p_idx] == value[v_idx] {
            p_idx += 1;
            v_idx += 1;
            continue;
        }

        // backtrack: let the last star swallow one more byte
        if let Some(star) = star_idx {
            p_idx = star + 1;
            match_idx += 1;
            v_idx = match_idx;
            continue;
        }

        return false;
    }

    while p_idx < pattern.len() && pattern[p_idx] == b'*' {
        p_idx += 1;
    }

    p_idx == pattern.len()
}
