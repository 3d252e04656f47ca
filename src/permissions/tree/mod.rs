/*!
 * Permission Tree
 * Read-only registry of every legal permission key
 *
 * The namespace is declared as a nested literal ([`NamespaceDef`]), walked once
 * by [`PermissionTree::register`] which assigns the dotted paths and freezes
 * the structure. After that the tree is shared behind an `Arc` and never
 * mutated again.
 */

mod selector;
pub mod taxonomy;

pub use selector::{wildcard_match, PermSpec, Selector};

use crate::core::errors::{PermissionError, TreeError};
use crate::core::types::{PermissionKey, PermissionResult};
use ahash::AHashSet;
use std::collections::BTreeMap;
use tracing::debug;

/// Declarative namespace literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceDef {
    Node {
        name: &'static str,
        children: Vec<NamespaceDef>,
    },
    Leaf {
        name: &'static str,
    },
}

impl NamespaceDef {
    pub fn node(name: &'static str, children: Vec<NamespaceDef>) -> Self {
        NamespaceDef::Node { name, children }
    }

    pub fn leaf(name: &'static str) -> Self {
        NamespaceDef::Leaf { name }
    }

    /// Unnamed top level of a namespace
    pub fn root(children: Vec<NamespaceDef>) -> Self {
        NamespaceDef::Node { name: "", children }
    }

    fn name(&self) -> &'static str {
        match self {
            NamespaceDef::Node { name, .. } | NamespaceDef::Leaf { name } => name,
        }
    }
}

/// Interior node of the registered tree
#[derive(Debug, Clone)]
pub struct PermissionNode {
    path: String,
    children: Vec<(String, TreeEntry)>,
}

impl PermissionNode {
    /// Dotted namespace path (empty for the root)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Direct children in declaration order
    pub fn children(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.children.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    fn child(&self, name: &str) -> Option<&TreeEntry> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, entry)| entry)
    }

    /// Every key below this node
    pub fn keys(&self) -> Vec<PermissionKey> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, out: &mut Vec<PermissionKey>) {
        for (_, entry) in &self.children {
            match entry {
                TreeEntry::Key(key) => out.push(key.clone()),
                TreeEntry::Node(node) => node.collect_keys(out),
            }
        }
    }
}

/// Result of a structural lookup
#[derive(Debug, Clone)]
pub enum TreeEntry {
    Node(PermissionNode),
    Key(PermissionKey),
}

impl TreeEntry {
    pub fn is_key(&self) -> bool {
        matches!(self, TreeEntry::Key(_))
    }

    /// Keys this entry stands for
    pub fn keys(&self) -> Vec<PermissionKey> {
        match self {
            TreeEntry::Key(key) => vec![key.clone()],
            TreeEntry::Node(node) => node.keys(),
        }
    }
}

/// Registry of legal permission keys
#[derive(Debug, Default)]
pub struct PermissionTree {
    root: Option<PermissionNode>,
    keys: Vec<PermissionKey>,
    key_set: AHashSet<PermissionKey>,
}

impl PermissionTree {
    /// Create an unregistered tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree registered with the given namespace
    pub fn from_definition(definition: NamespaceDef) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        tree.register(definition)?;
        Ok(tree)
    }

    /// Create a tree registered with the built-in taxonomy
    pub fn with_defaults() -> Result<Self, TreeError> {
        Self::from_definition(taxonomy::definition())
    }

    /// Walk the namespace literal, assign dotted paths and freeze the tree
    pub fn register(&mut self, definition: NamespaceDef) -> Result<(), TreeError> {
        if self.root.is_some() {
            return Err(TreeError::AlreadyRegistered);
        }

        let children = match definition {
            NamespaceDef::Node { children, .. } => children,
            leaf @ NamespaceDef::Leaf { .. } => vec![leaf],
        };

        let mut keys = Vec::new();
        let root = build_node(String::new(), children, &mut keys)?;
        let key_set = keys.iter().cloned().collect();

        debug!(keys = keys.len(), "Permission tree registered");

        self.root = Some(root);
        self.keys = keys;
        self.key_set = key_set;
        Ok(())
    }

    /// Exact key membership
    pub fn has(&self, key: &str) -> bool {
        self.key_set.contains(key)
    }

    /// Key or namespace membership
    pub fn contains(&self, path: &str) -> bool {
        self.traverse(path).is_some()
    }

    /// All keys in declaration order
    pub fn keys(&self) -> &[PermissionKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn root(&self) -> Option<&PermissionNode> {
        self.root.as_ref()
    }

    /// Structural lookup of a dotted path
    pub fn traverse(&self, path: &str) -> Option<&TreeEntry> {
        let root = self.root.as_ref()?;
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut entry = root.child(first)?;

        for segment in segments {
            match entry {
                TreeEntry::Node(node) => entry = node.child(segment)?,
                TreeEntry::Key(_) => return None,
            }
        }

        Some(entry)
    }

    /// Expand a wildcard selector into concrete keys
    pub fn resolve(&self, selector: &Selector) -> PermissionResult<Vec<PermissionKey>> {
        selector.validate()?;

        let keys: Vec<PermissionKey> = self
            .keys
            .iter()
            .filter(|key| wildcard_match(selector.pattern(), key))
            .cloned()
            .collect();

        if keys.is_empty() {
            return Err(PermissionError::invalid_selector(
                selector.pattern(),
                "matches no permission",
            ));
        }

        Ok(keys)
    }

    /// Expand a grant/deny entry into concrete keys
    pub fn resolve_spec(&self, spec: &PermSpec) -> PermissionResult<Vec<PermissionKey>> {
        match spec {
            PermSpec::Key(path) => self
                .traverse(path)
                .map(TreeEntry::keys)
                .ok_or_else(|| PermissionError::UnknownPermission(path.clone())),
            PermSpec::Selector(selector) => self.resolve(selector),
        }
    }

    /// Check a list of grant/deny entries without expanding them
    pub fn check_specs(&self, specs: &[PermSpec]) -> PermissionResult<()> {
        for spec in specs {
            self.resolve_spec(spec)?;
        }
        Ok(())
    }

    /// Flat map of a grant and deny list; denies override grants
    pub fn compile(
        &self,
        grant: &[PermSpec],
        deny: &[PermSpec],
    ) -> PermissionResult<BTreeMap<PermissionKey, bool>> {
        let mut flat = BTreeMap::new();
        for (specs, value) in [(grant, true), (deny, false)] {
            for spec in specs {
                for key in self.resolve_spec(spec)? {
                    flat.insert(key, value);
                }
            }
        }
        Ok(flat)
    }

    /// Collapse a flat map into the fewest namespace/key entries
    ///
    /// A namespace replaces its keys when every key below it is present with
    /// the same value.
    pub fn shortest_representation(
        &self,
        flat: &BTreeMap<PermissionKey, bool>,
    ) -> BTreeMap<String, bool> {
        let mut out = BTreeMap::new();
        if let Some(root) = &self.root {
            for (_, entry) in &root.children {
                collapse(entry, flat, &mut out);
            }
        }
        out
    }
}

fn collapse(entry: &TreeEntry, flat: &BTreeMap<PermissionKey, bool>, out: &mut BTreeMap<String, bool>) {
    match entry {
        TreeEntry::Key(key) => {
            if let Some(value) = flat.get(key) {
                out.insert(key.clone(), *value);
            }
        }
        TreeEntry::Node(node) => {
            let keys = node.keys();
            let first = keys.first().and_then(|key| flat.get(key));
            let uniform = first.is_some() && keys.iter().all(|key| flat.get(key) == first);

            match first {
                Some(value) if uniform => {
                    out.insert(node.path.clone(), *value);
                }
                _ => {
                    for (_, child) in &node.children {
                        collapse(child, flat, out);
                    }
                }
            }
        }
    }
}

fn build_node(
    path: String,
    definitions: Vec<NamespaceDef>,
    keys: &mut Vec<PermissionKey>,
) -> Result<PermissionNode, TreeError> {
    if definitions.is_empty() {
        return Err(TreeError::EmptyNamespace(path));
    }

    let mut children: Vec<(String, TreeEntry)> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let name = definition.name();
        if !is_valid_segment(name) {
            return Err(TreeError::InvalidName(name.to_string()));
        }

        let child_path = if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}.{name}")
        };

        if children.iter().any(|(existing, _)| existing == name) {
            return Err(TreeError::DuplicateName(child_path));
        }

        let entry = match definition {
            NamespaceDef::Leaf { .. } => {
                keys.push(child_path.clone());
                TreeEntry::Key(child_path)
            }
            NamespaceDef::Node { children, .. } => {
                TreeEntry::Node(build_node(child_path, children, keys)?)
            }
        };
        children.push((name.to_string(), entry));
    }

    Ok(PermissionNode { path, children })
}

fn is_valid_segment(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
