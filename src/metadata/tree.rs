// SPDX-License-Identifier: MIT

use std::fmt;
use std::rc::Rc;

use serde_yaml::{Mapping, Value};

use crate::errors::MetadataError;
use crate::metadata::resolvers::ResolverRegistry;
use crate::utils::{value_to_string, value_type_name};

/// Entry points for turning documents into metadata trees.
pub struct Metadata;

impl Metadata {
    /// Wrap an already-decoded document.
    pub fn wrap(document: Value) -> Result<MetadataNode, MetadataError> {
        MetadataNode::new(document)
    }

    /// Parse a YAML document and wrap it, without placeholder expansion.
    pub fn from_yaml(yaml: &str) -> Result<MetadataNode, MetadataError> {
        let document: Value =
            serde_yaml::from_str(yaml).map_err(|err| MetadataError::InvalidDocument {
                reason: err.to_string(),
            })?;
        MetadataNode::new(document)
    }

    /// Parse a YAML document, expand `${resolver:...}` placeholders
    /// against the given resolver table, and wrap the result.
    pub fn load(yaml: &str, resolvers: &ResolverRegistry) -> Result<MetadataNode, MetadataError> {
        let document: Value =
            serde_yaml::from_str(yaml).map_err(|err| MetadataError::InvalidDocument {
                reason: err.to_string(),
            })?;
        let expanded = resolvers.expand(&document)?;
        MetadataNode::new(expanded)
    }
}

/// Container type of a metadata node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
}

/// A key addressing an entry of a node's own container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Key(String),
    Index(usize),
}

impl NodeKey {
    /// Private keys are string keys both prefixed and suffixed with a
    /// double underscore, e.g. `__process__`. Sequence indices are never
    /// private.
    pub fn is_private(&self) -> bool {
        match self {
            NodeKey::Key(key) => key.starts_with("__") && key.ends_with("__"),
            NodeKey::Index(_) => false,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Key(key) => write!(f, "{}", key),
            NodeKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// The result of a successful lookup: either a wrapped container node or
/// a leaf value. Absence is `Option::None` on the lookup itself, a
/// sentinel rather than an error, so callers can tell "no value anywhere
/// in the inheritance chain" apart from a found-but-falsy value.
#[derive(Debug, Clone)]
pub enum Item {
    Node(MetadataNode),
    Leaf(Value),
}

impl Item {
    pub fn as_node(&self) -> Option<&MetadataNode> {
        match self {
            Item::Node(node) => Some(node),
            Item::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Item::Node(_) => None,
            Item::Leaf(value) => Some(value),
        }
    }

    pub fn into_node(self) -> Option<MetadataNode> {
        match self {
            Item::Node(node) => Some(node),
            Item::Leaf(_) => None,
        }
    }
}

struct Inner {
    parent: Option<MetadataNode>,
    container: Value,
}

/// A node of the hierarchical metadata tree.
///
/// Wraps a mapping or sequence container together with a back-reference
/// to the node it was reached from. Key lookup walks the parent chain:
/// the node's own container first, then each **mapping** ancestor,
/// nearest first (sequence ancestors are skipped without terminating the
/// walk). Because wrapping happens at access time, the same underlying
/// container can carry different ancestor chains depending on where it
/// was reached from.
///
/// Nodes are immutable and cheap to clone (`Rc`-shared); values are
/// never mutated through this API.
#[derive(Clone)]
pub struct MetadataNode {
    inner: Rc<Inner>,
}

impl MetadataNode {
    /// Wrap a decoded document. The document must be a mapping or a
    /// sequence; leaves are never wrapped.
    pub fn new(document: Value) -> Result<Self, MetadataError> {
        match document {
            Value::Mapping(_) | Value::Sequence(_) => Ok(Self::make(None, document)),
            other => Err(MetadataError::NotAContainer {
                found: value_type_name(&other).to_string(),
            }),
        }
    }

    fn make(parent: Option<MetadataNode>, container: Value) -> Self {
        debug_assert!(matches!(
            container,
            Value::Mapping(_) | Value::Sequence(_)
        ));
        debug_assert!(parent.as_ref().map_or(true, MetadataNode::chain_is_acyclic));
        Self {
            inner: Rc::new(Inner { parent, container }),
        }
    }

    // The parent chain must be a finite tree; nodes are immutable after
    // construction, so a cycle would indicate a construction bug.
    fn chain_is_acyclic(&self) -> bool {
        let mut seen: Vec<*const Inner> = Vec::new();
        let mut node = Some(self.clone());
        while let Some(current) = node {
            let ptr = Rc::as_ptr(&current.inner);
            if seen.contains(&ptr) {
                return false;
            }
            seen.push(ptr);
            node = current.parent();
        }
        true
    }

    pub fn kind(&self) -> NodeKind {
        match &self.inner.container {
            Value::Mapping(_) => NodeKind::Mapping,
            _ => NodeKind::Sequence,
        }
    }

    pub fn parent(&self) -> Option<MetadataNode> {
        self.inner.parent.clone()
    }

    /// The raw container this node wraps.
    pub fn container(&self) -> &Value {
        &self.inner.container
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        self.inner.container.as_mapping()
    }

    pub fn len(&self) -> usize {
        match &self.inner.container {
            Value::Mapping(mapping) => mapping.len(),
            Value::Sequence(sequence) => sequence.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key` with inheritance.
    ///
    /// Checks the node's own container first, then walks the parent
    /// chain; the nearest mapping ancestor defining the key wins. A key
    /// stored as `null` counts as absent and the walk continues. Returns
    /// `None` when no ancestor defines the key.
    ///
    /// Container values are wrapped with their parent set to *this*
    /// node (the node the lookup started from), so inherited context
    /// follows the access path.
    pub fn get(&self, key: &str) -> Option<Item> {
        if let Value::Mapping(mapping) = &self.inner.container {
            if let Some(value) = mapping.get(key) {
                if !value.is_null() {
                    return Some(self.wrap_child(value.clone()));
                }
            }
        }

        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            if let Value::Mapping(mapping) = &node.inner.container {
                if let Some(value) = mapping.get(key) {
                    if !value.is_null() {
                        return Some(self.wrap_child(value.clone()));
                    }
                }
            }
            ancestor = node.parent();
        }
        None
    }

    /// Look up an element of a sequence node's own container by index.
    /// Indices do not take part in inheritance.
    pub fn index(&self, index: usize) -> Option<Item> {
        match &self.inner.container {
            Value::Sequence(sequence) => sequence
                .get(index)
                .map(|value| self.wrap_child(value.clone())),
            _ => None,
        }
    }

    /// Check whether all given keys exist directly on this node's own
    /// container, ignoring inherited keys. Defined for mapping nodes
    /// only; sequence nodes are rejected.
    pub fn defines(&self, keys: &[&str]) -> Result<bool, MetadataError> {
        let mapping = self
            .as_mapping()
            .ok_or(MetadataError::NotAMapping { operation: "defines" })?;
        Ok(keys.iter().all(|key| mapping.contains_key(*key)))
    }

    /// Iterate the node's own container in container order, yielding
    /// `(key, wrapped value)` pairs for mappings and
    /// `(index, wrapped value)` pairs for sequences.
    pub fn items(&self) -> Box<dyn Iterator<Item = (NodeKey, Item)> + '_> {
        match &self.inner.container {
            Value::Mapping(mapping) => Box::new(mapping.iter().map(move |(key, value)| {
                let key = match key {
                    Value::String(key) => key.clone(),
                    other => value_to_string(other),
                };
                (NodeKey::Key(key), self.wrap_child(value.clone()))
            })),
            Value::Sequence(sequence) => {
                Box::new(sequence.iter().enumerate().map(move |(index, value)| {
                    (NodeKey::Index(index), self.wrap_child(value.clone()))
                }))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn wrap_child(&self, value: Value) -> Item {
        match value {
            Value::Mapping(_) | Value::Sequence(_) => {
                Item::Node(Self::make(Some(self.clone()), value))
            }
            leaf => Item::Leaf(leaf),
        }
    }
}

impl fmt::Debug for MetadataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetadataNode {
        Metadata::from_yaml(
            r#"
date: 2024-05-14
tag: root
inlet:
  flow_rate: 1.0L/min
  temperature: 293K
  composition:
    CH4: 3200ppm
    O2: 10%
    N2: '*'
data:
  - id: A
    tag: light-off
  - id: B
"#,
        )
        .unwrap()
    }

    fn node(item: Item) -> MetadataNode {
        item.into_node().expect("expected a container node")
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        let err = Metadata::wrap(Value::from("just a string")).unwrap_err();
        assert!(matches!(err, MetadataError::NotAContainer { .. }));
    }

    #[test]
    fn test_container_values_are_wrapped() {
        let root = sample();
        assert_eq!(root.kind(), NodeKind::Mapping);

        let inlet = node(root.get("inlet").unwrap());
        assert_eq!(inlet.kind(), NodeKind::Mapping);

        let data = node(root.get("data").unwrap());
        assert_eq!(data.kind(), NodeKind::Sequence);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_leaf_values_are_not_wrapped() {
        let root = sample();
        let inlet = node(root.get("inlet").unwrap());
        let flow = inlet.get("flow_rate").unwrap();
        assert_eq!(flow.as_leaf(), Some(&Value::from("1.0L/min")));
    }

    #[test]
    fn test_inherited_lookup_walks_ancestors() {
        let root = sample();
        let inlet = node(root.get("inlet").unwrap());

        // `date` is defined on the root mapping, two levels up
        let composition = node(inlet.get("composition").unwrap());
        assert_eq!(
            composition.get("date").unwrap().as_leaf(),
            Some(&Value::from("2024-05-14"))
        );
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let root = sample();
        let data = node(root.get("data").unwrap());

        // item 0 overrides `tag`; item 1 inherits the root's value
        let first = node(data.index(0).unwrap());
        assert_eq!(first.get("tag").unwrap().as_leaf(), Some(&Value::from("light-off")));

        let second = node(data.index(1).unwrap());
        assert_eq!(second.get("tag").unwrap().as_leaf(), Some(&Value::from("root")));
    }

    #[test]
    fn test_sequence_ancestors_are_skipped_not_terminating() {
        let root = sample();
        let data = node(root.get("data").unwrap());
        let first = node(data.index(0).unwrap());

        // chain: item -> data (sequence, skipped) -> root (mapping, hit)
        assert_eq!(
            first.get("date").unwrap().as_leaf(),
            Some(&Value::from("2024-05-14"))
        );
    }

    #[test]
    fn test_sequence_node_can_start_the_walk() {
        let root = sample();
        let data = node(root.get("data").unwrap());
        assert_eq!(data.get("date").unwrap().as_leaf(), Some(&Value::from("2024-05-14")));
    }

    #[test]
    fn test_absent_key_returns_none() {
        let root = sample();
        assert!(root.get("does-not-exist").is_none());
    }

    #[test]
    fn test_null_value_falls_through_to_ancestors() {
        let root = Metadata::from_yaml(
            r#"
tag: root
child:
  tag: ~
"#,
        )
        .unwrap();
        let child = node(root.get("child").unwrap());
        assert_eq!(child.get("tag").unwrap().as_leaf(), Some(&Value::from("root")));
    }

    #[test]
    fn test_defines_is_self_only() {
        let root = sample();
        let inlet = node(root.get("inlet").unwrap());

        assert!(root.defines(&["date"]).unwrap());
        assert!(!inlet.defines(&["date"]).unwrap());
        // all-of semantics for multiple keys
        let composition = node(inlet.get("composition").unwrap());
        assert!(composition.defines(&["CH4", "O2", "N2"]).unwrap());
        assert!(!composition.defines(&["CH4", "Ar"]).unwrap());
    }

    #[test]
    fn test_defines_rejects_sequence_nodes() {
        let root = sample();
        let data = node(root.get("data").unwrap());
        let err = data.defines(&["date"]).unwrap_err();
        assert!(matches!(err, MetadataError::NotAMapping { .. }));
    }

    #[test]
    fn test_items_preserve_container_order() {
        let root = sample();
        let inlet = node(root.get("inlet").unwrap());
        let composition = node(inlet.get("composition").unwrap());

        let keys: Vec<NodeKey> = composition.items().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                NodeKey::Key("CH4".to_string()),
                NodeKey::Key("O2".to_string()),
                NodeKey::Key("N2".to_string()),
            ]
        );

        let data = node(root.get("data").unwrap());
        let keys: Vec<NodeKey> = data.items().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![NodeKey::Index(0), NodeKey::Index(1)]);
    }

    #[test]
    fn test_wrapping_follows_access_path() {
        // the same underlying container reached from different nodes
        // carries the ancestor chain of the access path
        let root = sample();
        let data = node(root.get("data").unwrap());
        let via_sequence = node(data.index(0).unwrap());
        assert!(via_sequence.parent().is_some());
        assert_eq!(via_sequence.parent().unwrap().kind(), NodeKind::Sequence);
    }
}
