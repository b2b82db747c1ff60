// SPDX-License-Identifier: MIT

use crate::errors::MetadataError;
use crate::metadata::tree::{Item, MetadataNode, NodeKey};

/// Build a query over `node` with private keys filtered out.
pub fn query(node: &MetadataNode) -> MetadataQuery {
    MetadataQuery::new(node.clone())
}

/// Stateless read-only view over a [`MetadataNode`].
///
/// All accessors operate on the node's own container; inherited keys
/// never show up here. Keys of the form `__name__` are treated as
/// private and filtered from every listing unless the query was built
/// with [`MetadataQuery::with_private_keys`].
pub struct MetadataQuery {
    node: MetadataNode,
    include_private_keys: bool,
}

impl MetadataQuery {
    pub fn new(node: MetadataNode) -> Self {
        Self {
            node,
            include_private_keys: false,
        }
    }

    pub fn with_private_keys(node: MetadataNode) -> Self {
        Self {
            node,
            include_private_keys: true,
        }
    }

    pub fn node(&self) -> &MetadataNode {
        &self.node
    }

    fn key_is_visible(&self, key: &NodeKey) -> bool {
        self.include_private_keys || !key.is_private()
    }

    /// Check whether all given keys exist directly on the queried node,
    /// ignoring inherited keys. Mapping nodes only.
    pub fn defines(&self, keys: &[&str]) -> Result<bool, MetadataError> {
        self.node.defines(keys)
    }

    /// Visible keys of the node's own container, in container order.
    /// Mapping nodes yield string keys, sequence nodes yield indices.
    pub fn keys(&self) -> Vec<NodeKey> {
        self.node
            .items()
            .map(|(key, _)| key)
            .filter(|key| self.key_is_visible(key))
            .collect()
    }

    /// Visible values of the node's own container, in container order.
    pub fn values(&self) -> Vec<Item> {
        self.node
            .items()
            .filter(|(key, _)| self.key_is_visible(key))
            .map(|(_, item)| item)
            .collect()
    }

    /// Visible `(key, value)` pairs of the node's own container, in
    /// container order.
    pub fn kvpairs(&self) -> Vec<(NodeKey, Item)> {
        self.node
            .items()
            .filter(|(key, _)| self.key_is_visible(key))
            .collect()
    }

    /// Lazily iterate over child nodes in depth-first preorder. Only
    /// children that are containers themselves are yielded; leaf values
    /// are skipped. With `recursive` the walk descends through every
    /// yielded node, filtering private keys at each level.
    pub fn iter_children(&self, recursive: bool) -> ChildIter {
        let mut stack = self.child_nodes();
        stack.reverse();
        ChildIter {
            stack,
            recursive,
            include_private_keys: self.include_private_keys,
        }
    }

    /// Collect the child container nodes into a vector. See
    /// [`MetadataQuery::iter_children`].
    pub fn children(&self, recursive: bool) -> Vec<MetadataNode> {
        self.iter_children(recursive).collect()
    }

    /// Lazily produce the nodes matching `predicate`: the queried node
    /// itself first (when `include_self`), then its children in
    /// depth-first preorder.
    pub fn find<'a, P>(
        &'a self,
        predicate: P,
        include_self: bool,
        recursive: bool,
    ) -> impl Iterator<Item = MetadataNode> + 'a
    where
        P: Fn(&MetadataNode) -> bool + 'a,
    {
        let head = if include_self && predicate(&self.node) {
            Some(self.node.clone())
        } else {
            None
        };
        head.into_iter().chain(
            self.iter_children(recursive)
                .filter(move |node| predicate(node)),
        )
    }

    fn child_nodes(&self) -> Vec<MetadataNode> {
        self.node
            .items()
            .filter(|(key, _)| self.key_is_visible(key))
            .filter_map(|(_, item)| item.into_node())
            .collect()
    }
}

/// Depth-first preorder traversal over container children.
pub struct ChildIter {
    stack: Vec<MetadataNode>,
    recursive: bool,
    include_private_keys: bool,
}

impl Iterator for ChildIter {
    type Item = MetadataNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if self.recursive {
            let view = if self.include_private_keys {
                MetadataQuery::with_private_keys(node.clone())
            } else {
                MetadataQuery::new(node.clone())
            };
            let mut children = view.child_nodes();
            children.reverse();
            self.stack.extend(children);
        }
        Some(node)
    }
}
