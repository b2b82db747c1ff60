// SPDX-License-Identifier: MIT

//! Hierarchical metadata trees with key inheritance, a query facade,
//! and `${resolver:...}` placeholder expansion.

pub mod query;
pub mod resolvers;
pub mod tree;

pub use query::{query, MetadataQuery};
pub use resolvers::{ResolverContext, ResolverFn, ResolverRegistry};
pub use tree::{Item, Metadata, MetadataNode, NodeKey, NodeKind};
