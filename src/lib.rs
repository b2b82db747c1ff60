// SPDX-License-Identifier: MIT

pub mod errors; // error handling
pub mod metadata; // hierarchical metadata trees + resolvers
pub mod observability;
pub mod registry; // step registry
pub mod steps; // built-in steps
pub mod traits; // step contracts
pub mod utils;
pub mod workflow; // descriptors, graph assembly, execution

pub use metadata::{query, Metadata, MetadataNode, ResolverRegistry};
pub use registry::StepRegistry;
pub use traits::{CacheStep, Params, Step};
pub use workflow::{run, Workflow, WorkflowDescriptor};
