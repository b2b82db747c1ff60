// SPDX-License-Identifier: MIT

mod metadata;
mod registry;
mod step;
mod workflow;

pub use metadata::{MetadataError, ResolveError, TimedeltaParseError};
pub use registry::RegistryError;
pub use step::StepError;
pub use workflow::WorkflowError;
