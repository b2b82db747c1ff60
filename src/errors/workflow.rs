// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::{RegistryError, StepError};

/// Errors raised while parsing, building, or running a workflow.
#[derive(Debug)]
pub enum WorkflowError {
    /// A step descriptor is structurally broken (most commonly: the
    /// required `run` key is missing). `contents` echoes the offending
    /// mapping's key/value pairs so the broken descriptor can be found
    /// in a larger document.
    MalformedDescriptor { reason: String, contents: String },

    /// A sequence descriptor contains no elements.
    EmptyWorkflow,

    /// The descriptor is neither a mapping nor a sequence.
    InvalidDescriptor { found: String },

    /// Registry lookup or prototype configuration failed during build.
    Registry(RegistryError),

    /// A step failed during execution; propagated unmodified from the
    /// failing node to the outermost `run()` caller.
    Step(StepError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::MalformedDescriptor { reason, contents } => {
                write!(f, "malformed process descriptor: {}\n{}", reason, contents)
            }
            WorkflowError::EmptyWorkflow => {
                write!(f, "the process sequence contains no elements")
            }
            WorkflowError::InvalidDescriptor { found } => {
                write!(
                    f,
                    "a workflow descriptor must be either a mapping or a sequence of mappings, got {}",
                    found
                )
            }
            WorkflowError::Registry(err) => write!(f, "{}", err),
            WorkflowError::Step(err) => write!(f, "step execution failed: {}", err),
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::Registry(err) => Some(err),
            WorkflowError::Step(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for WorkflowError {
    fn from(err: RegistryError) -> Self {
        WorkflowError::Registry(err)
    }
}

impl From<StepError> for WorkflowError {
    fn from(err: StepError) -> Self {
        WorkflowError::Step(err)
    }
}
