// SPDX-License-Identifier: MIT

mod builder;
mod descriptor;
mod node;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub(crate) mod testing;

pub use builder::{run, Workflow};
pub use descriptor::{ParamDescriptor, StepDescriptor, WorkflowDescriptor, RUNNABLE_SIGIL};
pub use node::{ParamBinding, ProcessNode};
