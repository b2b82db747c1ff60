// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde_yaml::Value;

use crate::errors::WorkflowError;
use crate::observability::messages::WorkflowBuilt;
use crate::observability::StructuredLog;
use crate::registry::StepRegistry;
use crate::workflow::descriptor::{ParamDescriptor, StepDescriptor, WorkflowDescriptor};
use crate::workflow::node::{ParamBinding, ProcessNode};

/// An executable workflow: the root node of a built process graph.
///
/// Running the workflow runs the root node, which cascades back through
/// all prior elements of a sequence as parents.
#[derive(Debug)]
pub struct Workflow {
    root: ProcessNode,
}

impl Workflow {
    /// Build a process graph from a parsed descriptor, resolving every
    /// `run` key against the registry.
    pub fn build(
        registry: &StepRegistry,
        descriptor: &WorkflowDescriptor,
    ) -> Result<Workflow, WorkflowError> {
        let root = build_node(registry, None, descriptor)?;
        WorkflowBuilt {
            node_count: root.node_count(),
        }
        .log();
        Ok(Workflow { root })
    }

    /// Parse a raw descriptor value and build it in one step.
    pub fn from_value(registry: &StepRegistry, value: &Value) -> Result<Workflow, WorkflowError> {
        Self::build(registry, &WorkflowDescriptor::parse(value)?)
    }

    pub fn root(&self) -> &ProcessNode {
        &self.root
    }

    pub fn run(&self) -> Result<Value, WorkflowError> {
        self.root.run()
    }
}

/// Parse, build, and run a descriptor in one call.
pub fn run(registry: &StepRegistry, descriptor: &Value) -> Result<Value, WorkflowError> {
    Workflow::from_value(registry, descriptor)?.run()
}

fn build_node(
    registry: &StepRegistry,
    parent: Option<Box<ProcessNode>>,
    descriptor: &WorkflowDescriptor,
) -> Result<ProcessNode, WorkflowError> {
    match descriptor {
        WorkflowDescriptor::Step(step) => build_step(registry, parent, step),
        WorkflowDescriptor::Sequence(sequence) => {
            // build the chain left to right; each element's node becomes
            // the parent of the next, and the last node is returned
            let mut elements = sequence.iter();
            let first = elements.next().ok_or(WorkflowError::EmptyWorkflow)?;
            let mut node = build_node(registry, parent, first)?;
            for element in elements {
                node = build_node(registry, Some(Box::new(node)), element)?;
            }
            Ok(node)
        }
    }
}

fn build_step(
    registry: &StepRegistry,
    parent: Option<Box<ProcessNode>>,
    step: &StepDescriptor,
) -> Result<ProcessNode, WorkflowError> {
    let runner = registry.get_runner(&step.run, &step.config)?;

    let mut params = HashMap::with_capacity(step.params.len());
    for (name, param) in &step.params {
        let binding = match param {
            ParamDescriptor::Plain(value) => ParamBinding::Plain(value.clone()),
            // an independent sub-tree; it has no parent of its own
            ParamDescriptor::Runnable(descriptor) => {
                ParamBinding::Runnable(Box::new(build_node(registry, None, descriptor)?))
            }
        };
        params.insert(name.clone(), binding);
    }

    Ok(ProcessNode::new(parent, runner, params))
}
