// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde_yaml::Value;

use crate::errors::WorkflowError;
use crate::observability::messages::{CacheRefreshed, CacheServedRead, StepExecuted};
use crate::observability::StructuredLog;
use crate::traits::{Params, Step};

/// A parameter handed to a step: either a plain value or a nested
/// runnable sub-graph whose result becomes the parameter value.
///
/// Bindings are evaluated lazily, once per `run()` invocation of the
/// owning node. There is no memoization across repeated runs: steps may
/// be stateful, so re-running a graph re-evaluates everything.
#[derive(Debug)]
pub enum ParamBinding {
    Plain(Value),
    Runnable(Box<ProcessNode>),
}

impl ParamBinding {
    pub fn value(&self) -> Result<Value, WorkflowError> {
        match self {
            ParamBinding::Plain(value) => Ok(value.clone()),
            ParamBinding::Runnable(node) => node.run(),
        }
    }
}

/// An execution-graph node binding a step instance, an optional parent
/// node, and named parameter bindings.
///
/// A node exclusively owns its parent subtree; nodes form a tree, never
/// a general DAG. A node without a parent is a source node. Parameter
/// bindings may hold entire independent sub-trees, so the overall
/// execution graph is a tree of sub-trees.
#[derive(Debug)]
pub struct ProcessNode {
    parent: Option<Box<ProcessNode>>,
    runner: Arc<dyn Step>,
    params: HashMap<String, ParamBinding>,
}

impl ProcessNode {
    pub fn new(
        parent: Option<Box<ProcessNode>>,
        runner: Arc<dyn Step>,
        params: HashMap<String, ParamBinding>,
    ) -> Self {
        Self {
            parent,
            runner,
            params,
        }
    }

    pub fn runner(&self) -> &dyn Step {
        self.runner.as_ref()
    }

    pub fn parent(&self) -> Option<&ProcessNode> {
        self.parent.as_deref()
    }

    /// Number of nodes in this graph, including parent chains and the
    /// sub-trees held by runnable parameter bindings.
    pub fn node_count(&self) -> usize {
        let mut count = 1;
        if let Some(parent) = &self.parent {
            count += parent.node_count();
        }
        for binding in self.params.values() {
            if let ParamBinding::Runnable(node) = binding {
                count += node.node_count();
            }
        }
        count
    }

    /// Run this node: parent-first, parameter-first lazy evaluation, with
    /// cache interception.
    ///
    /// A cache step's validity is checked before the parent subtree is
    /// touched; a valid cache serves its persisted result and the
    /// (possibly expensive) parent chain is never executed. The check is
    /// repeated on every call by design, so on-disk caches created or
    /// removed between runs take effect without rebuilding the graph.
    ///
    /// Errors from steps propagate unmodified to the outermost caller;
    /// there are no retries and no partial recovery.
    pub fn run(&self) -> Result<Value, WorkflowError> {
        if let Some(cache) = self.runner.as_cache() {
            let fullname = self.runner.fullname();
            // own bindings resolve before the parent subtree is touched
            let params = self.resolve_params()?;
            if cache.cache_is_valid(&params).map_err(WorkflowError::Step)? {
                CacheServedRead { step: &fullname }.log();
                return cache.read(&params).map_err(WorkflowError::Step);
            }
            // invalid cache: run normally; the cache step's own `run`
            // writes the fresh result through and returns it unmodified
            let result = self.run_uncached();
            if result.is_ok() {
                CacheRefreshed { step: &fullname }.log();
            }
            return result;
        }
        self.run_uncached()
    }

    fn run_uncached(&self) -> Result<Value, WorkflowError> {
        let input = match &self.parent {
            Some(parent) => Some(parent.run()?),
            None => None,
        };
        // each runnable binding triggers its own nested run; all bindings
        // complete before this node's step executes
        let params = self.resolve_params()?;
        let result = self
            .runner
            .run(input, &params)
            .map_err(WorkflowError::Step)?;
        StepExecuted {
            step: &self.runner.fullname(),
            is_source: self.parent.is_none(),
        }
        .log();
        Ok(result)
    }

    fn resolve_params(&self) -> Result<Params, WorkflowError> {
        self.params
            .iter()
            .map(|(key, binding)| Ok((key.clone(), binding.value()?)))
            .collect()
    }
}
