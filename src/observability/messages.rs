// SPDX-License-Identifier: MIT

//! Message types for workflow build and execution events.

use std::fmt::{Display, Formatter};

use crate::observability::StructuredLog;

/// A descriptor was turned into an executable process graph.
pub struct WorkflowBuilt {
    pub node_count: usize,
}

impl Display for WorkflowBuilt {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Built workflow graph with {} node(s)", self.node_count)
    }
}

impl StructuredLog for WorkflowBuilt {
    fn log(&self) {
        tracing::debug!(node_count = self.node_count, "{}", self);
    }
}

/// A node's step ran to completion.
pub struct StepExecuted<'a> {
    pub step: &'a str,
    pub is_source: bool,
}

impl Display for StepExecuted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executed {} step '{}'",
            if self.is_source { "source" } else { "chained" },
            self.step
        )
    }
}

impl StructuredLog for StepExecuted<'_> {
    fn log(&self) {
        tracing::debug!(step = self.step, is_source = self.is_source, "{}", self);
    }
}

/// A cache step served a persisted result; the parent subtree was skipped.
pub struct CacheServedRead<'a> {
    pub step: &'a str,
}

impl Display for CacheServedRead<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cache step '{}' is valid; serving persisted result and skipping parent chain",
            self.step
        )
    }
}

impl StructuredLog for CacheServedRead<'_> {
    fn log(&self) {
        tracing::info!(step = self.step, "{}", self);
    }
}

/// A cache step found no valid entry and wrote the parent's fresh result.
pub struct CacheRefreshed<'a> {
    pub step: &'a str,
}

impl Display for CacheRefreshed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cache step '{}' was invalid; wrote fresh result", self.step)
    }
}

impl StructuredLog for CacheRefreshed<'_> {
    fn log(&self) {
        tracing::info!(step = self.step, "{}", self);
    }
}
