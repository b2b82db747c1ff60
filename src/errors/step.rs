// SPDX-License-Identifier: MIT

//! The error type step implementations return from `run`, `updated` and
//! the cache operations. The engine never inspects these beyond
//! propagating them unmodified to the outermost caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepError {
    /// The step's configuration could not be (de)serialized or merged.
    #[error("invalid step configuration: {0}")]
    Config(String),

    /// A required keyword parameter is missing or ill-typed.
    #[error("parameter '{name}': {reason}")]
    Parameter { name: String, reason: String },

    /// The step expected an input from a parent node but ran as a source.
    #[error("step '{step}' requires an input from a parent process")]
    MissingInput { step: String },

    /// The input value does not have the shape the step works on.
    #[error("step '{step}' cannot process this input: {reason}")]
    BadInput { step: String, reason: String },

    /// A source expression matched no files.
    #[error("no sources found matching expression: {}", pattern.display())]
    NoSources { pattern: PathBuf },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Free-form failure from a step implementation.
    #[error("{0}")]
    Other(String),
}
