// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::StepError;

/// Errors raised by the step registry.
#[derive(Debug)]
pub enum RegistryError {
    /// A step with the same `<name>@v<version>` key is already registered.
    DuplicateName { key: String },

    /// No step is registered under the requested key.
    NotFound { key: String },

    /// The registered prototype rejected the configuration overrides.
    InvalidConfig { key: String, source: StepError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateName { key } => {
                write!(f, "a step with the name '{}' already exists", key)
            }
            RegistryError::NotFound { key } => {
                write!(f, "no step registered under '{}'", key)
            }
            RegistryError::InvalidConfig { key, source } => {
                write!(f, "invalid configuration for step '{}': {}", key, source)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::InvalidConfig { source, .. } => Some(source),
            _ => None,
        }
    }
}
