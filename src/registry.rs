// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde_yaml::Mapping;

use crate::errors::RegistryError;
use crate::traits::Step;

/// Name-to-prototype lookup for step implementations.
///
/// The registry is an explicit value passed by reference to the workflow
/// builder and the CLI; there is no module-global instance. Registered
/// prototypes are immutable: [`StepRegistry::get_runner`] hands out
/// fresh instances via [`Step::updated`], so callers can configure their
/// copy without affecting later lookups.
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// Register a step prototype under its `<name>@v<version>` key.
    ///
    /// `(name, version)` pairs are unique within a registry; registering
    /// a second prototype under an existing key is an error.
    pub fn register(&mut self, step: Arc<dyn Step>) -> Result<(), RegistryError> {
        let key = step.fullname();
        if self.steps.contains_key(&key) {
            return Err(RegistryError::DuplicateName { key });
        }
        self.steps.insert(key, step);
        Ok(())
    }

    /// Look up a prototype and return a fresh, independently configured
    /// instance with `overrides` merged onto its configuration.
    pub fn get_runner(
        &self,
        key: &str,
        overrides: &Mapping,
    ) -> Result<Arc<dyn Step>, RegistryError> {
        let prototype = self.steps.get(key).ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })?;
        prototype
            .updated(overrides)
            .map_err(|source| RegistryError::InvalidConfig {
                key: key.to_string(),
                source,
            })
    }

    /// Check if a step is registered under the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.steps.contains_key(key)
    }

    /// All registered step keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.steps.keys()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("step_count", &self.steps.len())
            .field("step_keys", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}
