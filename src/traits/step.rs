// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::errors::StepError;
use crate::utils::value_type_name;

/// Resolved keyword parameters handed to a step's `run`.
///
/// Parameter order is unspecified; a step must not rely on it.
pub type Params = HashMap<String, Value>;

/// The contract every pipeline step implements.
///
/// A step is a named, versioned, configurable unit of work. Registered
/// prototypes are immutable: configuring a step for execution goes
/// through [`Step::updated`], which returns a fresh instance and leaves
/// the receiver untouched.
///
/// Steps may carry internal state behind interior mutability (counters,
/// in-memory caches); the engine deliberately re-runs every node on
/// every `run()` invocation instead of memoizing results.
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Registry key for this step: `<name>@v<version>`.
    fn fullname(&self) -> String {
        format!("{}@v{}", self.name(), self.version())
    }

    /// Return a fresh instance with `overrides` merged onto the current
    /// configuration.
    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError>;

    /// Execute the step. `input` carries the parent node's result and is
    /// `None` for source steps.
    fn run(&self, input: Option<Value>, params: &Params) -> Result<Value, StepError>;

    /// Cache variants return `Some(self)` to opt into the
    /// validity/read/write interception during graph evaluation.
    fn as_cache(&self) -> Option<&dyn CacheStep> {
        None
    }
}

impl std::fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("fullname", &self.fullname())
            .finish()
    }
}

/// Contract for steps that can short-circuit their parent chain with a
/// persisted result.
///
/// Validity is re-checked on every `run()` of the owning node, so an
/// on-disk cache that appears or vanishes between calls is picked up
/// without rebuilding the graph.
pub trait CacheStep: Step {
    fn cache_is_valid(&self, params: &Params) -> Result<bool, StepError>;

    fn read(&self, params: &Params) -> Result<Value, StepError>;

    fn write(&self, value: &Value, params: &Params) -> Result<(), StepError>;
}

/// Merge `overrides` onto a step's configuration struct by round-tripping
/// it through `serde_yaml::Value`.
///
/// This is the building block for [`Step::updated`] implementations:
/// serialize the current configuration, overlay the override entries,
/// deserialize back into the config type. Unknown or ill-typed override
/// keys surface as a deserialization error on the way back.
pub fn merge_config<C>(config: &C, overrides: &Mapping) -> Result<C, StepError>
where
    C: Serialize + DeserializeOwned,
{
    let mut merged = match serde_yaml::to_value(config)? {
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(StepError::Config(format!(
                "step configuration must serialize to a mapping, got {}",
                value_type_name(&other)
            )))
        }
    };
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    Ok(serde_yaml::from_value(Value::Mapping(merged))?)
}
