// SPDX-License-Identifier: MIT

//! Step implementations used by the workflow tests: a stateful counter
//! source, a string-append transform, an in-memory cache, and a step
//! that records its parameter values.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::errors::StepError;
use crate::registry::StepRegistry;
use crate::traits::{merge_config, CacheStep, Params, Step};
use crate::utils::value_to_string;

/// A source whose output changes across calls: 1, 2, 3, ...
pub struct CountingSource {
    counter: Arc<AtomicI64>,
}

impl Step for CountingSource {
    fn name(&self) -> &str {
        "test.counter"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, _overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(CountingSource {
            counter: Arc::clone(&self.counter),
        }))
    }

    fn run(&self, _input: Option<Value>, _params: &Params) -> Result<Value, StepError> {
        Ok(Value::from(self.counter.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

pub fn counting_source() -> Arc<dyn Step> {
    Arc::new(CountingSource {
        counter: Arc::new(AtomicI64::new(0)),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendConfig {
    pub suffix: String,
}

/// Appends a configured suffix to the stringified input.
pub struct AppendStep {
    config: AppendConfig,
}

impl Step for AppendStep {
    fn name(&self) -> &str {
        "test.append"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(AppendStep {
            config: merge_config(&self.config, overrides)?,
        }))
    }

    fn run(&self, input: Option<Value>, _params: &Params) -> Result<Value, StepError> {
        let input = input.ok_or_else(|| StepError::MissingInput {
            step: self.fullname(),
        })?;
        Ok(Value::from(format!(
            "{}{}",
            value_to_string(&input),
            self.config.suffix
        )))
    }
}

pub fn append_step(suffix: &str) -> Arc<dyn Step> {
    Arc::new(AppendStep {
        config: AppendConfig {
            suffix: suffix.to_string(),
        },
    })
}

/// An in-memory cache: invalid until the first write, valid afterwards.
pub struct MemoryCache {
    store: Arc<Mutex<Option<Value>>>,
}

impl Step for MemoryCache {
    fn name(&self) -> &str {
        "test.cache.memory"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, _overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(MemoryCache {
            store: Arc::clone(&self.store),
        }))
    }

    fn run(&self, input: Option<Value>, params: &Params) -> Result<Value, StepError> {
        let input = input.ok_or_else(|| StepError::MissingInput {
            step: self.fullname(),
        })?;
        self.write(&input, params)?;
        Ok(input)
    }

    fn as_cache(&self) -> Option<&dyn CacheStep> {
        Some(self)
    }
}

impl CacheStep for MemoryCache {
    fn cache_is_valid(&self, _params: &Params) -> Result<bool, StepError> {
        Ok(self.store.lock().unwrap().is_some())
    }

    fn read(&self, _params: &Params) -> Result<Value, StepError> {
        self.store
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StepError::Other("cache read with empty store".to_string()))
    }

    fn write(&self, value: &Value, _params: &Params) -> Result<(), StepError> {
        *self.store.lock().unwrap() = Some(value.clone());
        Ok(())
    }
}

pub fn once_valid_cache() -> Arc<dyn Step> {
    Arc::new(MemoryCache {
        store: Arc::new(Mutex::new(None)),
    })
}

/// Records the resolved value of its `tick` parameter on every run.
pub struct RecordingStep {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Step for RecordingStep {
    fn name(&self) -> &str {
        "test.recorder"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, _overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(RecordingStep {
            seen: Arc::clone(&self.seen),
        }))
    }

    fn run(&self, _input: Option<Value>, params: &Params) -> Result<Value, StepError> {
        if let Some(tick) = params.get("tick") {
            self.seen.lock().unwrap().push(tick.clone());
        }
        Ok(Value::Null)
    }
}

pub fn recording_step() -> (Arc<dyn Step>, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let step = Arc::new(RecordingStep {
        seen: Arc::clone(&seen),
    });
    (step, seen)
}

/// A registry preloaded with the test steps.
pub fn test_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register(counting_source()).unwrap();
    registry.register(append_step("")).unwrap();
    registry.register(once_valid_cache()).unwrap();
    let (recorder, _) = recording_step();
    registry.register(recorder).unwrap();
    registry
}
