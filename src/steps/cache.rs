// SPDX-License-Identifier: MIT

use std::fs;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::errors::StepError;
use crate::steps::io::ensure_parent_dir;
use crate::steps::path_setting;
use crate::traits::{merge_config, CacheStep, Params, Step};

pub fn file_cache() -> Arc<dyn Step> {
    Arc::new(FileCache {
        config: FileCacheConfig::default(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileCacheConfig {
    /// Default cache file; a `target` run parameter overrides it.
    pub target: Option<String>,
}

/// `file.cache@v1` short-circuits its parent chain with a JSON file.
///
/// Validity is simply "the target file exists" and is re-checked on
/// every run, so deleting the file forces a recompute on the next call
/// without touching the graph. A direct `run` refreshes the file and
/// passes the input through.
pub struct FileCache {
    config: FileCacheConfig,
}

impl Step for FileCache {
    fn name(&self) -> &str {
        "file.cache"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(FileCache {
            config: merge_config(&self.config, overrides)?,
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

impl CacheStep for FileCache {
    fn cache_is_valid(&self, params: &Params) -> Result<bool, StepError> {
        let target = path_setting(params, self.config.target.as_deref(), "target")?;
        Ok(target.exists())
    }

    fn read(&self, params: &Params) -> Result<Value, StepError> {
        let target = path_setting(params, self.config.target.as_deref(), "target")?;
        Ok(serde_json::from_str(&fs::read_to_string(target)?)?)
    }

    fn write(&self, value: &Value, params: &Params) -> Result<(), StepError> {
        let target = path_setting(params, self.config.target.as_deref(), "target")?;
        ensure_parent_dir(&target)?;
        fs::write(&target, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}
