// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::errors::StepError;
use crate::traits::{merge_config, Params, Step};
use crate::utils::{value_to_string, value_type_name};

pub fn map_select() -> Arc<dyn Step> {
    Arc::new(MapSelect {
        config: MapSelectConfig::default(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapSelectConfig {
    /// Old-key to new-key pairs; a `select` run parameter overrides it.
    #[serde(default)]
    pub select: Mapping,
}

/// `map.select@v1` selects and renames entries of a mapping input.
///
/// The output carries the selected entries under their new names, in
/// selection order. A source key absent from the input is an error,
/// never silently dropped.
pub struct MapSelect {
    config: MapSelectConfig,
}

impl MapSelect {
    fn selection<'a>(&'a self, params: &'a Params) -> Result<&'a Mapping, StepError> {
        match params.get("select") {
            Some(Value::Mapping(mapping)) => Ok(mapping),
            Some(other) => Err(StepError::Parameter {
                name: "select".to_string(),
                reason: format!("expected a mapping, got {}", value_type_name(other)),
            }),
            None => Ok(&self.config.select),
        }
    }
}

impl Step for MapSelect {
    fn name(&self) -> &str {
        "map.select"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(MapSelect {
            config: merge_config(&self.config, overrides)?,
        }))
    }

    fn run(&self, input: Option<Value>, params: &Params) -> Result<Value, StepError> {
        let input = input.ok_or_else(|| StepError::MissingInput {
            step: self.fullname(),
        })?;
        let mapping = input.as_mapping().ok_or_else(|| StepError::BadInput {
            step: self.fullname(),
            reason: format!("expected a mapping input, got {}", value_type_name(&input)),
        })?;

        let mut selected = Mapping::new();
        for (old_key, new_key) in self.selection(params)? {
            let value = mapping.get(old_key).ok_or_else(|| StepError::BadInput {
                step: self.fullname(),
                reason: format!("input has no entry '{}'", value_to_string(old_key)),
            })?;
            selected.insert(new_key.clone(), value.clone());
        }
        Ok(Value::Mapping(selected))
    }
}
