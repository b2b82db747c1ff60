// SPDX-License-Identifier: MIT

//! Built-in pipeline steps: YAML document i/o, mapping transforms and a
//! file-backed cache.

pub mod cache;
pub mod io;
pub mod transform;


use std::path::PathBuf;

use serde_yaml::Value;

use crate::errors::{RegistryError, StepError};
use crate::registry::StepRegistry;
use crate::traits::Params;
use crate::utils::value_type_name;

/// Register every built-in step on `registry`.
pub fn register_defaults(registry: &mut StepRegistry) -> Result<(), RegistryError> {
    registry.register(io::yaml_read())?;
    registry.register(io::yaml_write())?;
    registry.register(transform::map_select())?;
    registry.register(cache::file_cache())?;
    Ok(())
}

// Path settings can arrive per-run as a parameter or be baked into the
// step's configuration; the parameter wins.
pub(crate) fn path_setting(
    params: &Params,
    configured: Option<&str>,
    name: &'static str,
) -> Result<PathBuf, StepError> {
    match params.get(name) {
        Some(Value::String(path)) => Ok(PathBuf::from(path)),
        Some(other) => Err(StepError::Parameter {
            name: name.to_string(),
            reason: format!("expected a path string, got {}", value_type_name(other)),
        }),
        None => configured.map(PathBuf::from).ok_or_else(|| StepError::Parameter {
            name: name.to_string(),
            reason: "missing required path".to_string(),
        }),
    }
}
