// SPDX-License-Identifier: MIT

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::errors::StepError;
use crate::steps::path_setting;
use crate::traits::{merge_config, Params, Step};

pub fn yaml_read() -> Arc<dyn Step> {
    Arc::new(YamlRead {
        config: YamlReadConfig::default(),
    })
}

pub fn yaml_write() -> Arc<dyn Step> {
    Arc::new(YamlWrite {
        config: YamlWriteConfig::default(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlReadConfig {
    /// Default source expression; a `source` run parameter overrides it.
    pub source: Option<String>,
}

/// `yaml.read@v1` is a source step loading one or more YAML documents.
///
/// The source expression may contain `*` and `**` glob patterns. A
/// single match yields the parsed document itself; multiple matches
/// yield a sequence of documents in lexical path order. No match at all
/// is an error, never an empty result.
pub struct YamlRead {
    config: YamlReadConfig,
}

impl Step for YamlRead {
    fn name(&self) -> &str {
        "yaml.read"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(YamlRead {
            config: merge_config(&self.config, overrides)?,
        }))
    }

    fn run(&self, _input: Option<Value>, params: &Params) -> Result<Value, StepError> {
        let pattern = path_setting(params, self.config.source.as_deref(), "source")?;
        let sources = glob_sources(&pattern)?;

        let mut documents = Vec::with_capacity(sources.len());
        for source in sources {
            let text = fs::read_to_string(&source)?;
            documents.push(serde_yaml::from_str(&text)?);
        }
        if documents.len() == 1 {
            Ok(documents.remove(0))
        } else {
            Ok(Value::Sequence(documents))
        }
    }
}

// Expand a source expression into the matching paths, in lexical order.
fn glob_sources(pattern: &PathBuf) -> Result<Vec<PathBuf>, StepError> {
    let expression = pattern.to_string_lossy();
    let matches = glob::glob(&expression).map_err(|err| StepError::Parameter {
        name: "source".to_string(),
        reason: err.to_string(),
    })?;

    let mut sources: Vec<PathBuf> = matches.filter_map(Result::ok).collect();
    sources.sort();
    if sources.is_empty() {
        return Err(StepError::NoSources {
            pattern: pattern.clone(),
        });
    }
    Ok(sources)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlWriteConfig {
    /// Default target path; a `target` run parameter overrides it.
    pub target: Option<String>,
}

/// `yaml.write@v1` is a pass-through writer rendering its input as YAML.
/// Creates the target's parent directory when missing and returns the
/// input unchanged, so writers can sit in the middle of a sequence.
pub struct YamlWrite {
    config: YamlWriteConfig,
}

impl Step for YamlWrite {
    fn name(&self) -> &str {
        "yaml.write"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn updated(&self, overrides: &Mapping) -> Result<Arc<dyn Step>, StepError> {
        Ok(Arc::new(YamlWrite {
            config: merge_config(&self.config, overrides)?,
        }))
    }

    fn run(&self, input: Option<Value>, params: &Params) -> Result<Value, StepError> {
        let input = input.ok_or_else(|| StepError::MissingInput {
            step: self.fullname(),
        })?;
        let target = path_setting(params, self.config.target.as_deref(), "target")?;
        ensure_parent_dir(&target)?;
        fs::write(&target, serde_yaml::to_string(&input)?)?;
        Ok(input)
    }
}

pub(crate) fn ensure_parent_dir(path: &PathBuf) -> Result<(), StepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
