// SPDX-License-Identifier: MIT

use serde_yaml::{Mapping, Value};

use crate::errors::WorkflowError;
use crate::utils::{value_to_string, value_type_name};

/// Reserved sigil marking a parameter whose value is itself a workflow
/// descriptor, built into a runnable sub-graph.
pub const RUNNABLE_SIGIL: char = '$';

/// A parsed workflow descriptor.
///
/// Descriptors arrive as JSON-compatible nested structures (typically
/// decoded YAML) and are turned into this tagged union by an explicit
/// parse step; anything that is neither a mapping nor a sequence is
/// rejected with a typed error instead of being matched structurally at
/// build time.
///
/// ```yaml
/// - run: yaml.read@v1
///   params:
///     source: ./measurements/*.yaml
/// - run: map.select@v1
///   params:
///     select:
///       timestamp: timestamp
///       sample-downstream: temperature
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowDescriptor {
    /// A single process step.
    Step(StepDescriptor),
    /// A left-to-right chain of descriptors; each element's node becomes
    /// the parent of the next one.
    Sequence(Vec<WorkflowDescriptor>),
}

/// Descriptor for a single step: the registry key, constructor
/// configuration overrides, and keyword parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDescriptor {
    pub run: String,
    pub config: Mapping,
    pub params: Vec<(String, ParamDescriptor)>,
}

/// A declared step parameter. A parameter key carrying the `$` sigil
/// marks its value as a nested workflow descriptor; the sigil is
/// stripped from the parameter name during parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDescriptor {
    Plain(Value),
    Runnable(WorkflowDescriptor),
}

impl WorkflowDescriptor {
    /// Parse a decoded YAML/JSON value into a descriptor.
    pub fn parse(value: &Value) -> Result<Self, WorkflowError> {
        match value {
            Value::Mapping(mapping) => Ok(WorkflowDescriptor::Step(parse_step(mapping)?)),
            Value::Sequence(sequence) => {
                if sequence.is_empty() {
                    return Err(WorkflowError::EmptyWorkflow);
                }
                let steps = sequence
                    .iter()
                    .map(WorkflowDescriptor::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(WorkflowDescriptor::Sequence(steps))
            }
            other => Err(WorkflowError::InvalidDescriptor {
                found: value_type_name(other).to_string(),
            }),
        }
    }

    /// Parse a descriptor from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, WorkflowError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|err| {
            WorkflowError::InvalidDescriptor {
                found: format!("unparseable yaml ({})", err),
            }
        })?;
        Self::parse(&value)
    }
}

fn parse_step(mapping: &Mapping) -> Result<StepDescriptor, WorkflowError> {
    let run = match mapping.get("run") {
        Some(Value::String(key)) => key.clone(),
        Some(other) => {
            return Err(malformed(
                format!("the `run` element must be a string, got {}", value_type_name(other)),
                mapping,
            ))
        }
        None => {
            return Err(malformed(
                "the process parameters do not contain a `run` element".to_string(),
                mapping,
            ))
        }
    };

    let config = match mapping.get("config") {
        Some(Value::Mapping(config)) => config.clone(),
        Some(other) => {
            return Err(malformed(
                format!("the `config` element must be a mapping, got {}", value_type_name(other)),
                mapping,
            ))
        }
        None => Mapping::new(),
    };

    let params = match mapping.get("params") {
        Some(Value::Mapping(params)) => parse_params(params)?,
        Some(other) => {
            return Err(malformed(
                format!("the `params` element must be a mapping, got {}", value_type_name(other)),
                mapping,
            ))
        }
        None => Vec::new(),
    };

    Ok(StepDescriptor { run, config, params })
}

fn parse_params(mapping: &Mapping) -> Result<Vec<(String, ParamDescriptor)>, WorkflowError> {
    let mut params = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            Value::String(key) => key.as_str(),
            other => {
                return Err(malformed(
                    format!("parameter names must be strings, got {}", value_type_name(other)),
                    mapping,
                ))
            }
        };
        match key.strip_prefix(RUNNABLE_SIGIL) {
            // the value is itself a workflow descriptor
            Some(name) => params.push((
                name.to_string(),
                ParamDescriptor::Runnable(WorkflowDescriptor::parse(value)?),
            )),
            None => params.push((key.to_string(), ParamDescriptor::Plain(value.clone()))),
        }
    }
    Ok(params)
}

/// Build a `MalformedDescriptor` error echoing the offending mapping's
/// key/value pairs, so the broken descriptor can be located inside a
/// larger document.
fn malformed(reason: String, mapping: &Mapping) -> WorkflowError {
    let contents = mapping
        .iter()
        .map(|(key, value)| format!("{}: {}", value_to_string(key), value_to_string(value)))
        .collect::<Vec<_>>()
        .join("\n");
    WorkflowError::MalformedDescriptor { reason, contents }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_step() {
        let yaml = r#"
run: yaml.read@v1
params:
  source: ./data/run-01.yaml
"#;
        let descriptor = WorkflowDescriptor::from_yaml(yaml).unwrap();
        match descriptor {
            WorkflowDescriptor::Step(step) => {
                assert_eq!(step.run, "yaml.read@v1");
                assert!(step.config.is_empty());
                assert_eq!(step.params.len(), 1);
            }
            other => panic!("expected a step descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sequence() {
        let yaml = r#"
- run: yaml.read@v1
  params:
    source: ./data/run-01.yaml
- run: map.select@v1
  params:
    select:
      timestamp: timestamp
"#;
        let descriptor = WorkflowDescriptor::from_yaml(yaml).unwrap();
        match descriptor {
            WorkflowDescriptor::Sequence(steps) => assert_eq!(steps.len(), 2),
            other => panic!("expected a sequence descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_run_key_echoes_contents() {
        let yaml = r#"
params:
  source: ./data/run-01.yaml
tag: broken
"#;
        let err = WorkflowDescriptor::from_yaml(yaml).unwrap_err();
        match err {
            WorkflowError::MalformedDescriptor { ref contents, .. } => {
                // the offending mapping's pairs are part of the message
                assert!(contents.contains("tag: broken"), "contents: {}", contents);
            }
            other => panic!("expected MalformedDescriptor, got {:?}", other),
        }
        assert!(err.to_string().contains("`run` element"));
    }

    #[test]
    fn test_sigil_param_parses_nested_descriptor() {
        let yaml = r#"
run: map.join@v1
params:
  how: left
  $right:
    run: yaml.read@v1
    params:
      source: ./data/secondary.yaml
"#;
        let descriptor = WorkflowDescriptor::from_yaml(yaml).unwrap();
        let step = match descriptor {
            WorkflowDescriptor::Step(step) => step,
            other => panic!("expected a step descriptor, got {:?}", other),
        };

        assert_eq!(step.params.len(), 2);
        assert!(matches!(step.params[0], (ref name, ParamDescriptor::Plain(_)) if name == "how"));
        // the sigil is stripped from the parameter name
        assert!(
            matches!(step.params[1], (ref name, ParamDescriptor::Runnable(_)) if name == "right")
        );
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let err = WorkflowDescriptor::parse(&Value::Sequence(vec![])).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyWorkflow));
    }

    #[test]
    fn test_scalar_descriptor_is_rejected() {
        let err = WorkflowDescriptor::parse(&Value::from(42)).unwrap_err();
        match err {
            WorkflowError::InvalidDescriptor { ref found } => assert_eq!(found, "number"),
            other => panic!("expected InvalidDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_non_mapping_params_is_rejected() {
        let yaml = r#"
run: yaml.read@v1
params: [1, 2, 3]
"#;
        let err = WorkflowDescriptor::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedDescriptor { .. }));
    }
}
