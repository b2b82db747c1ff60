// SPDX-License-Identifier: MIT

//! End-to-end tests: descriptor in, executed graph out.

use serde_yaml::Value;

use crate::errors::{StepError, WorkflowError};
use crate::registry::StepRegistry;
use crate::traits::Params;
use crate::workflow::testing::{
    append_step, counting_source, once_valid_cache, recording_step, test_registry,
};
use crate::workflow::{run, Workflow, WorkflowDescriptor};

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_sequence_chaining_equals_nested_run() {
    // building [A, B] and running it equals B.run(A.run())
    let registry = test_registry();
    let descriptor = WorkflowDescriptor::from_yaml(
        r#"
- run: test.counter@v1
- run: test.append@v1
  config:
    suffix: "-x"
"#,
    )
    .unwrap();
    let chained = Workflow::build(&registry, &descriptor).unwrap().run().unwrap();

    let a = counting_source();
    let b = append_step("-x");
    let nested = b
        .run(Some(a.run(None, &Params::new()).unwrap()), &Params::new())
        .unwrap();

    assert_eq!(chained, nested);
}

#[test]
fn test_cache_short_circuit_over_descriptor() {
    let mut registry = StepRegistry::new();
    registry.register(counting_source()).unwrap();
    registry.register(once_valid_cache()).unwrap();

    let descriptor = WorkflowDescriptor::from_yaml(
        r#"
- run: test.counter@v1
- run: test.cache.memory@v1
"#,
    )
    .unwrap();
    let workflow = Workflow::build(&registry, &descriptor).unwrap();

    let outputs: Vec<Value> = (0..3).map(|_| workflow.run().unwrap()).collect();
    assert_eq!(outputs, vec![Value::from(1), Value::from(1), Value::from(1)]);
}

#[test]
fn test_runnable_param_builds_independent_subtree() {
    let mut registry = StepRegistry::new();
    registry.register(counting_source()).unwrap();
    let (recorder, seen) = recording_step();
    registry.register(recorder).unwrap();

    let descriptor = yaml(
        r#"
run: test.recorder@v1
params:
  $tick:
    run: test.counter@v1
"#,
    );

    let workflow = Workflow::from_value(&registry, &descriptor).unwrap();
    assert_eq!(workflow.root().node_count(), 2);

    // the sub-tree is re-evaluated on every run of the owning node
    workflow.run().unwrap();
    workflow.run().unwrap();
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[Value::from(1), Value::from(2)]
    );
}

#[test]
fn test_run_convenience_builds_and_runs() {
    let registry = test_registry();
    let result = run(&registry, &yaml("run: test.counter@v1")).unwrap();
    assert_eq!(result, Value::from(1));
}

#[test]
fn test_step_failure_propagates_unmodified() {
    // a chained step run as a source fails; the error reaches the
    // outermost caller untouched
    let registry = test_registry();
    let err = run(&registry, &yaml("run: test.append@v1")).unwrap_err();
    match err {
        WorkflowError::Step(StepError::MissingInput { ref step }) => {
            assert_eq!(step, "test.append@v1");
        }
        other => panic!("expected a propagated step error, got {:?}", other),
    }
}
