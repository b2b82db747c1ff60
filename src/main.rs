// SPDX-License-Identifier: MIT

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use tracing_subscriber::EnvFilter;

use rdmflow::metadata::{Metadata, MetadataQuery, ResolverRegistry};
use rdmflow::registry::StepRegistry;
use rdmflow::steps;
use rdmflow::workflow;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let mode = match Mode::from_args(&args[1..]) {
        Some(mode) => mode,
        None => {
            eprintln!("Usage: {} <workflow.yaml>", args[0]);
            eprintln!("       {} --meta <document.yaml>", args[0]);
            std::process::exit(1);
        }
    };

    let outcome = match &mode {
        Mode::Workflow(path) => run_workflow_file(path),
        Mode::Metadata(path) => run_metadata_document(path),
    };

    if let Err(err) = outcome {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq)]
enum Mode {
    Workflow(String),
    Metadata(String),
}

impl Mode {
    // `args` excludes the program name.
    fn from_args(args: &[String]) -> Option<Mode> {
        match args {
            [flag, path] if flag == "--meta" => Some(Mode::Metadata(path.clone())),
            [path] if path != "--meta" => Some(Mode::Workflow(path.clone())),
            _ => None,
        }
    }
}

fn default_registry() -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();
    steps::register_defaults(&mut registry).context("registering built-in steps")?;
    Ok(registry)
}

/// Run a file holding a single workflow descriptor and print the result.
fn run_workflow_file(path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let descriptor: Value =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path))?;

    let registry = default_registry()?;
    let result = workflow::run(&registry, &descriptor)
        .with_context(|| format!("running workflow from {}", path))?;

    print!("{}", serde_yaml::to_string(&result)?);
    Ok(())
}

/// Expand and wrap a metadata document, then run the workflow descriptor
/// of every node carrying a `__process__` entry.
fn run_metadata_document(path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let resolvers = ResolverRegistry::with_builtins();
    let root = Metadata::load(&text, &resolvers)
        .with_context(|| format!("loading metadata from {}", path))?;

    let registry = default_registry()?;
    let carries_process = |node: &rdmflow::MetadataNode| {
        node.defines(&["__process__"]).unwrap_or(false)
    };

    let mut ran = 0usize;
    let view = MetadataQuery::new(root);
    for node in view.find(carries_process, true, true) {
        let descriptor = node
            .get("__process__")
            .context("__process__ entry disappeared during traversal")?;
        let descriptor = match &descriptor {
            rdmflow::metadata::Item::Node(node) => node.container().clone(),
            rdmflow::metadata::Item::Leaf(leaf) => leaf.clone(),
        };

        let result = workflow::run(&registry, &descriptor)
            .with_context(|| format!("running embedded workflow #{}", ran + 1))?;
        print!("{}", serde_yaml::to_string(&result)?);
        ran += 1;
    }

    if ran == 0 {
        bail!("no __process__ nodes found in {}", path);
    }
    Ok(())
}
