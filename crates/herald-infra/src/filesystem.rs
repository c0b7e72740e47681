//! Filesystem loaders for workflow definitions, Data Contexts and rules.
//!
//! All reads go through `tokio::fs`. Workflow files are parsed by extension:
//! `.yaml`/`.yml` as YAML, anything else as JSON.

use std::path::{Path, PathBuf};

use herald_core::workflow::{WorkflowError, parse_workflow_json, parse_workflow_yaml};
use herald_types::context::DataContext;
use herald_types::workflow::WorkflowDefinition;
use serde_json::Value;
use thiserror::Error;

/// Errors from loading a file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {message}", path.display())]
    Json { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Workflow {
        path: PathBuf,
        #[source]
        source: WorkflowError,
    },
}

async fn read(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Load and validate a workflow definition.
pub async fn load_workflow(path: &Path) -> Result<WorkflowDefinition, LoadError> {
    let content = read(path).await?;
    let parsed = if is_yaml(path) {
        parse_workflow_yaml(&content)
    } else {
        parse_workflow_json(&content)
    };
    let def = parsed.map_err(|source| LoadError::Workflow {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        workflow_id = %def.workflow_id,
        steps = def.steps.len(),
        "loaded workflow"
    );
    Ok(def)
}

/// Load any JSON document (a rule, a control bag, a document tree).
pub async fn load_json(path: &Path) -> Result<Value, LoadError> {
    let content = read(path).await?;
    serde_json::from_str(&content).map_err(|e| LoadError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a Data Context. Missing sections default to empty.
pub async fn load_context(path: &Path) -> Result<DataContext, LoadError> {
    let value = load_json(path).await?;
    serde_json::from_value(value).map_err(|e| LoadError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a context file if given, otherwise an empty context.
pub async fn load_context_or_default(path: Option<&Path>) -> Result<DataContext, LoadError> {
    match path {
        Some(path) => load_context(path).await,
        None => Ok(DataContext::default()),
    }
}
