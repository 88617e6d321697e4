//! Error types for workflow execution
//!
//! Everything here is an infrastructure failure that aborts the pass.
//! A step reporting Failed or Stopped is not an error; it is recorded in
//! the Application status instead.

use appflow_crd::CrdError;
use thiserror::Error;

/// Error type for workflow execution
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Resource-level failure (validation, condition parsing, context encoding)
    #[error(transparent)]
    Crd(#[from] CrdError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Submission rejected by an applicator
    #[error("failed to apply '{name}': {message}")]
    Apply { name: String, message: String },

    /// Rendered objects do not line up with the workflow steps
    #[error("workflow has {steps} steps but {objects} rendered objects were supplied")]
    ObjectCountMismatch { steps: usize, objects: usize },
}

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;
