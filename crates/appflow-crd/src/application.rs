//! Application resource types
//!
//! An Application owns an ordered workflow. Each step renders and submits
//! exactly one object; the status records how far the latest pass got.

use crate::{CrdError, ObjectMeta, OwnerReference, Result, TypeMeta};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application resource owning a deployment workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Type metadata (apiVersion, kind)
    #[serde(flatten)]
    pub type_meta: TypeMeta,

    /// Object metadata (name, namespace, uid, ...)
    pub metadata: ObjectMeta,

    /// Application specification
    #[serde(default)]
    pub spec: ApplicationSpec,

    /// Application status (set by the workflow engine)
    #[serde(default)]
    pub status: ApplicationStatus,
}

impl Application {
    /// Create a new Application
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            type_meta: TypeMeta::application(),
            metadata: ObjectMeta::with_namespace(name, namespace),
            spec: ApplicationSpec::default(),
            status: ApplicationStatus::default(),
        }
    }

    /// Append a workflow step
    pub fn with_step(mut self, name: impl Into<String>, step_type: impl Into<String>) -> Self {
        self.spec.workflow.push(WorkflowStep::new(name, step_type));
        self
    }

    /// Set the platform-assigned UID
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.metadata.uid = Some(uid.into());
        self
    }

    /// Workflow steps in execution order
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.spec.workflow
    }

    /// Controller owner reference pointing at this Application
    ///
    /// Always uses the canonical Application apiVersion/kind, whatever the
    /// type metadata on this instance says.
    pub fn controller_reference(&self) -> OwnerReference {
        OwnerReference::controller(&TypeMeta::application(), &self.metadata)
    }

    /// Validate the application
    pub fn validate(&self) -> Result<()> {
        if self.metadata.name.is_empty() {
            return Err(CrdError::MissingField("metadata.name".to_string()));
        }

        let mut seen = HashSet::new();
        for (i, step) in self.spec.workflow.iter().enumerate() {
            if step.name.is_empty() {
                return Err(CrdError::MissingField(format!("spec.workflow[{}].name", i)));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(CrdError::DuplicateStep(step.name.clone()));
            }
        }

        Ok(())
    }

    /// Status entry of a step from the latest pass
    pub fn step_status(&self, name: &str) -> Option<&WorkflowStepStatus> {
        self.status.workflow.iter().find(|s| s.name == name)
    }
}

/// Application specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Ordered workflow steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowStep>,
}

/// One unit of the workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Step name, unique within the workflow; also names the submitted object
    pub name: String,

    /// Step type (selects the template the object is rendered from)
    #[serde(rename = "type")]
    pub step_type: String,

    /// Template parameters, consumed by the renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_type: step_type.into(),
            properties: None,
        }
    }
}

/// Application status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// Overall phase
    #[serde(default)]
    pub phase: ApplicationPhase,

    /// Per-step status, rebuilt from the first step on every pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowStepStatus>,
}

/// Overall Application phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationPhase {
    /// Objects are being rendered
    #[default]
    Rendering,
    /// The workflow is being executed
    RunningWorkflow,
    /// All resources are applied and healthy
    Running,
    /// Resources are applied but not healthy
    Unhealthy,
    /// The application is being deleted
    Deleting,
}

/// Status of one workflow step in the latest pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepStatus {
    pub name: String,

    #[serde(rename = "type")]
    pub step_type: String,

    /// Identity of the object as stored by the platform
    pub resource_ref: TypedReference,

    pub phase: WorkflowStepPhase,
}

/// Reference to an object by type and identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TypedReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

/// Phase of a single workflow step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStepPhase {
    /// Not finished yet; the pass stops here and is retried later
    Running,
    /// Done at the current generation; the pass continues
    Succeeded,
    /// Terminal failure; the pass stops
    Failed,
    /// Terminal stop; the pass stops
    Stopped,
}

impl WorkflowStepPhase {
    /// Failed or Stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStepPhase::Failed | WorkflowStepPhase::Stopped)
    }
}

impl std::fmt::Display for WorkflowStepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStepPhase::Running => "running",
            WorkflowStepPhase::Succeeded => "succeeded",
            WorkflowStepPhase::Failed => "failed",
            WorkflowStepPhase::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
