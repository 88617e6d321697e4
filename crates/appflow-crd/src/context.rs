//! Workflow context annotation
//!
//! Every submitted step object carries the context it was submitted under
//! as a single JSON annotation, so whatever reconciles that object can find
//! its Application, revision and position in the workflow.

use crate::{CrdError, ObjectMeta, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Annotation key holding the encoded workflow context
pub const ANNOTATION_WORKFLOW_CONTEXT: &str = "app.oam.dev/workflow-context";

/// Execution context of one step in one pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    pub app_name: String,
    pub app_revision: String,
    pub workflow_index: usize,
    /// ConfigMap holding the rendered resources of this revision
    pub resource_config_map: LocalObjectReference,
}

/// Reference to an object in the same namespace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocalObjectReference {
    pub name: String,
}

impl WorkflowContext {
    /// Context for step `workflow_index` of `app_name` at `revision`
    ///
    /// The resource ConfigMap is named after the revision.
    pub fn new(app_name: impl Into<String>, revision: impl Into<String>, workflow_index: usize) -> Self {
        let revision = revision.into();
        Self {
            app_name: app_name.into(),
            resource_config_map: LocalObjectReference {
                name: revision.clone(),
            },
            app_revision: revision,
            workflow_index,
        }
    }

    /// Name of the revision's resource ConfigMap
    pub fn resource_config_map_name(&self) -> &str {
        &self.resource_config_map.name
    }

    /// Encode into a single-entry annotation map
    pub fn encode(&self) -> Result<HashMap<String, String>> {
        let value = serde_json::to_string(self)?;
        Ok(HashMap::from([(ANNOTATION_WORKFLOW_CONTEXT.to_string(), value)]))
    }

    /// Encode and merge into `meta`'s annotations; the context key wins
    pub fn annotate(&self, meta: &mut ObjectMeta) -> Result<()> {
        meta.merge_annotations(self.encode()?);
        Ok(())
    }

    /// Read a context back from annotations, `None` when the key is absent
    pub fn decode(annotations: &HashMap<String, String>) -> Result<Option<Self>> {
        annotations
            .get(ANNOTATION_WORKFLOW_CONTEXT)
            .map(|raw| serde_json::from_str::<Self>(raw).map_err(CrdError::from))
            .transpose()
    }
}
