//! Common metadata types for resources

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kubernetes-style object metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    ///
    /// Rendered step objects may leave this empty; the engine names them.
    #[serde(default)]
    pub name: String,

    /// Namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Unique identifier assigned by the platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Resource version for optimistic concurrency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Spec generation counter maintained by the platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,

    /// Labels for organizing resources
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    /// Annotations for storing arbitrary metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,

    /// Objects this resource is owned by
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ObjectMeta {
    /// Create new metadata with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create new metadata with name and namespace
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Merge annotations into this object's annotations.
    ///
    /// Keys in `overrides` replace same-named keys; every other existing
    /// annotation is kept as is.
    pub fn merge_annotations(&mut self, overrides: HashMap<String, String>) {
        self.annotations.extend(overrides);
    }

    /// Generation counter, zero when the platform has not assigned one
    pub fn generation(&self) -> i64 {
        self.generation.unwrap_or(0)
    }
}

/// Type metadata for resource objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    /// API version (e.g., "core.oam.dev/v1beta1")
    pub api_version: String,

    /// Kind (e.g., "Application", "Deployment")
    pub kind: String,
}

impl TypeMeta {
    /// Create type metadata from an apiVersion and kind
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Create type metadata for Application
    pub fn application() -> Self {
        Self::new(crate::API_VERSION, crate::APPLICATION_KIND)
    }

    /// Split the apiVersion into (group, version); core types have an empty group
    pub fn group_version(&self) -> (&str, &str) {
        match self.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", self.api_version.as_str()),
        }
    }
}

/// Reference from an owned object to its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,

    /// Marks the owner as the managing controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,

    /// Blocks deletion of the owner until this object is removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

impl OwnerReference {
    /// Build a controller reference to an owner with the given type and identity
    pub fn controller(type_meta: &TypeMeta, meta: &ObjectMeta) -> Self {
        Self {
            api_version: type_meta.api_version.clone(),
            kind: type_meta.kind.clone(),
            name: meta.name.clone(),
            uid: meta.uid.clone().unwrap_or_default(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    /// Whether this reference marks the managing controller
    pub fn is_controller(&self) -> bool {
        self.controller.unwrap_or(false)
    }
}
