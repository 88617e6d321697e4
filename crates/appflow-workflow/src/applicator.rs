//! Object submission
//!
//! This module defines the trait for submitting step objects to the
//! orchestration platform. Implementations can target a Kubernetes API
//! server or keep everything in memory for tests and dry runs.

use crate::error::{Result, WorkflowError};
use appflow_crd::{Condition, UnstructuredObject};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Idempotent create-or-update of resource objects
///
/// On success the implementation writes the platform's stored state back
/// into `object`, so callers observe the live uid, generation and status.
/// Errors are returned as-is; nothing is retried here.
#[async_trait]
pub trait Applicator: Send + Sync {
    /// Create the object if absent, update it otherwise
    async fn apply(&self, object: &mut UnstructuredObject) -> Result<()>;
}

/// (apiVersion, kind, namespace, name)
type ObjectKey = (String, String, String, String);

fn object_key(object: &UnstructuredObject) -> ObjectKey {
    (
        object.api_version().to_string(),
        object.kind().to_string(),
        object.namespace().unwrap_or_default().to_string(),
        object.name().to_string(),
    )
}

/// In-memory platform for testing
///
/// Behaves like an API server with a status subresource: the first apply
/// assigns a uid and generation 1, later applies bump the generation only
/// when the desired state changed, and status is owned by the platform
/// (submitted status is ignored).
#[derive(Debug, Default)]
pub struct MemoryApplicator {
    objects: RwLock<HashMap<ObjectKey, UnstructuredObject>>,
    failures: RwLock<HashMap<String, String>>,
    apply_count: AtomicUsize,
}

impl MemoryApplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every apply of objects named `name` with `message`
    pub fn fail_on(&self, name: impl Into<String>, message: impl Into<String>) {
        self.failures
            .write()
            .unwrap()
            .insert(name.into(), message.into());
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        self.failures.write().unwrap().clear();
    }

    /// Number of apply calls made so far, failed ones included
    pub fn apply_count(&self) -> usize {
        self.apply_count.load(Ordering::SeqCst)
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a stored object by namespace and name
    pub fn get(&self, namespace: &str, name: &str) -> Option<UnstructuredObject> {
        self.objects
            .read()
            .unwrap()
            .values()
            .find(|o| o.namespace().unwrap_or_default() == namespace && o.name() == name)
            .cloned()
    }

    /// Report a condition on a stored object, as a controller would
    ///
    /// Returns false when no such object is stored.
    pub fn set_condition(&self, namespace: &str, name: &str, condition: Condition) -> Result<bool> {
        let mut objects = self.objects.write().unwrap();
        let Some(object) = objects
            .values_mut()
            .find(|o| o.namespace().unwrap_or_default() == namespace && o.name() == name)
        else {
            return Ok(false);
        };

        object.set_condition(condition)?;
        Ok(true)
    }
}

#[async_trait]
impl Applicator for MemoryApplicator {
    async fn apply(&self, object: &mut UnstructuredObject) -> Result<()> {
        self.apply_count.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failures.read().unwrap().get(object.name()) {
            return Err(WorkflowError::Apply {
                name: object.name().to_string(),
                message: message.clone(),
            });
        }

        let key = object_key(object);
        let mut objects = self.objects.write().unwrap();

        let mut stored = object.clone();
        match objects.get(&key) {
            Some(existing) => {
                let generation = if existing.desired_state() == object.desired_state() {
                    existing.generation()
                } else {
                    existing.generation() + 1
                };
                stored.metadata.uid = existing.metadata.uid.clone();
                stored.metadata.generation = Some(generation);
                stored.metadata.creation_timestamp = existing.metadata.creation_timestamp;
                replace_status(&mut stored, existing.status().cloned());
                debug!(name = %stored.name(), generation, "Updated object");
            }
            None => {
                stored.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
                stored.metadata.generation = Some(1);
                replace_status(&mut stored, None);
                debug!(name = %stored.name(), "Created object");
            }
        }
        stored.metadata.resource_version = Some(self.apply_count().to_string());

        // A step whose rendered type changed replaces its previous object
        objects.retain(|(_, _, namespace, name), _| {
            !(namespace == &key.2 && name == &key.3)
        });
        objects.insert(key, stored.clone());
        *object = stored;
        Ok(())
    }
}

fn replace_status(object: &mut UnstructuredObject, status: Option<Value>) {
    if !object.data.is_object() {
        object.data = Value::Object(Map::new());
    }
    if let Value::Object(body) = &mut object.data {
        body.remove("status");
        if let Some(status) = status {
            body.insert("status".to_string(), status);
        }
    }
}
