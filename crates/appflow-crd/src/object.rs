//! Free-form resource objects
//!
//! Step targets are rendered from templates the engine knows nothing about,
//! so they are carried as type metadata, object metadata and an arbitrary
//! JSON body (`spec`, `status`, `data`, ...).

use crate::{Condition, CrdError, ObjectMeta, Result, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource object of any kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnstructuredObject {
    /// Type metadata (apiVersion, kind)
    #[serde(flatten)]
    pub type_meta: TypeMeta,

    /// Object metadata (name, namespace, uid, generation, ...)
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Everything else: spec, status and any top-level fields
    #[serde(flatten)]
    pub data: Value,
}

impl UnstructuredObject {
    /// Create an empty object of the given type
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            type_meta: TypeMeta::new(api_version, kind),
            metadata: ObjectMeta::default(),
            data: Value::Object(Map::new()),
        }
    }

    /// Set the object name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    /// Set a top-level body field (e.g., "spec")
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body_mut().insert(key.into(), value);
        self
    }

    pub fn api_version(&self) -> &str {
        &self.type_meta.api_version
    }

    pub fn kind(&self) -> &str {
        &self.type_meta.kind
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    /// Platform-assigned UID, empty when not yet stored
    pub fn uid(&self) -> &str {
        self.metadata.uid.as_deref().unwrap_or_default()
    }

    /// Generation counter, zero when not yet stored
    pub fn generation(&self) -> i64 {
        self.metadata.generation()
    }

    /// Look up a nested body field by path
    pub fn nested(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.data, |value, key| value.get(key))
    }

    /// The reported status block, if any
    pub fn status(&self) -> Option<&Value> {
        self.nested(&["status"])
    }

    /// Body fields other than status; what the platform tracks generations for
    pub fn desired_state(&self) -> Map<String, Value> {
        let mut body = self.data.as_object().cloned().unwrap_or_default();
        body.remove("status");
        body
    }

    /// All conditions under `status.conditions`
    ///
    /// A missing or null list yields no conditions; anything that is not a
    /// list of conditions is an error.
    pub fn conditions(&self) -> Result<Vec<Condition>> {
        match self.nested(&["status", "conditions"]) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).map_err(CrdError::from))
                .collect(),
            Some(other) => Err(CrdError::InvalidFieldValue {
                field: "status.conditions".to_string(),
                message: format!("expected a list, found {}", other),
            }),
        }
    }

    /// The condition of the given type, if reported
    pub fn condition(&self, condition_type: &str) -> Result<Option<Condition>> {
        Ok(self
            .conditions()?
            .into_iter()
            .find(|c| c.condition_type == condition_type))
    }

    /// Insert or replace a condition in `status.conditions`, keyed by type
    pub fn set_condition(&mut self, condition: Condition) -> Result<()> {
        let mut conditions = self.conditions()?;
        match conditions
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => *existing = condition,
            None => conditions.push(condition),
        }

        let status = self
            .body_mut()
            .entry("status")
            .or_insert_with(|| Value::Object(Map::new()));
        if !status.is_object() {
            *status = Value::Object(Map::new());
        }
        if let Value::Object(status) = status {
            status.insert("conditions".to_string(), serde_json::to_value(conditions)?);
        }
        Ok(())
    }

    fn body_mut(&mut self) -> &mut Map<String, Value> {
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        match &mut self.data {
            Value::Object(map) => map,
            _ => unreachable!("body was just replaced with an object"),
        }
    }
}
