//! Kubernetes applicator
//!
//! Submits step objects with server-side apply. The target resource is
//! resolved through API discovery so plural names and scope come from the
//! cluster rather than guesses.

use crate::applicator::Applicator;
use crate::error::Result;
use appflow_crd::{TypeMeta, UnstructuredObject};
use async_trait::async_trait;
use kube::{
    api::{Api, DynamicObject, Patch, PatchParams},
    core::GroupVersionKind,
    discovery::{self, Scope},
    Client,
};
use tracing::{debug, info};

/// Default server-side apply field manager
pub const DEFAULT_FIELD_MANAGER: &str = "appflow";

/// Applicator backed by a Kubernetes API server
#[derive(Clone)]
pub struct KubeApplicator {
    client: Client,
    field_manager: String,
    force: bool,
}

impl KubeApplicator {
    /// Create an applicator using `client`
    pub fn new(client: Client) -> Self {
        Self {
            client,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force: true,
        }
    }

    /// Create an applicator from the ambient kubeconfig or in-cluster config
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        info!("Kubernetes client initialized");
        Ok(Self::new(client))
    }

    /// Set the server-side apply field manager
    pub fn with_field_manager(mut self, field_manager: impl Into<String>) -> Self {
        self.field_manager = field_manager.into();
        self
    }

    /// Whether to take ownership of fields managed by someone else
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// UID of the live Application `name`, or `None` when it does not exist
    ///
    /// Step objects carry the Application as controller owner, and the API
    /// server rejects owner references without a UID.
    pub async fn application_uid(&self, namespace: Option<&str>, name: &str) -> Result<Option<String>> {
        let api = self.api_for(&TypeMeta::application(), namespace).await?;
        let uid = api
            .get_opt(name)
            .await?
            .and_then(|app| app.metadata.uid)
            .filter(|uid| !uid.is_empty());
        debug!(name, found = uid.is_some(), "Looked up application UID");
        Ok(uid)
    }

    async fn api_for(&self, type_meta: &TypeMeta, namespace: Option<&str>) -> Result<Api<DynamicObject>> {
        let (group, version) = type_meta.group_version();
        let gvk = GroupVersionKind::gvk(group, version, &type_meta.kind);
        let (resource, capabilities) = discovery::pinned_kind(&self.client, &gvk).await?;

        let api = match (capabilities.scope, namespace) {
            (Scope::Namespaced, Some(namespace)) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            (Scope::Namespaced, None) => Api::default_namespaced_with(self.client.clone(), &resource),
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
        };
        Ok(api)
    }
}

#[async_trait]
impl Applicator for KubeApplicator {
    async fn apply(&self, object: &mut UnstructuredObject) -> Result<()> {
        let api = self.api_for(&object.type_meta, object.namespace()).await?;

        let payload = to_dynamic(object)?;
        let mut params = PatchParams::apply(&self.field_manager);
        params.force = self.force;

        let applied = api
            .patch(object.name(), &params, &Patch::Apply(&payload))
            .await?;

        debug!(
            kind = %object.kind(),
            name = %object.name(),
            resource_version = ?applied.metadata.resource_version,
            generation = ?applied.metadata.generation,
            "Applied object"
        );

        *object = from_dynamic(&applied)?;
        Ok(())
    }
}

fn to_dynamic(object: &UnstructuredObject) -> Result<DynamicObject> {
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

fn from_dynamic(object: &DynamicObject) -> Result<UnstructuredObject> {
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

impl std::fmt::Debug for KubeApplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApplicator")
            .field("field_manager", &self.field_manager)
            .field("force", &self.force)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appflow_crd::{Application, ANNOTATION_WORKFLOW_CONTEXT};
    use serde_json::json;

    fn step_object() -> UnstructuredObject {
        let app = Application::new("shop", "prod").with_uid("app-uid");
        let mut object = UnstructuredObject::new("apps/v1", "Deployment")
            .with_name("db")
            .with_field("spec", json!({ "replicas": 2 }));
        object.metadata.namespace = Some("prod".to_string());
        object.metadata.owner_references = vec![app.controller_reference()];
        object
            .metadata
            .annotations
            .insert(ANNOTATION_WORKFLOW_CONTEXT.to_string(), "{}".to_string());
        object
    }

    #[test]
    fn test_to_dynamic_keeps_identity_and_body() {
        let payload = to_dynamic(&step_object()).unwrap();

        let types = payload.types.as_ref().unwrap();
        assert_eq!(types.api_version, "apps/v1");
        assert_eq!(types.kind, "Deployment");
        assert_eq!(payload.metadata.name.as_deref(), Some("db"));
        assert_eq!(payload.metadata.namespace.as_deref(), Some("prod"));

        let owners = payload.metadata.owner_references.as_ref().unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].uid, "app-uid");
        assert_eq!(owners[0].kind, "Application");
        assert_eq!(owners[0].controller, Some(true));

        let annotations = payload.metadata.annotations.as_ref().unwrap();
        assert!(annotations.contains_key(ANNOTATION_WORKFLOW_CONTEXT));
        assert_eq!(payload.data["spec"]["replicas"], 2);
    }

    #[test]
    fn test_from_dynamic_reads_server_state() {
        let mut applied = to_dynamic(&step_object()).unwrap();
        applied.metadata.uid = Some("obj-uid".to_string());
        applied.metadata.generation = Some(3);
        applied.data["status"] = json!({
            "conditions": [{ "type": "workflow-progress", "status": "True", "reason": "Failed" }]
        });

        let object = from_dynamic(&applied).unwrap();

        assert_eq!(object.kind(), "Deployment");
        assert_eq!(object.name(), "db");
        assert_eq!(object.uid(), "obj-uid");
        assert_eq!(object.generation(), 3);
        assert_eq!(object.metadata.owner_references[0].uid, "app-uid");
        assert_eq!(object.nested(&["spec", "replicas"]), Some(&json!(2)));
        assert!(object.condition("workflow-progress").unwrap().is_some());
    }
}
