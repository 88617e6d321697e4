//! Manifest loading
//!
//! Applications are read from a single YAML document. Rendered step objects
//! are read from a multi-document YAML stream where document `i` is the
//! target of step `i`.

use appflow_crd::{Application, UnstructuredObject};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::Path;

/// Load an Application manifest
pub fn load_application(path: &Path) -> Result<Application> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read application {}", path.display()))?;
    parse_application(&raw).wrap_err_with(|| format!("Invalid application {}", path.display()))
}

/// Load rendered step objects
pub fn load_objects(path: &Path) -> Result<Vec<UnstructuredObject>> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read objects {}", path.display()))?;
    parse_objects(&raw).wrap_err_with(|| format!("Invalid objects {}", path.display()))
}

pub fn parse_application(raw: &str) -> Result<Application> {
    Ok(serde_yaml::from_str(raw)?)
}

pub fn parse_objects(raw: &str) -> Result<Vec<UnstructuredObject>> {
    let mut objects = Vec::new();
    for (i, document) in serde_yaml::Deserializer::from_str(raw).enumerate() {
        let value = serde_yaml::Value::deserialize(document)?;
        // Skip empty documents (e.g. a trailing `---`)
        if value.is_null() {
            continue;
        }
        let object = serde_yaml::from_value(value)
            .wrap_err_with(|| format!("document {} is not a resource object", i))?;
        objects.push(object);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_application() {
        let app = parse_application(
            r#"
apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  name: shop
  namespace: prod
spec:
  workflow:
    - name: db
      type: apply-component
    - name: web
      type: apply-component
"#,
        )
        .unwrap();

        assert_eq!(app.metadata.name, "shop");
        assert_eq!(app.steps().len(), 2);
    }

    #[test]
    fn test_parse_objects_stream() {
        let objects = parse_objects(
            r#"
apiVersion: apps/v1
kind: Deployment
spec:
  replicas: 2
---
apiVersion: v1
kind: ConfigMap
data:
  mode: blue
---
"#,
        )
        .unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind(), "Deployment");
        assert_eq!(objects[0].nested(&["spec", "replicas"]), Some(&serde_json::json!(2)));
        assert_eq!(objects[1].kind(), "ConfigMap");
    }

    #[test]
    fn test_parse_objects_rejects_non_objects() {
        assert!(parse_objects("- just\n- a list\n").is_err());
    }
}
