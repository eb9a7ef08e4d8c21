//! Wrapper for the Kubernetes `ConfigMap` API object

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1 as core;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `core/v1 ConfigMap`.
#[derive(Debug, Clone)]
pub struct ConfigMap {
    pub obj: core::ConfigMap,
}

impl ConfigMap {
    pub fn wrap(obj: core::ConfigMap) -> Self {
        Self { obj }
    }

    /// The config map's string data, if any.
    pub fn data(&self) -> Option<&BTreeMap<String, String>> {
        self.obj.data.as_ref()
    }

    fn identity(&self) -> Result<(String, String), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "ConfigMap" })?
            .to_string();
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "ConfigMap",
                name: name.clone(),
            })?
            .to_string();
        Ok((name, namespace))
    }
}

impl ResourceOps for ConfigMap {
    fn kind(&self) -> Kind {
        Kind::ConfigMap
    }

    fn name(&self) -> Option<&str> {
        self.obj.metadata.name.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.obj.metadata.namespace.as_deref()
    }

    fn set_namespace(&mut self, namespace: &str) {
        if self.obj.metadata.namespace.is_none() {
            self.obj.metadata.namespace = Some(namespace.to_string());
        }
    }

    async fn create(
        &mut self,
        client: &Client,
        namespace: Option<&str>,
    ) -> Result<(), ObjectError> {
        if let Some(ns) = namespace {
            self.set_namespace(ns);
        }
        let (_, ns) = self.identity()?;
        self.obj = create_namespaced(client, &ns, "ConfigMap", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        delete_namespaced::<core::ConfigMap>(client, &ns, "ConfigMap", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        self.obj = get_namespaced(client, &ns, "ConfigMap", &name).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.obj.metadata.creation_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_accessor() {
        let mut obj = core::ConfigMap::default();
        obj.data = Some(BTreeMap::from([(
            "log_level".to_string(),
            "debug".to_string(),
        )]));
        let cm = ConfigMap::wrap(obj);
        assert_eq!(
            cm.data().and_then(|d| d.get("log_level")).map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_is_ready_defensive() {
        assert!(!ConfigMap::wrap(core::ConfigMap::default()).is_ready());
    }
}
