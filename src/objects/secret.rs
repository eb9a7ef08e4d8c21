//! Wrapper for the Kubernetes `Secret` API object

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1 as core;
use k8s_openapi::ByteString;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `core/v1 Secret`.
#[derive(Debug, Clone)]
pub struct Secret {
    pub obj: core::Secret,
}

impl Secret {
    pub fn wrap(obj: core::Secret) -> Self {
        Self { obj }
    }

    /// The secret's opaque byte data, if any.
    pub fn data(&self) -> Option<&BTreeMap<String, ByteString>> {
        self.obj.data.as_ref()
    }

    /// The secret's type string (e.g. `Opaque`), if set.
    pub fn type_(&self) -> Option<&str> {
        self.obj.type_.as_deref()
    }

    fn identity(&self) -> Result<(String, String), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Secret" })?
            .to_string();
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Secret",
                name: name.clone(),
            })?
            .to_string();
        Ok((name, namespace))
    }
}

impl ResourceOps for Secret {
    fn kind(&self) -> Kind {
        Kind::Secret
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
        self.obj = create_namespaced(client, &ns, "Secret", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        delete_namespaced::<core::Secret>(client, &ns, "Secret", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        self.obj = get_namespaced(client, &ns, "Secret", &name).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.obj.metadata.creation_timestamp.is_some()
    }
}
