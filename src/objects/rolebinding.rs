//! Wrapper for the Kubernetes `RoleBinding` API object
//!
//! Role bindings are namespaced and ride the namespace cascade at
//! teardown; compare [`ClusterRoleBinding`](super::ClusterRoleBinding),
//! which the harness must delete explicitly.

use k8s_openapi::api::rbac::v1 as rbac;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `rbac.authorization.k8s.io/v1 RoleBinding`.
#[derive(Debug, Clone)]
pub struct RoleBinding {
    pub obj: rbac::RoleBinding,
}

impl RoleBinding {
    pub fn wrap(obj: rbac::RoleBinding) -> Self {
        Self { obj }
    }

    /// The subjects bound by this binding.
    pub fn subjects(&self) -> &[rbac::Subject] {
        self.obj.subjects.as_deref().unwrap_or_default()
    }

    fn identity(&self) -> Result<(String, String), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName {
                kind: "RoleBinding",
            })?
            .to_string();
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "RoleBinding",
                name: name.clone(),
            })?
            .to_string();
        Ok((name, namespace))
    }
}

impl ResourceOps for RoleBinding {
    fn kind(&self) -> Kind {
        Kind::RoleBinding
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
        self.obj = create_namespaced(client, &ns, "RoleBinding", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        delete_namespaced::<rbac::RoleBinding>(client, &ns, "RoleBinding", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        self.obj = get_namespaced(client, &ns, "RoleBinding", &name).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.obj.metadata.creation_timestamp.is_some()
    }
}
