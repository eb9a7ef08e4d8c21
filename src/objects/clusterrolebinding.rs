//! Wrapper for the Kubernetes `ClusterRoleBinding` API object
//!
//! Cluster-scoped, so it does not ride the namespace cascade; teardown
//! deletes registered cluster role bindings explicitly.

use k8s_openapi::api::rbac::v1 as rbac;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_cluster, delete_cluster, get_cluster};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `rbac.authorization.k8s.io/v1 ClusterRoleBinding`.
#[derive(Debug, Clone)]
pub struct ClusterRoleBinding {
    pub obj: rbac::ClusterRoleBinding,
}

impl ClusterRoleBinding {
    pub fn wrap(obj: rbac::ClusterRoleBinding) -> Self {
        Self { obj }
    }

    /// The subjects bound by this binding.
    pub fn subjects(&self) -> &[rbac::Subject] {
        self.obj.subjects.as_deref().unwrap_or_default()
    }

    fn require_name(&self) -> Result<String, ObjectError> {
        self.name()
            .map(str::to_string)
            .ok_or(ObjectError::MissingName {
                kind: "ClusterRoleBinding",
            })
    }
}

impl ResourceOps for ClusterRoleBinding {
    fn kind(&self) -> Kind {
        Kind::ClusterRoleBinding
    }

    fn name(&self) -> Option<&str> {
        self.obj.metadata.name.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        None
    }

    // Cluster-scoped; nothing to do.
    fn set_namespace(&mut self, _namespace: &str) {}

    async fn create(
        &mut self,
        client: &Client,
        _namespace: Option<&str>,
    ) -> Result<(), ObjectError> {
        self.require_name()?;
        self.obj = create_cluster(client, "ClusterRoleBinding", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let name = self.require_name()?;
        delete_cluster::<rbac::ClusterRoleBinding>(client, "ClusterRoleBinding", &name, options)
            .await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let name = self.require_name()?;
        self.obj = get_cluster(client, "ClusterRoleBinding", &name).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.obj.metadata.creation_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_cluster_scoped_has_no_namespace() {
        let mut crb = ClusterRoleBinding::wrap(rbac::ClusterRoleBinding {
            metadata: ObjectMeta {
                name: Some("kubetest:example".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        crb.set_namespace("kubetest-example");
        assert_eq!(crb.namespace(), None);
    }
}
