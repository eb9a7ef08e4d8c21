//! Wrapper for the Kubernetes `Namespace` API object
//!
//! Namespaces are cluster-scoped and carry the cascading-deletion
//! semantics teardown relies on: deleting the namespace deletes every
//! namespaced object inside it. The delete call returns once the API
//! server has accepted the deletion, not once the cascade has finished —
//! use [`ApiObject::wait_until_deleted`](super::ApiObject::wait_until_deleted)
//! when a test needs the stronger guarantee.

use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_cluster, delete_cluster, get_cluster};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `core/v1 Namespace`.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub obj: core::Namespace,
}

impl Namespace {
    /// Wrap an existing typed object (manifest-loaded or live-fetched).
    pub fn wrap(obj: core::Namespace) -> Self {
        Self { obj }
    }

    /// Build a new namespace spec with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            obj: core::Namespace {
                metadata: ObjectMeta {
                    name: Some(name.into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// The namespace's observed status, if fetched.
    pub fn status(&self) -> Option<&core::NamespaceStatus> {
        self.obj.status.as_ref()
    }

    /// The observed phase string ("Active", "Terminating"), if any.
    pub fn phase(&self) -> Option<&str> {
        self.status().and_then(|s| s.phase.as_deref())
    }
}

impl ResourceOps for Namespace {
    fn kind(&self) -> Kind {
        Kind::Namespace
    }

    fn name(&self) -> Option<&str> {
        self.obj.metadata.name.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        None
    }

    fn set_namespace(&mut self, _namespace: &str) {}

    async fn create(
        &mut self,
        client: &Client,
        _namespace: Option<&str>,
    ) -> Result<(), ObjectError> {
        self.obj = create_cluster(client, "Namespace", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Namespace" })?
            .to_string();
        delete_cluster::<core::Namespace>(client, "Namespace", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Namespace" })?
            .to_string();
        self.obj = get_cluster(client, "Namespace", &name).await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        matches!(self.phase(), Some("Active"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_sets_metadata() {
        let ns = Namespace::named("kubetest-example-123");
        assert_eq!(ns.name(), Some("kubetest-example-123"));
        assert_eq!(ns.namespace(), None);
    }

    #[test]
    fn test_is_ready_defensive_without_status() {
        let ns = Namespace::named("kubetest-example-123");
        assert!(!ns.is_ready());
    }

    #[test]
    fn test_is_ready_phase() {
        let mut ns = Namespace::named("kubetest-example-123");
        ns.obj.status = Some(core::NamespaceStatus {
            phase: Some("Active".to_string()),
            ..Default::default()
        });
        assert!(ns.is_ready());

        ns.obj.status = Some(core::NamespaceStatus {
            phase: Some("Terminating".to_string()),
            ..Default::default()
        });
        assert!(!ns.is_ready());
    }
}
