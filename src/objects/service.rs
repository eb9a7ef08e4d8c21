//! Wrapper for the Kubernetes `Service` API object

use k8s_openapi::api::core::v1 as core;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `core/v1 Service`.
#[derive(Debug, Clone)]
pub struct Service {
    pub obj: core::Service,
}

impl Service {
    pub fn wrap(obj: core::Service) -> Self {
        Self { obj }
    }

    pub fn status(&self) -> Option<&core::ServiceStatus> {
        self.obj.status.as_ref()
    }

    fn identity(&self) -> Result<(String, String), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Service" })?
            .to_string();
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Service",
                name: name.clone(),
            })?
            .to_string();
        Ok((name, namespace))
    }
}

impl ResourceOps for Service {
    fn kind(&self) -> Kind {
        Kind::Service
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
        self.obj = create_namespaced(client, &ns, "Service", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        delete_namespaced::<core::Service>(client, &ns, "Service", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        self.obj = get_namespaced(client, &ns, "Service", &name).await?;
        Ok(())
    }

    /// Services have no readiness gate; one observed by the API server
    /// is ready.
    fn is_ready(&self) -> bool {
        self.obj.metadata.creation_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    #[test]
    fn test_is_ready_tracks_observation() {
        let mut svc = Service::wrap(core::Service::default());
        assert!(!svc.is_ready());

        svc.obj.metadata.creation_timestamp = Some(Time(chrono::Utc::now()));
        assert!(svc.is_ready());
    }

    #[test]
    fn test_set_namespace_keeps_explicit() {
        let mut svc = Service::wrap(core::Service {
            metadata: ObjectMeta {
                namespace: Some("staging".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        svc.set_namespace("kubetest-example");
        assert_eq!(svc.namespace(), Some("staging"));
    }
}
