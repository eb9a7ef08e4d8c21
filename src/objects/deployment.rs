//! Wrapper for the Kubernetes `Deployment` API object

use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use kube::api::DeleteParams;
use kube::Client;
use tracing::debug;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced, list_namespaced};
use super::{Kind, ObjectError, Pod, ResourceOps};
use crate::utils::selector_string;

/// Wrapper around `apps/v1 Deployment`.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub obj: apps::Deployment,
}

impl Deployment {
    /// Wrap an existing typed object (manifest-loaded or live-fetched).
    pub fn wrap(obj: apps::Deployment) -> Self {
        Self { obj }
    }

    /// The deployment's observed status, if fetched.
    pub fn status(&self) -> Option<&apps::DeploymentStatus> {
        self.obj.status.as_ref()
    }

    /// Pods currently matched by this deployment's label selector.
    ///
    /// Falls back to the deployment's own labels when no selector is set,
    /// which matches how hand-written minimal manifests tend to look.
    pub async fn get_pods(&self, client: &Client) -> Result<Vec<Pod>, ObjectError> {
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Deployment",
                name: self.name().unwrap_or_default().to_string(),
            })?
            .to_string();

        let labels = self
            .obj
            .spec
            .as_ref()
            .and_then(|s| s.selector.match_labels.as_ref())
            .or(self.obj.metadata.labels.as_ref());
        let selector = labels.map(selector_string);

        debug!(
            deployment = ?self.name(),
            selector = ?selector,
            "listing pods for deployment"
        );

        let pods =
            list_namespaced::<core::Pod>(client, &namespace, "Pod", selector.as_deref()).await?;
        Ok(pods.into_iter().map(Pod::wrap).collect())
    }
}

impl ResourceOps for Deployment {
    fn kind(&self) -> Kind {
        Kind::Deployment
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
        let ns = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Deployment",
                name: self.name().unwrap_or_default().to_string(),
            })?
            .to_string();
        self.obj = create_namespaced(client, &ns, "Deployment", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Deployment" })?
            .to_string();
        let ns = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Deployment",
                name: name.clone(),
            })?
            .to_string();
        delete_namespaced::<apps::Deployment>(client, &ns, "Deployment", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Deployment" })?
            .to_string();
        let ns = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Deployment",
                name: name.clone(),
            })?
            .to_string();
        self.obj = get_namespaced(client, &ns, "Deployment", &name).await?;
        Ok(())
    }

    /// Ready when the observed generation has caught up with the spec and
    /// every desired replica reports ready.
    fn is_ready(&self) -> bool {
        let Some(status) = self.status() else {
            return false;
        };

        if self.obj.metadata.generation != status.observed_generation {
            return false;
        }

        let Some(desired) = status.replicas else {
            return false;
        };
        status.ready_replicas == Some(desired)
    }
}
