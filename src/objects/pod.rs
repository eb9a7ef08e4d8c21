//! Wrapper for the Kubernetes `Pod` API object
//!
//! Besides the shared contract, pods expose the diagnostics surface the
//! harness leans on at teardown: container enumeration, log retrieval,
//! and an API-server-proxied HTTP GET into the pod for black-box checks
//! without port forwarding.

use k8s_openapi::api::core::v1 as core;
use kube::api::{Api, DeleteParams, LogParams};
use kube::Client;
use tracing::debug;

use super::api_object::{create_namespaced, delete_namespaced, get_namespaced};
use super::{Container, Kind, ObjectError, ResourceOps};
use crate::condition::Condition;
use crate::wait::{self, WaitError};

/// Wrapper around `core/v1 Pod`.
#[derive(Debug, Clone)]
pub struct Pod {
    pub obj: core::Pod,
}

impl Pod {
    /// Wrap an existing typed object (manifest-loaded or live-fetched).
    pub fn wrap(obj: core::Pod) -> Self {
        Self { obj }
    }

    /// The pod's observed status, if fetched.
    pub fn status(&self) -> Option<&core::PodStatus> {
        self.obj.status.as_ref()
    }

    /// The observed phase ("Pending", "Running", ...), if any.
    pub fn phase(&self) -> Option<&str> {
        self.status().and_then(|s| s.phase.as_deref())
    }

    fn identity(&self) -> Result<(String, String), ObjectError> {
        let name = self
            .name()
            .ok_or(ObjectError::MissingName { kind: "Pod" })?
            .to_string();
        let namespace = self
            .namespace()
            .ok_or_else(|| ObjectError::MissingNamespace {
                kind: "Pod",
                name: name.clone(),
            })?
            .to_string();
        Ok((name, namespace))
    }

    /// Container wrappers for the pod's last observed container statuses.
    /// Empty until the pod has been created or refreshed.
    pub fn get_containers(&self) -> Vec<Container> {
        let (Some(name), Some(namespace)) = (self.name(), self.namespace()) else {
            return Vec::new();
        };

        self.status()
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|cs| Container::new(name, namespace, cs.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fetch pod logs. `tail_lines` limits output to the trailing N
    /// lines; `None` fetches everything.
    pub async fn logs(
        &self,
        client: &Client,
        tail_lines: Option<i64>,
    ) -> Result<String, ObjectError> {
        self.fetch_logs(client, None, tail_lines).await
    }

    /// Fetch logs for one named container in the pod.
    pub async fn container_logs(
        &self,
        client: &Client,
        container: &str,
        tail_lines: Option<i64>,
    ) -> Result<String, ObjectError> {
        self.fetch_logs(client, Some(container), tail_lines).await
    }

    async fn fetch_logs(
        &self,
        client: &Client,
        container: Option<&str>,
        tail_lines: Option<i64>,
    ) -> Result<String, ObjectError> {
        let (name, namespace) = self.identity()?;
        let api: Api<core::Pod> = Api::namespaced(client.clone(), &namespace);

        let params = LogParams {
            container: container.map(str::to_string),
            tail_lines,
            ..Default::default()
        };

        api.logs(&name, &params)
            .await
            .map_err(|e| ObjectError::from_kube(e, "Pod", &name))
    }

    /// Issue an HTTP GET to the pod through the API server's proxy
    /// endpoint and return the response body.
    ///
    /// The path is relative to the pod's HTTP root; a leading slash is
    /// optional.
    pub async fn http_proxy_get(&self, client: &Client, path: &str) -> Result<String, ObjectError> {
        let (name, namespace) = self.identity()?;
        let path = path.trim_start_matches('/');
        let uri = format!("/api/v1/namespaces/{namespace}/pods/{name}/proxy/{path}");

        debug!(pod = %name, uri = %uri, "proxying HTTP GET into pod");

        let request = http::Request::get(uri)
            .body(Vec::new())
            .map_err(|e| ObjectError::Proxy(e.to_string()))?;

        client
            .request_text(request)
            .await
            .map_err(|e| ObjectError::from_kube(e, "Pod", &name))
    }

    /// Wait until every container in the pod has started, i.e. left the
    /// waiting state. A started container may still be unready; use
    /// [`ApiObject::wait_until_ready`](super::ApiObject::wait_until_ready)
    /// for full readiness.
    pub async fn wait_until_containers_start(
        &mut self,
        client: &Client,
        timeout: std::time::Duration,
    ) -> Result<(), WaitError> {
        let (name, namespace) = self.identity().map_err(|e| WaitError::Api {
            name: "pod containers started".to_string(),
            source: e,
        })?;

        let cond_client = client.clone();
        let cond_name = name.clone();
        let cond_ns = namespace.clone();
        let mut cond = Condition::new(
            format!("Pod '{namespace}/{name}' containers started"),
            move || {
                let client = cond_client.clone();
                let name = cond_name.clone();
                let namespace = cond_ns.clone();
                Box::pin(async move {
                    let pod = match get_namespaced::<core::Pod>(&client, &namespace, "Pod", &name)
                        .await
                    {
                        Ok(pod) => pod,
                        Err(e) if e.is_not_found() => return Ok(false),
                        Err(e) => return Err(e),
                    };

                    let started = pod
                        .status
                        .and_then(|s| s.container_statuses)
                        .is_some_and(|statuses| {
                            !statuses.is_empty()
                                && statuses.iter().all(|cs| {
                                    cs.state.as_ref().is_some_and(|state| {
                                        state.running.is_some() || state.terminated.is_some()
                                    })
                                })
                        });
                    Ok(started)
                })
            },
        );

        wait::wait_for_condition(&mut cond, timeout, wait::DEFAULT_INTERVAL, false).await?;
        self.refresh(client).await.map_err(|e| WaitError::Api {
            name: cond.name().to_string(),
            source: e,
        })
    }
}

impl ResourceOps for Pod {
    fn kind(&self) -> Kind {
        Kind::Pod
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
        self.obj = create_namespaced(client, &ns, "Pod", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        delete_namespaced::<core::Pod>(client, &ns, "Pod", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let (name, ns) = self.identity()?;
        self.obj = get_namespaced(client, &ns, "Pod", &name).await?;
        Ok(())
    }

    /// Ready when the pod is Running and every container status reports
    /// ready. A pod with no container statuses yet is not ready.
    fn is_ready(&self) -> bool {
        if self.phase() != Some("Running") {
            return false;
        }

        self.status()
            .and_then(|s| s.container_statuses.as_ref())
            .is_some_and(|statuses| !statuses.is_empty() && statuses.iter().all(|cs| cs.ready))
    }
}
