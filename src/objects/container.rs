//! Container view onto a pod's observed container statuses
//!
//! Containers are not first-class API resources; a `Container` is a
//! snapshot of one container's status together with enough pod identity
//! to fetch its logs. Refreshing the owning pod produces new snapshots.

use k8s_openapi::api::core::v1 as core;
use kube::Client;

use super::ObjectError;

/// One container within a pod, as last observed.
#[derive(Debug, Clone)]
pub struct Container {
    pod_name: String,
    namespace: String,
    pub status: core::ContainerStatus,
}

impl Container {
    pub(crate) fn new(pod_name: &str, namespace: &str, status: core::ContainerStatus) -> Self {
        Self {
            pod_name: pod_name.to_string(),
            namespace: namespace.to_string(),
            status,
        }
    }

    /// The container's name within the pod spec.
    pub fn name(&self) -> &str {
        &self.status.name
    }

    /// The name of the pod this container runs in.
    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    /// Whether the container passed its readiness check at last observation.
    pub fn is_ready(&self) -> bool {
        self.status.ready
    }

    /// Whether the container is still waiting to start.
    pub fn is_waiting(&self) -> bool {
        self.status
            .state
            .as_ref()
            .is_some_and(|s| s.waiting.is_some())
    }

    /// How many times this container has been restarted.
    pub fn restart_count(&self) -> i32 {
        self.status.restart_count
    }

    /// Fetch this container's logs from its pod.
    pub async fn logs(
        &self,
        client: &Client,
        tail_lines: Option<i64>,
    ) -> Result<String, ObjectError> {
        use kube::api::{Api, LogParams};

        let api: Api<core::Pod> = Api::namespaced(client.clone(), &self.namespace);
        let params = LogParams {
            container: Some(self.status.name.clone()),
            tail_lines,
            ..Default::default()
        };

        api.logs(&self.pod_name, &params)
            .await
            .map_err(|e| ObjectError::from_kube(e, "Pod", &self.pod_name))
    }
}
