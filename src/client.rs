//! The per-test cluster facade
//!
//! A [`TestClient`] wraps one test case's view of the cluster: it owns
//! the test namespace lifecycle, the registry of managed objects, and
//! the setup/teardown flow around the test body. Connection state comes
//! in explicitly via `new`; nothing here reads ambient globals.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::directives::TestDirective;
use crate::manifest::{self, ManifestError};
use crate::meta::TestMeta;
use crate::objects::{
    list_namespaced, ApiObject, ConfigMap, Deployment, Kind, Namespace, Node, ObjectError, Pod,
    ResourceOps, Secret, Service,
};
use crate::rbac;
use crate::utils;
use crate::wait::{self, WaitError};
use crate::Condition;

/// Errors from the test lifecycle around the test body.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Rbac(#[from] rbac::RbacError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("no test namespace available for namespaced directive")]
    NoNamespace,

    #[error("namespace creation is disabled but no existing namespace name was given")]
    NamespaceRequired,
}

/// Namespace behavior for a test case.
#[derive(Debug, Clone)]
pub struct NamespaceOptions {
    /// Create (and later delete) the namespace. When false the test runs
    /// against an existing namespace and leaves it in place.
    pub create: bool,
    /// Explicit namespace name; `None` generates a unique one from the
    /// test name.
    pub name: Option<String>,
}

impl Default for NamespaceOptions {
    fn default() -> Self {
        Self {
            create: true,
            name: None,
        }
    }
}

/// Options controlling one test case's lifecycle.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub namespace: NamespaceOptions,
    /// Container log lines captured on failure: `0` disables capture,
    /// `-1` captures everything. Usually copied from
    /// [`TestConfig`](crate::TestConfig).
    pub error_log_lines: i64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            namespace: NamespaceOptions::default(),
            error_log_lines: 50,
        }
    }
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One test case's handle to the cluster.
pub struct TestClient {
    client: Client,
    test_name: String,
    options: TestOptions,
    /// Registry of every object this test manages.
    pub meta: TestMeta,
    created_namespace: bool,
}

impl TestClient {
    pub fn new(client: Client, test_name: impl Into<String>, options: TestOptions) -> Self {
        let test_name = test_name.into();
        Self {
            client,
            meta: TestMeta::new(test_name.clone()),
            test_name,
            options,
            created_namespace: false,
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// The test namespace, once setup has assigned one.
    pub fn namespace(&self) -> Option<&str> {
        self.meta.namespace.as_deref()
    }

    /// The underlying cluster client, for operations the facade does not
    /// cover.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Prepare the cluster for this test: assign the namespace,
    /// materialize every directive into registered objects, then create
    /// everything in apply order. Any failure aborts setup; teardown is
    /// still safe to run afterwards.
    pub async fn setup(&mut self, directives: &[TestDirective]) -> Result<(), ClientError> {
        let namespace = match (&self.options.namespace.name, self.options.namespace.create) {
            (Some(name), _) => name.clone(),
            (None, true) => utils::new_namespace(&self.test_name),
            // A generated name with creation disabled would point every
            // namespaced object at a namespace that never exists.
            (None, false) => return Err(ClientError::NamespaceRequired),
        };
        self.meta.namespace = Some(namespace.clone());

        info!(test = %self.test_name, namespace = %namespace, "setting up test");

        if self.options.namespace.create {
            self.meta
                .register(ApiObject::Namespace(Namespace::named(&namespace)));
            self.created_namespace = true;
        }

        for directive in directives {
            for obj in self.materialize(directive, &namespace)? {
                self.meta.register(obj);
            }
        }

        for obj in self.meta.ordered_mut() {
            obj.create(&self.client, Some(&namespace)).await?;
        }

        Ok(())
    }

    /// Turn one directive into the objects it describes. Nothing touches
    /// the cluster here; that happens in apply order afterwards.
    fn materialize(
        &self,
        directive: &TestDirective,
        namespace: &str,
    ) -> Result<Vec<ApiObject>, ClientError> {
        let objects = match directive {
            TestDirective::ApplyManifestFile(path) => manifest::load_file(path)?,
            TestDirective::ApplyManifests { dir, files } => {
                manifest::load_path(dir, files.as_deref())?
            }
            TestDirective::ClusterRoleBinding { role, subject } => {
                vec![ApiObject::ClusterRoleBinding(
                    rbac::new_cluster_role_binding(&self.test_name, role, subject.clone()),
                )]
            }
            TestDirective::RoleBinding {
                role_kind,
                role,
                subject,
            } => vec![ApiObject::RoleBinding(rbac::new_role_binding(
                &self.test_name,
                namespace,
                *role_kind,
                role,
                subject.clone(),
            ))],
        };
        Ok(objects)
    }

    /// Clean up after the test body. Every step is attempted even when an
    /// earlier one fails; failures surface as warnings, never as errors,
    /// so cleanup problems cannot mask the test result.
    pub async fn teardown(&mut self, test_failed: bool) {
        info!(test = %self.test_name, failed = test_failed, "tearing down test");

        if test_failed && self.options.error_log_lines != 0 {
            let report = self.collect_diagnostics(self.options.error_log_lines).await;
            // The report goes to test output directly; multi-line text
            // does not fit a structured log field.
            eprintln!("{report}");
        }

        // Cluster-scoped bindings do not ride the namespace cascade.
        for obj in self.meta.ordered_mut() {
            if obj.kind() != Kind::ClusterRoleBinding {
                continue;
            }
            if let Err(e) = obj.delete(&self.client, None).await {
                warn!(
                    name = obj.name().unwrap_or("<unnamed>"),
                    error = %e,
                    "failed to delete cluster role binding during teardown",
                );
            }
        }

        if self.created_namespace {
            if let Some(ns) = self.meta.namespace.clone() {
                let mut namespace = Namespace::named(&ns);
                match namespace.delete(&self.client, None).await {
                    // Deletion is accepted here and cascades server-side.
                    Ok(()) => debug!(namespace = %ns, "namespace deletion accepted"),
                    Err(e) => {
                        warn!(namespace = %ns, error = %e, "failed to delete test namespace")
                    }
                }
            }
        }

        if self.meta.node_tainted {
            warn!(
                test = %self.test_name,
                "test tainted a node; cluster state may outlive the namespace",
            );
        }
    }

    /// Gather container logs and events from the test namespace for a
    /// failure report. Everything is best-effort: an unreachable pod
    /// contributes a warning, not a failure.
    pub async fn collect_diagnostics(&self, max_lines: i64) -> Diagnostics {
        let Some(namespace) = self.namespace() else {
            return Diagnostics::default();
        };
        let mut diag = Diagnostics::new(namespace);
        let tail_lines = (max_lines > 0).then_some(max_lines);

        match self.get_pods(None).await {
            Ok(pods) => {
                for pod in &pods {
                    for container in pod.get_containers() {
                        match container.logs(&self.client, tail_lines).await {
                            Ok(logs) => diag.add_container_logs(
                                container.pod_name(),
                                container.name(),
                                logs,
                            ),
                            Err(e) => warn!(
                                pod = container.pod_name(),
                                container = container.name(),
                                error = %e,
                                "failed to capture container logs",
                            ),
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to list pods for diagnostics"),
        }

        let events: Api<core::Event> = Api::namespaced(self.client.clone(), namespace);
        match events.list(&ListParams::default()).await {
            Ok(list) => diag.events = list.items,
            Err(e) => warn!(error = %e, "failed to list events for diagnostics"),
        }

        diag
    }

    /// Create an object on the cluster, defaulting its namespace to the
    /// test namespace. The object is not registered for teardown; use
    /// [`TestMeta::register`] for that.
    pub async fn create(&self, obj: &mut ApiObject) -> Result<(), ClientError> {
        obj.create(&self.client, self.namespace()).await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        obj: &mut ApiObject,
        options: Option<DeleteParams>,
    ) -> Result<(), ClientError> {
        obj.delete(&self.client, options).await?;
        Ok(())
    }

    pub async fn refresh(&self, obj: &mut ApiObject) -> Result<(), ClientError> {
        obj.refresh(&self.client).await?;
        Ok(())
    }

    /// Wait until every registered object exists and is ready.
    pub async fn wait_until_created(&self, timeout: Duration) -> Result<(), ClientError> {
        self.meta.wait_for_registered(&self.client, timeout).await?;
        Ok(())
    }

    fn require_namespace(&self) -> Result<&str, ClientError> {
        self.namespace().ok_or(ClientError::NoNamespace)
    }

    fn selector(labels: Option<&BTreeMap<String, String>>) -> Option<String> {
        labels.map(utils::selector_string)
    }

    /// Pods in the test namespace, optionally filtered by labels.
    pub async fn get_pods(
        &self,
        labels: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Pod>, ClientError> {
        let ns = self.require_namespace()?;
        let selector = Self::selector(labels);
        let items =
            list_namespaced::<core::Pod>(&self.client, ns, "Pod", selector.as_deref()).await?;
        Ok(items.into_iter().map(Pod::wrap).collect())
    }

    /// Deployments in the test namespace, optionally filtered by labels.
    pub async fn get_deployments(
        &self,
        labels: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Deployment>, ClientError> {
        let ns = self.require_namespace()?;
        let selector = Self::selector(labels);
        let items =
            list_namespaced::<apps::Deployment>(&self.client, ns, "Deployment", selector.as_deref())
                .await?;
        Ok(items.into_iter().map(Deployment::wrap).collect())
    }

    /// Services in the test namespace, optionally filtered by labels.
    pub async fn get_services(
        &self,
        labels: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Service>, ClientError> {
        let ns = self.require_namespace()?;
        let selector = Self::selector(labels);
        let items =
            list_namespaced::<core::Service>(&self.client, ns, "Service", selector.as_deref())
                .await?;
        Ok(items.into_iter().map(Service::wrap).collect())
    }

    /// Config maps in the test namespace, optionally filtered by labels.
    pub async fn get_configmaps(
        &self,
        labels: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<ConfigMap>, ClientError> {
        let ns = self.require_namespace()?;
        let selector = Self::selector(labels);
        let items =
            list_namespaced::<core::ConfigMap>(&self.client, ns, "ConfigMap", selector.as_deref())
                .await?;
        Ok(items.into_iter().map(ConfigMap::wrap).collect())
    }

    /// Secrets in the test namespace, optionally filtered by labels.
    pub async fn get_secrets(
        &self,
        labels: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Secret>, ClientError> {
        let ns = self.require_namespace()?;
        let selector = Self::selector(labels);
        let items =
            list_namespaced::<core::Secret>(&self.client, ns, "Secret", selector.as_deref())
                .await?;
        Ok(items.into_iter().map(Secret::wrap).collect())
    }

    /// All nodes in the cluster.
    pub async fn get_nodes(&self) -> Result<Vec<Node>, ClientError> {
        let api: Api<core::Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ObjectError::from_kube(e, "Node", "<list>"))?;
        Ok(list.items.into_iter().map(Node::wrap).collect())
    }

    /// Wait until at least `count` nodes report ready.
    pub async fn wait_for_ready_nodes(
        &self,
        count: usize,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let client = self.client.clone();
        let mut cond = Condition::new(format!("at least {count} nodes ready"), move || {
            let client = client.clone();
            Box::pin(async move {
                let api: Api<core::Node> = Api::all(client);
                let list = api
                    .list(&ListParams::default())
                    .await
                    .map_err(|e| ObjectError::from_kube(e, "Node", "<list>"))?;
                let ready = list
                    .items
                    .into_iter()
                    .map(Node::wrap)
                    .filter(Node::is_ready)
                    .count();
                Ok(ready >= count)
            })
        });

        wait::wait_for_condition(&mut cond, timeout, wait::DEFAULT_INTERVAL, false).await?;
        Ok(())
    }
}
