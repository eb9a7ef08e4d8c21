//! The shared capability contract for object wrappers
//!
//! [`ResourceOps`] is the uniform surface every wrapper implements;
//! [`ApiObject`] is the closed tagged union over the supported kinds,
//! dispatching each operation to the concrete wrapper by match. The
//! generic CRUD helpers at the bottom keep the per-kind implementations
//! thin: each kind only decides its scope, its readiness predicate, and
//! any kind-specific extensions.

use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::api::rbac::v1 as rbac;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::{ClusterResourceScope, NamespaceResourceScope};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    ClusterRoleBinding, ConfigMap, Deployment, Kind, Namespace, Node, Pod, RoleBinding, Secret,
    Service,
};
use crate::condition::Condition;
use crate::wait::{self, WaitError};

/// Errors from object operations against the cluster API.
///
/// HTTP status codes from the API server are mapped onto the named
/// variants so tests can assert on the failure class instead of string
/// matching; anything else stays a transparent `kube::Error`.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    Conflict { kind: &'static str, name: String },

    #[error("{kind} '{name}': permission denied (check RBAC)")]
    Forbidden { kind: &'static str, name: String },

    #[error("{kind} '{name}': invalid specification: {message}")]
    Invalid {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error("{kind} has no metadata.name set")]
    MissingName { kind: &'static str },

    #[error("{kind} '{name}' has no namespace assigned")]
    MissingNamespace { kind: &'static str, name: String },

    #[error("failed to build proxy request: {0}")]
    Proxy(String),

    #[error("kubernetes api error: {0}")]
    Api(#[from] kube::Error),
}

impl ObjectError {
    /// Map a raw kube error onto the taxonomy, keeping the resource
    /// identity for readable messages.
    pub(crate) fn from_kube(err: kube::Error, kind: &'static str, name: &str) -> Self {
        if let kube::Error::Api(resp) = &err {
            let name = name.to_string();
            match resp.code {
                404 => return ObjectError::NotFound { kind, name },
                409 => return ObjectError::Conflict { kind, name },
                403 => return ObjectError::Forbidden { kind, name },
                422 => {
                    return ObjectError::Invalid {
                        kind,
                        name,
                        message: resp.message.clone(),
                    }
                }
                _ => {}
            }
        }
        ObjectError::Api(err)
    }

    /// Whether this error represents an absent object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectError::NotFound { .. })
    }
}

/// The uniform operation set implemented by every object wrapper.
///
/// `create` transitions a wrapper from "defined" (manifest-loaded) to
/// live: on success the returned server document replaces the wrapper's
/// state wholesale. `refresh` does the same from a read. `delete` is
/// idempotent — an already-absent object is success, so teardown can run
/// twice without error. `is_ready` is a pure predicate over the last
/// observed state and must never error on missing status fields.
#[allow(async_fn_in_trait)]
pub trait ResourceOps {
    /// The kind tag for this wrapper.
    fn kind(&self) -> Kind;

    /// `metadata.name`, if set.
    fn name(&self) -> Option<&str>;

    /// `metadata.namespace`; always `None` for cluster-scoped kinds.
    fn namespace(&self) -> Option<&str>;

    /// Assign a namespace if the object does not already have one.
    /// Cluster-scoped kinds ignore this.
    fn set_namespace(&mut self, namespace: &str);

    /// Create the object on the cluster. For namespaced kinds the
    /// `namespace` argument fills in `metadata.namespace` only when the
    /// manifest left it unset; cluster-scoped kinds ignore it.
    async fn create(&mut self, client: &Client, namespace: Option<&str>)
        -> Result<(), ObjectError>;

    /// Delete the object. Absence is treated as success.
    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError>;

    /// Re-fetch live state, overwriting the stored document.
    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError>;

    /// Kind-specific readiness over the last observed state. Stale or
    /// missing status means not ready, never an error.
    fn is_ready(&self) -> bool;
}

/// A tagged union over the supported resource kinds.
///
/// This is what the manifest loader produces and what the registry
/// buckets; it implements the full [`ResourceOps`] surface by delegating
/// to the wrapped concrete type.
#[derive(Debug, Clone)]
pub enum ApiObject {
    Namespace(Namespace),
    RoleBinding(RoleBinding),
    ClusterRoleBinding(ClusterRoleBinding),
    Secret(Secret),
    Service(Service),
    ConfigMap(ConfigMap),
    Deployment(Deployment),
    Pod(Pod),
    Node(Node),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            ApiObject::Namespace($inner) => $body,
            ApiObject::RoleBinding($inner) => $body,
            ApiObject::ClusterRoleBinding($inner) => $body,
            ApiObject::Secret($inner) => $body,
            ApiObject::Service($inner) => $body,
            ApiObject::ConfigMap($inner) => $body,
            ApiObject::Deployment($inner) => $body,
            ApiObject::Pod($inner) => $body,
            ApiObject::Node($inner) => $body,
        }
    };
}

impl ApiObject {
    pub fn kind(&self) -> Kind {
        dispatch!(self, o => o.kind())
    }

    pub fn name(&self) -> Option<&str> {
        dispatch!(self, o => o.name())
    }

    pub fn namespace(&self) -> Option<&str> {
        dispatch!(self, o => o.namespace())
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        dispatch!(self, o => o.set_namespace(namespace));
    }

    pub async fn create(
        &mut self,
        client: &Client,
        namespace: Option<&str>,
    ) -> Result<(), ObjectError> {
        dispatch!(self, o => o.create(client, namespace).await)
    }

    pub async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        dispatch!(self, o => o.delete(client, options).await)
    }

    pub async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        dispatch!(self, o => o.refresh(client).await)
    }

    pub fn is_ready(&self) -> bool {
        dispatch!(self, o => o.is_ready())
    }

    /// The kind-specific status sub-document as loose JSON, for
    /// assertions that do not need the typed accessors on the concrete
    /// wrapper. `None` when no status has been observed yet.
    pub fn status(&self) -> Option<serde_json::Value> {
        let value = match self {
            ApiObject::Namespace(o) => serde_json::to_value(o.obj.status.as_ref()?),
            ApiObject::RoleBinding(_) | ApiObject::ClusterRoleBinding(_) => return None,
            ApiObject::Secret(_) | ApiObject::ConfigMap(_) => return None,
            ApiObject::Service(o) => serde_json::to_value(o.obj.status.as_ref()?),
            ApiObject::Deployment(o) => serde_json::to_value(o.obj.status.as_ref()?),
            ApiObject::Pod(o) => serde_json::to_value(o.obj.status.as_ref()?),
            ApiObject::Node(o) => serde_json::to_value(o.obj.status.as_ref()?),
        };
        value.ok()
    }

    /// A condition that holds once the object exists on the cluster and
    /// its readiness predicate passes against freshly fetched state.
    ///
    /// The condition captures the object's identity by value, so it stays
    /// valid independent of the wrapper it was derived from.
    pub fn ready_condition(&self, client: &Client) -> Condition {
        let kind = self.kind();
        let name = self.name().unwrap_or_default().to_string();
        let namespace = self.namespace().map(str::to_string);
        let client = client.clone();
        let desc = match &namespace {
            Some(ns) => format!("{kind} '{ns}/{name}' ready"),
            None => format!("{kind} '{name}' ready"),
        };

        Condition::new(desc, move || {
            let client = client.clone();
            let name = name.clone();
            let namespace = namespace.clone();
            Box::pin(async move {
                match fetch_ready(&client, kind, &name, namespace.as_deref()).await {
                    Ok(ready) => Ok(ready),
                    Err(e) if e.is_not_found() => Ok(false),
                    Err(e) => Err(e),
                }
            })
        })
    }

    /// A condition that holds once the object is gone from the cluster.
    pub fn deleted_condition(&self, client: &Client) -> Condition {
        let kind = self.kind();
        let name = self.name().unwrap_or_default().to_string();
        let namespace = self.namespace().map(str::to_string);
        let client = client.clone();
        let desc = match &namespace {
            Some(ns) => format!("{kind} '{ns}/{name}' deleted"),
            None => format!("{kind} '{name}' deleted"),
        };

        Condition::new(desc, move || {
            let client = client.clone();
            let name = name.clone();
            let namespace = namespace.clone();
            Box::pin(async move {
                match exists(&client, kind, &name, namespace.as_deref()).await {
                    Ok(found) => Ok(!found),
                    Err(e) => Err(e),
                }
            })
        })
    }

    /// Poll until the object exists and is ready, then refresh the
    /// wrapper so the caller sees the state that satisfied the wait.
    pub async fn wait_until_ready(
        &mut self,
        client: &Client,
        timeout: std::time::Duration,
    ) -> Result<(), WaitError> {
        let mut cond = self.ready_condition(client);
        wait::wait_for_condition(&mut cond, timeout, wait::DEFAULT_INTERVAL, false).await?;

        if let Err(e) = self.refresh(client).await {
            // The object passed its readiness check moments ago; a
            // refresh failure here is a real API problem worth surfacing.
            return Err(WaitError::Api {
                name: cond.name().to_string(),
                source: e,
            });
        }
        Ok(())
    }

    /// Poll until the object no longer exists. Unlike readiness waits,
    /// API errors during the check propagate immediately — an error
    /// other than "not found" says nothing about deletion progress.
    pub async fn wait_until_deleted(
        &self,
        client: &Client,
        timeout: std::time::Duration,
    ) -> Result<(), WaitError> {
        let mut cond = self.deleted_condition(client);
        wait::wait_for_condition(&mut cond, timeout, wait::DEFAULT_INTERVAL, true).await
    }
}

/// Fetch the object fresh and evaluate its readiness predicate.
async fn fetch_ready(
    client: &Client,
    kind: Kind,
    name: &str,
    namespace: Option<&str>,
) -> Result<bool, ObjectError> {
    let ns = |kind: Kind| -> Result<&str, ObjectError> {
        namespace.ok_or_else(|| ObjectError::MissingNamespace {
            kind: kind.as_str(),
            name: name.to_string(),
        })
    };

    let ready = match kind {
        Kind::Namespace => {
            Namespace::wrap(get_cluster::<core::Namespace>(client, "Namespace", name).await?)
                .is_ready()
        }
        Kind::RoleBinding => RoleBinding::wrap(
            get_namespaced::<rbac::RoleBinding>(client, ns(kind)?, "RoleBinding", name).await?,
        )
        .is_ready(),
        Kind::ClusterRoleBinding => ClusterRoleBinding::wrap(
            get_cluster::<rbac::ClusterRoleBinding>(client, "ClusterRoleBinding", name).await?,
        )
        .is_ready(),
        Kind::Secret => {
            Secret::wrap(get_namespaced::<core::Secret>(client, ns(kind)?, "Secret", name).await?)
                .is_ready()
        }
        Kind::Service => Service::wrap(
            get_namespaced::<core::Service>(client, ns(kind)?, "Service", name).await?,
        )
        .is_ready(),
        Kind::ConfigMap => ConfigMap::wrap(
            get_namespaced::<core::ConfigMap>(client, ns(kind)?, "ConfigMap", name).await?,
        )
        .is_ready(),
        Kind::Deployment => Deployment::wrap(
            get_namespaced::<apps::Deployment>(client, ns(kind)?, "Deployment", name).await?,
        )
        .is_ready(),
        Kind::Pod => {
            Pod::wrap(get_namespaced::<core::Pod>(client, ns(kind)?, "Pod", name).await?).is_ready()
        }
        Kind::Node => {
            Node::wrap(get_cluster::<core::Node>(client, "Node", name).await?).is_ready()
        }
    };

    Ok(ready)
}

/// Whether the object currently exists on the cluster.
async fn exists(
    client: &Client,
    kind: Kind,
    name: &str,
    namespace: Option<&str>,
) -> Result<bool, ObjectError> {
    match fetch_ready(client, kind, name, namespace).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

// ---- generic CRUD helpers shared by the per-kind wrappers ----

pub(crate) async fn create_namespaced<K>(
    client: &Client,
    namespace: &str,
    kind: &'static str,
    obj: &K,
) -> Result<K, ObjectError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + std::fmt::Debug,
    K::DynamicType: Default,
{
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or(ObjectError::MissingName { kind })?;

    info!(kind, name = %name, namespace = %namespace, "creating object");

    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.create(&PostParams::default(), obj)
        .await
        .map_err(|e| ObjectError::from_kube(e, kind, &name))
}

pub(crate) async fn create_cluster<K>(
    client: &Client,
    kind: &'static str,
    obj: &K,
) -> Result<K, ObjectError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Serialize + std::fmt::Debug,
    K::DynamicType: Default,
{
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or(ObjectError::MissingName { kind })?;

    info!(kind, name = %name, "creating cluster-scoped object");

    let api: Api<K> = Api::all(client.clone());
    api.create(&PostParams::default(), obj)
        .await
        .map_err(|e| ObjectError::from_kube(e, kind, &name))
}

pub(crate) async fn get_namespaced<K>(
    client: &Client,
    namespace: &str,
    kind: &'static str,
    name: &str,
) -> Result<K, ObjectError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.get(name)
        .await
        .map_err(|e| ObjectError::from_kube(e, kind, name))
}

pub(crate) async fn get_cluster<K>(
    client: &Client,
    kind: &'static str,
    name: &str,
) -> Result<K, ObjectError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    api.get(name)
        .await
        .map_err(|e| ObjectError::from_kube(e, kind, name))
}

/// Namespaced delete, treating an already-absent object as success.
pub(crate) async fn delete_namespaced<K>(
    client: &Client,
    namespace: &str,
    kind: &'static str,
    name: &str,
    options: Option<DeleteParams>,
) -> Result<(), ObjectError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    match api.delete(name, &options.unwrap_or_default()).await {
        Ok(_) => {
            info!(kind, name = %name, namespace = %namespace, "deleted object");
            Ok(())
        }
        Err(e) => match ObjectError::from_kube(e, kind, name) {
            ObjectError::NotFound { .. } => {
                debug!(kind, name = %name, "object already absent, delete is a no-op");
                Ok(())
            }
            other => Err(other),
        },
    }
}

/// Cluster-scoped delete, treating an already-absent object as success.
pub(crate) async fn delete_cluster<K>(
    client: &Client,
    kind: &'static str,
    name: &str,
    options: Option<DeleteParams>,
) -> Result<(), ObjectError>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    match api.delete(name, &options.unwrap_or_default()).await {
        Ok(_) => {
            info!(kind, name = %name, "deleted cluster-scoped object");
            Ok(())
        }
        Err(e) => match ObjectError::from_kube(e, kind, name) {
            ObjectError::NotFound { .. } => {
                debug!(kind, name = %name, "object already absent, delete is a no-op");
                Ok(())
            }
            other => Err(other),
        },
    }
}

pub(crate) async fn list_namespaced<K>(
    client: &Client,
    namespace: &str,
    kind: &'static str,
    label_selector: Option<&str>,
) -> Result<Vec<K>, ObjectError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let mut params = ListParams::default();
    if let Some(selector) = label_selector {
        params = params.labels(selector);
    }

    let list = api
        .list(&params)
        .await
        .map_err(|e| ObjectError::from_kube(e, kind, "<list>"))?;
    Ok(list.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "test error".to_string(),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            ObjectError::from_kube(api_error(404), "Pod", "web"),
            ObjectError::NotFound { kind: "Pod", .. }
        ));
        assert!(matches!(
            ObjectError::from_kube(api_error(409), "Service", "web"),
            ObjectError::Conflict { .. }
        ));
        assert!(matches!(
            ObjectError::from_kube(api_error(403), "Secret", "token"),
            ObjectError::Forbidden { .. }
        ));
        assert!(matches!(
            ObjectError::from_kube(api_error(422), "Deployment", "web"),
            ObjectError::Invalid { .. }
        ));
        assert!(matches!(
            ObjectError::from_kube(api_error(500), "Pod", "web"),
            ObjectError::Api(_)
        ));
    }

    #[test]
    fn test_is_not_found() {
        let err = ObjectError::from_kube(api_error(404), "Pod", "web");
        assert!(err.is_not_found());

        let err = ObjectError::from_kube(api_error(409), "Pod", "web");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_api_object_dispatch() {
        let ns = ApiObject::Namespace(Namespace::named("kubetest-example"));
        assert_eq!(ns.kind(), Kind::Namespace);
        assert_eq!(ns.name(), Some("kubetest-example"));
        assert_eq!(ns.namespace(), None);
        // No observed state yet, so not ready.
        assert!(!ns.is_ready());
        assert!(ns.status().is_none());
    }

    #[test]
    fn test_set_namespace_ignored_for_cluster_scoped() {
        let mut ns = ApiObject::Namespace(Namespace::named("kubetest-example"));
        ns.set_namespace("other");
        assert_eq!(ns.namespace(), None);
    }

    // Mock transport for exercising the HTTP paths without a cluster.
    mod absent_delete {
        use super::*;
        use kube::client::Body;
        use tower_test::mock;

        fn not_found_body(plural: &str, name: &str) -> Body {
            Body::from(
                serde_json::to_vec(&serde_json::json!({
                    "kind": "Status",
                    "apiVersion": "v1",
                    "metadata": {},
                    "status": "Failure",
                    "message": format!("{plural} \"{name}\" not found"),
                    "reason": "NotFound",
                    "code": 404,
                }))
                .unwrap(),
            )
        }

        #[tokio::test]
        async fn test_delete_absent_namespaced_object_is_success() {
            let (service, mut handle) =
                mock::pair::<http::Request<Body>, http::Response<Body>>();
            tokio::spawn(async move {
                let (request, send) = handle.next_request().await.expect("service called");
                assert_eq!(request.method(), http::Method::DELETE);
                assert_eq!(
                    request.uri().path(),
                    "/api/v1/namespaces/kubetest-example/pods/web"
                );
                send.send_response(
                    http::Response::builder()
                        .status(404)
                        .body(not_found_body("pods", "web"))
                        .unwrap(),
                );
            });

            let client = Client::new(service, "kubetest-example");
            delete_namespaced::<core::Pod>(&client, "kubetest-example", "Pod", "web", None)
                .await
                .expect("deleting an absent object is a no-op");
        }

        #[tokio::test]
        async fn test_delete_absent_cluster_object_is_success() {
            let (service, mut handle) =
                mock::pair::<http::Request<Body>, http::Response<Body>>();
            tokio::spawn(async move {
                let (request, send) = handle.next_request().await.expect("service called");
                assert_eq!(request.method(), http::Method::DELETE);
                assert_eq!(
                    request.uri().path(),
                    "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings/kubetest-example"
                );
                send.send_response(
                    http::Response::builder()
                        .status(404)
                        .body(not_found_body("clusterrolebindings", "kubetest-example"))
                        .unwrap(),
                );
            });

            let client = Client::new(service, "default");
            delete_cluster::<rbac::ClusterRoleBinding>(
                &client,
                "ClusterRoleBinding",
                "kubetest-example",
                None,
            )
            .await
            .expect("deleting an absent object is a no-op");
        }

        #[tokio::test]
        async fn test_delete_other_error_propagates() {
            let (service, mut handle) =
                mock::pair::<http::Request<Body>, http::Response<Body>>();
            tokio::spawn(async move {
                let (_, send) = handle.next_request().await.expect("service called");
                send.send_response(
                    http::Response::builder()
                        .status(403)
                        .body(Body::from(
                            serde_json::to_vec(&serde_json::json!({
                                "kind": "Status",
                                "apiVersion": "v1",
                                "metadata": {},
                                "status": "Failure",
                                "message": "forbidden",
                                "reason": "Forbidden",
                                "code": 403,
                            }))
                            .unwrap(),
                        ))
                        .unwrap(),
                );
            });

            let client = Client::new(service, "kubetest-example");
            let err =
                delete_namespaced::<core::Pod>(&client, "kubetest-example", "Pod", "web", None)
                    .await
                    .unwrap_err();
            assert!(matches!(err, ObjectError::Forbidden { .. }));
        }
    }
}
