//! Typed wrappers around Kubernetes API objects
//!
//! Each supported resource kind gets a thin wrapper that owns the full
//! typed document (desired spec plus, after create/refresh, the live
//! observed state) and implements the shared [`ResourceOps`] capability
//! contract: create, delete (idempotent on absence), refresh, and a
//! defensive readiness predicate. The closed [`ApiObject`] enum tags the
//! set of supported kinds and dispatches every operation by match, so
//! manifest loading resolves a concrete variant up front instead of
//! falling back to dynamic typing.

mod api_object;
mod clusterrolebinding;
mod configmap;
mod container;
mod deployment;
mod namespace;
mod node;
mod pod;
mod rolebinding;
mod secret;
mod service;

pub use api_object::{ApiObject, ObjectError, ResourceOps};
pub(crate) use api_object::list_namespaced;
pub use clusterrolebinding::ClusterRoleBinding;
pub use configmap::ConfigMap;
pub use container::Container;
pub use deployment::Deployment;
pub use namespace::Namespace;
pub use node::Node;
pub use pod::Pod;
pub use rolebinding::RoleBinding;
pub use secret::Secret;
pub use service::Service;

use std::fmt;

/// Tag identifying a supported resource kind.
///
/// The variant order is load-bearing: it is the registry's bucket order
/// and therefore the order objects are applied to the cluster. RBAC comes
/// before the workloads that need those permissions, Services before the
/// Deployments that may reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Namespace,
    RoleBinding,
    ClusterRoleBinding,
    Secret,
    Service,
    ConfigMap,
    Deployment,
    Pod,
    Node,
}

impl Kind {
    /// The canonical manifest `kind` string.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Namespace => "Namespace",
            Kind::RoleBinding => "RoleBinding",
            Kind::ClusterRoleBinding => "ClusterRoleBinding",
            Kind::Secret => "Secret",
            Kind::Service => "Service",
            Kind::ConfigMap => "ConfigMap",
            Kind::Deployment => "Deployment",
            Kind::Pod => "Pod",
            Kind::Node => "Node",
        }
    }

    /// Resolve a manifest `kind` string, `None` if the kind is unsupported.
    pub fn from_manifest(kind: &str) -> Option<Kind> {
        match kind {
            "Namespace" => Some(Kind::Namespace),
            "RoleBinding" => Some(Kind::RoleBinding),
            "ClusterRoleBinding" => Some(Kind::ClusterRoleBinding),
            "Secret" => Some(Kind::Secret),
            "Service" => Some(Kind::Service),
            "ConfigMap" => Some(Kind::ConfigMap),
            "Deployment" => Some(Kind::Deployment),
            "Pod" => Some(Kind::Pod),
            "Node" => Some(Kind::Node),
            _ => None,
        }
    }

    /// Whether objects of this kind live outside any namespace.
    pub fn is_cluster_scoped(self) -> bool {
        matches!(
            self,
            Kind::Namespace | Kind::ClusterRoleBinding | Kind::Node
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ordering_is_apply_order() {
        let mut kinds = vec![
            Kind::Pod,
            Kind::Namespace,
            Kind::Deployment,
            Kind::Secret,
            Kind::ClusterRoleBinding,
            Kind::ConfigMap,
            Kind::RoleBinding,
            Kind::Service,
        ];
        kinds.sort();

        assert_eq!(
            kinds,
            vec![
                Kind::Namespace,
                Kind::RoleBinding,
                Kind::ClusterRoleBinding,
                Kind::Secret,
                Kind::Service,
                Kind::ConfigMap,
                Kind::Deployment,
                Kind::Pod,
            ]
        );
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            Kind::Namespace,
            Kind::RoleBinding,
            Kind::ClusterRoleBinding,
            Kind::Secret,
            Kind::Service,
            Kind::ConfigMap,
            Kind::Deployment,
            Kind::Pod,
            Kind::Node,
        ] {
            assert_eq!(Kind::from_manifest(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_unsupported_kind() {
        assert_eq!(Kind::from_manifest("ServiceAccount"), None);
        assert_eq!(Kind::from_manifest("StatefulSet"), None);
    }

    #[test]
    fn test_cluster_scope() {
        assert!(Kind::Namespace.is_cluster_scoped());
        assert!(Kind::ClusterRoleBinding.is_cluster_scoped());
        assert!(Kind::Node.is_cluster_scoped());
        assert!(!Kind::RoleBinding.is_cluster_scoped());
        assert!(!Kind::Deployment.is_cluster_scoped());
    }
}
