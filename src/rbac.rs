//! Construction of test RBAC bindings
//!
//! Tests that exercise permission-sensitive behavior get role bindings
//! named `kubetest:{test-name}` so leaked bindings are attributable. By
//! default a binding grants to the broad built-in groups; a custom
//! subject narrows that to one user, group, or service account.

use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::objects::{ClusterRoleBinding, RoleBinding};

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Errors from building RBAC bindings.
#[derive(Debug, thiserror::Error)]
pub enum RbacError {
    #[error("custom subject requires both kind and name (got kind: {kind:?}, name: {name:?})")]
    PartialSubject {
        kind: Option<String>,
        name: Option<String>,
    },

    #[error("unknown role kind `{0}` (expected Role or ClusterRole)")]
    UnknownRoleKind(String),
}

/// The kind of role a namespaced binding references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Role,
    ClusterRole,
}

impl RoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Role => "Role",
            RoleKind::ClusterRole => "ClusterRole",
        }
    }

    pub fn parse(s: &str) -> Result<Self, RbacError> {
        match s {
            "Role" => Ok(RoleKind::Role),
            "ClusterRole" => Ok(RoleKind::ClusterRole),
            other => Err(RbacError::UnknownRoleKind(other.to_string())),
        }
    }
}

/// Resolve an optional custom subject from its parts. Both parts must be
/// given together; a lone kind or lone name is an error rather than a
/// guess.
pub fn custom_subject(
    kind: Option<&str>,
    name: Option<&str>,
) -> Result<Option<rbac::Subject>, RbacError> {
    match (kind, name) {
        (Some(kind), Some(name)) => Ok(Some(rbac::Subject {
            api_group: Some(RBAC_API_GROUP.to_string()),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: None,
        })),
        (None, None) => Ok(None),
        (kind, name) => Err(RbacError::PartialSubject {
            kind: kind.map(str::to_string),
            name: name.map(str::to_string),
        }),
    }
}

/// The broad built-in groups a binding grants to when no custom subject
/// is given: all authenticated users, all unauthenticated users, and all
/// service accounts.
fn default_subjects() -> Vec<rbac::Subject> {
    [
        "system:authenticated",
        "system:unauthenticated",
        "system:serviceaccounts",
    ]
    .into_iter()
    .map(|name| rbac::Subject {
        api_group: Some(RBAC_API_GROUP.to_string()),
        kind: "Group".to_string(),
        name: name.to_string(),
        namespace: None,
    })
    .collect()
}

fn binding_name(test_name: &str) -> String {
    format!("kubetest:{test_name}")
}

/// Build a cluster role binding granting `role` (a ClusterRole) to the
/// given subject, or to the default groups.
pub fn new_cluster_role_binding(
    test_name: &str,
    role: &str,
    subject: Option<rbac::Subject>,
) -> ClusterRoleBinding {
    ClusterRoleBinding::wrap(rbac::ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(binding_name(test_name)),
            ..Default::default()
        },
        role_ref: rbac::RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: role.to_string(),
        },
        subjects: Some(subject.map_or_else(default_subjects, |s| vec![s])),
    })
}

/// Build a namespaced role binding granting `role` (a Role or a
/// ClusterRole, per `role_kind`) within `namespace`.
pub fn new_role_binding(
    test_name: &str,
    namespace: &str,
    role_kind: RoleKind,
    role: &str,
    subject: Option<rbac::Subject>,
) -> RoleBinding {
    RoleBinding::wrap(rbac::RoleBinding {
        metadata: ObjectMeta {
            name: Some(binding_name(test_name)),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        role_ref: rbac::RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: role_kind.as_str().to_string(),
            name: role.to_string(),
        },
        subjects: Some(subject.map_or_else(default_subjects, |s| vec![s])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ResourceOps;

    #[test]
    fn test_cluster_role_binding_defaults() {
        let crb = new_cluster_role_binding("test_rbac", "cluster-admin", None);
        assert_eq!(crb.name(), Some("kubetest:test_rbac"));
        assert_eq!(crb.obj.role_ref.kind, "ClusterRole");
        assert_eq!(crb.obj.role_ref.name, "cluster-admin");

        let subjects = crb.subjects();
        assert_eq!(subjects.len(), 3);
        assert!(subjects.iter().all(|s| s.kind == "Group"));
        assert!(subjects.iter().any(|s| s.name == "system:authenticated"));
        assert!(subjects.iter().any(|s| s.name == "system:serviceaccounts"));
    }

    #[test]
    fn test_role_binding_with_custom_subject() {
        let subject = custom_subject(Some("User"), Some("dev@example.com"))
            .unwrap()
            .unwrap();
        let rb = new_role_binding(
            "test_rbac",
            "kubetest-test-rbac",
            RoleKind::ClusterRole,
            "view",
            Some(subject),
        );
        assert_eq!(rb.name(), Some("kubetest:test_rbac"));
        assert_eq!(rb.namespace(), Some("kubetest-test-rbac"));
        assert_eq!(rb.obj.role_ref.kind, "ClusterRole");
        assert_eq!(rb.subjects().len(), 1);
        assert_eq!(rb.subjects()[0].name, "dev@example.com");
    }

    #[test]
    fn test_custom_subject_requires_both_parts() {
        assert!(custom_subject(None, None).unwrap().is_none());
        assert!(custom_subject(Some("User"), Some("x")).unwrap().is_some());
        assert!(matches!(
            custom_subject(Some("User"), None),
            Err(RbacError::PartialSubject { .. })
        ));
        assert!(matches!(
            custom_subject(None, Some("x")),
            Err(RbacError::PartialSubject { .. })
        ));
    }

    #[test]
    fn test_role_kind_parse() {
        assert_eq!(RoleKind::parse("Role").unwrap(), RoleKind::Role);
        assert_eq!(RoleKind::parse("ClusterRole").unwrap(), RoleKind::ClusterRole);
        assert!(matches!(
            RoleKind::parse("SuperRole"),
            Err(RbacError::UnknownRoleKind(_))
        ));
    }
}
