//! Declarative test-setup directives
//!
//! Instead of reflecting over test attributes, a test hands its
//! [`TestClient`](crate::TestClient) an explicit list of directives
//! describing what to materialize before the test body runs: manifests
//! to load and RBAC grants to install. The list is plain data, so
//! whatever runner glue sits above this crate can build it however it
//! likes.

use std::path::PathBuf;

use k8s_openapi::api::rbac::v1 as rbac;

use crate::rbac::RoleKind;

/// One setup step, applied in list order during
/// [`TestClient::setup`](crate::TestClient::setup).
#[derive(Debug, Clone)]
pub enum TestDirective {
    /// Load every object from one manifest file into the test namespace.
    ApplyManifestFile(PathBuf),

    /// Load objects from YAML files in a directory, in sorted file-name
    /// order. `files` restricts the load to the named files.
    ApplyManifests {
        dir: PathBuf,
        files: Option<Vec<String>>,
    },

    /// Grant a ClusterRole cluster-wide for the duration of the test.
    /// `None` subject means the default broad groups.
    ClusterRoleBinding {
        role: String,
        subject: Option<rbac::Subject>,
    },

    /// Grant a Role or ClusterRole within the test namespace.
    RoleBinding {
        role_kind: RoleKind,
        role: String,
        subject: Option<rbac::Subject>,
    },
}

impl TestDirective {
    /// Shorthand for applying one manifest file.
    pub fn manifest_file(path: impl Into<PathBuf>) -> Self {
        TestDirective::ApplyManifestFile(path.into())
    }

    /// Shorthand for applying a whole manifest directory.
    pub fn manifest_dir(dir: impl Into<PathBuf>) -> Self {
        TestDirective::ApplyManifests {
            dir: dir.into(),
            files: None,
        }
    }

    /// Shorthand for a default-subject cluster role binding.
    pub fn cluster_role_binding(role: impl Into<String>) -> Self {
        TestDirective::ClusterRoleBinding {
            role: role.into(),
            subject: None,
        }
    }

    /// Shorthand for a default-subject role binding.
    pub fn role_binding(role_kind: RoleKind, role: impl Into<String>) -> Self {
        TestDirective::RoleBinding {
            role_kind,
            role: role.into(),
            subject: None,
        }
    }
}
