//! YAML manifest loading into the typed object model
//!
//! Manifests are parsed document by document (multi-document files are
//! fine), the `kind` field selects the typed deserialization, and each
//! document becomes an [`ApiObject`]. Unrecognized kinds are a distinct
//! error rather than a silent skip so a typo in a fixture fails the test
//! that relies on it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::objects::{
    ApiObject, ClusterRoleBinding, ConfigMap, Deployment, Kind, Namespace, Node, Pod, RoleBinding,
    Secret, Service,
};

/// Errors from loading and decoding manifest files.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("manifest document has no `kind` field")]
    MissingKind,

    #[error("unsupported manifest kind `{0}`")]
    UnsupportedKind(String),

    #[error("{kind} manifest has no metadata.name")]
    MissingName { kind: Kind },

    #[error("failed to decode {kind} manifest: {source}")]
    Decode {
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse every document in a YAML string into objects.
pub fn load_str(content: &str) -> Result<Vec<ApiObject>, ManifestError> {
    let mut objects = Vec::new();

    for doc in serde_yaml::Deserializer::from_str(content) {
        let value = serde_json::Value::deserialize(doc)?;
        if value.is_null() {
            // Empty document, e.g. a trailing `---`.
            continue;
        }
        objects.push(from_value(value)?);
    }

    Ok(objects)
}

/// Load all objects from one manifest file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<ApiObject>, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loading manifest file");
    load_str(&content)
}

/// Load objects from every YAML file in a directory, in sorted file-name
/// order. When `files` is given, only those file names are loaded (still
/// sorted); a named file that is missing from the directory is an IO
/// error, not a silent skip.
pub fn load_path(
    dir: impl AsRef<Path>,
    files: Option<&[String]>,
) -> Result<Vec<ApiObject>, ManifestError> {
    let dir = dir.as_ref();

    let mut paths: Vec<PathBuf> = match files {
        Some(names) => names.iter().map(|n| dir.join(n)).collect(),
        None => {
            let entries = fs::read_dir(dir).map_err(|source| ManifestError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
                })
                .collect()
        }
    };
    paths.sort();

    let mut objects = Vec::new();
    for path in paths {
        objects.extend(load_file(&path)?);
    }
    Ok(objects)
}

/// Decode one loose manifest document into a typed object.
fn from_value(value: serde_json::Value) -> Result<ApiObject, ManifestError> {
    let kind_str = value
        .get("kind")
        .and_then(|k| k.as_str())
        .ok_or(ManifestError::MissingKind)?;

    let kind = Kind::from_manifest(kind_str)
        .ok_or_else(|| ManifestError::UnsupportedKind(kind_str.to_string()))?;

    let decode = |source| ManifestError::Decode { kind, source };
    let obj = match kind {
        Kind::Namespace => ApiObject::Namespace(Namespace::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::RoleBinding => ApiObject::RoleBinding(RoleBinding::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::ClusterRoleBinding => ApiObject::ClusterRoleBinding(ClusterRoleBinding::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::Secret => {
            ApiObject::Secret(Secret::wrap(serde_json::from_value(value).map_err(decode)?))
        }
        Kind::Service => ApiObject::Service(Service::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::ConfigMap => ApiObject::ConfigMap(ConfigMap::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::Deployment => ApiObject::Deployment(Deployment::wrap(
            serde_json::from_value(value).map_err(decode)?,
        )),
        Kind::Pod => ApiObject::Pod(Pod::wrap(serde_json::from_value(value).map_err(decode)?)),
        Kind::Node => ApiObject::Node(Node::wrap(serde_json::from_value(value).map_err(decode)?)),
    };

    if obj.name().is_none_or(str::is_empty) {
        return Err(ManifestError::MissingName { kind });
    }

    Ok(obj)
}
