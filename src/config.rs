//! Harness configuration and cluster resolution
//!
//! `TestConfig` carries everything the harness needs to reach a cluster:
//! an optional kubeconfig path, an optional context override, and the
//! in-cluster flag for tests running inside a pod. Configuration errors
//! are fatal before any test runs; there is no fallback chain beyond the
//! standard kubeconfig discovery.

use std::path::PathBuf;
use std::sync::OnceLock;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

/// Errors resolving cluster access from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("failed to load in-cluster configuration: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("failed to infer cluster configuration: {0}")]
    Infer(#[from] kube::config::InferConfigError),

    #[error("failed to build client: {0}")]
    Client(#[from] kube::Error),
}

/// How the harness connects to a cluster and behaves on failure.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Explicit kubeconfig path. `None` uses standard discovery
    /// (`KUBECONFIG`, then `~/.kube/config`).
    pub kubeconfig: Option<PathBuf>,
    /// Context to use; `None` means the kubeconfig's current context.
    pub context: Option<String>,
    /// Resolve credentials from the pod environment instead of a
    /// kubeconfig.
    pub in_cluster: bool,
    /// Container log lines to capture when a test fails: `0` disables
    /// capture, `-1` captures everything.
    pub error_log_lines: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            in_cluster: false,
            error_log_lines: 50,
        }
    }
}

impl TestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn in_cluster(mut self, in_cluster: bool) -> Self {
        self.in_cluster = in_cluster;
        self
    }

    pub fn error_log_lines(mut self, lines: i64) -> Self {
        self.error_log_lines = lines;
        self
    }

    /// Build a client for the configured cluster.
    pub async fn resolve_client(&self) -> Result<Client, ConfigError> {
        let config = if self.in_cluster {
            info!("resolving in-cluster configuration");
            Config::incluster()?
        } else if self.kubeconfig.is_some() || self.context.is_some() {
            let kubeconfig = match &self.kubeconfig {
                Some(path) => Kubeconfig::read_from(path)?,
                None => Kubeconfig::read()?,
            };
            let options = KubeConfigOptions {
                context: self.context.clone(),
                ..Default::default()
            };
            info!(context = ?self.context, "resolving kubeconfig configuration");
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        } else {
            Config::infer().await?
        };

        Ok(Client::try_from(config)?)
    }

    /// Load the kubeconfig this configuration points at. In-cluster mode
    /// has no kubeconfig, so this still reads the standard discovery
    /// path; callers wanting cluster identity inside a pod should skip
    /// [`ClusterInfo`].
    fn load_kubeconfig(&self) -> Result<Kubeconfig, ConfigError> {
        Ok(match &self.kubeconfig {
            Some(path) => Kubeconfig::read_from(path)?,
            None => Kubeconfig::read()?,
        })
    }
}

/// Identity of the cluster a test run targets, for report headers and
/// log context. Resolved once per process.
#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub context: Option<String>,
    pub user: Option<String>,
    pub server: Option<String>,
}

static CLUSTER_INFO: OnceLock<ClusterInfo> = OnceLock::new();

impl ClusterInfo {
    /// The cached snapshot, if one has been resolved.
    pub fn get() -> Option<&'static ClusterInfo> {
        CLUSTER_INFO.get()
    }

    /// Resolve the snapshot from the given configuration, caching the
    /// first successful result for the life of the process.
    pub fn get_or_init(config: &TestConfig) -> Result<&'static ClusterInfo, ConfigError> {
        if let Some(info) = CLUSTER_INFO.get() {
            return Ok(info);
        }
        let info = ClusterInfo::from_kubeconfig(&config.load_kubeconfig()?, config.context.as_deref());
        Ok(CLUSTER_INFO.get_or_init(|| info))
    }

    /// Extract cluster identity from a parsed kubeconfig. Missing pieces
    /// stay `None`; a partial kubeconfig is not an error here.
    fn from_kubeconfig(kubeconfig: &Kubeconfig, context_override: Option<&str>) -> ClusterInfo {
        let context_name = context_override
            .map(str::to_string)
            .or_else(|| kubeconfig.current_context.clone());

        let context = context_name.as_deref().and_then(|name| {
            kubeconfig
                .contexts
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.context.as_ref())
        });

        let user = context.and_then(|c| c.user.clone());
        let server = context.and_then(|c| {
            kubeconfig
                .clusters
                .iter()
                .find(|cl| cl.name == c.cluster)
                .and_then(|cl| cl.cluster.as_ref())
                .and_then(|cl| cl.server.clone())
        });

        ClusterInfo {
            context: context_name,
            user,
            server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: kind-test
contexts:
  - name: kind-test
    context:
      cluster: kind-test
      user: kind-test-admin
  - name: staging
    context:
      cluster: staging-cluster
      user: staging-user
clusters:
  - name: kind-test
    cluster:
      server: https://127.0.0.1:6443
  - name: staging-cluster
    cluster:
      server: https://staging.example.com:6443
users:
  - name: kind-test-admin
    user: {}
  - name: staging-user
    user: {}
"#;

    fn parsed() -> Kubeconfig {
        serde_yaml::from_str(KUBECONFIG).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = TestConfig::default();
        assert!(config.kubeconfig.is_none());
        assert!(config.context.is_none());
        assert!(!config.in_cluster);
        assert_eq!(config.error_log_lines, 50);
    }

    #[test]
    fn test_builder() {
        let config = TestConfig::new()
            .kubeconfig("/tmp/kubeconfig")
            .context("staging")
            .error_log_lines(-1);
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert_eq!(config.context.as_deref(), Some("staging"));
        assert_eq!(config.error_log_lines, -1);
    }

    #[test]
    fn test_cluster_info_current_context() {
        let info = ClusterInfo::from_kubeconfig(&parsed(), None);
        assert_eq!(info.context.as_deref(), Some("kind-test"));
        assert_eq!(info.user.as_deref(), Some("kind-test-admin"));
        assert_eq!(info.server.as_deref(), Some("https://127.0.0.1:6443"));
    }

    #[test]
    fn test_cluster_info_context_override() {
        let info = ClusterInfo::from_kubeconfig(&parsed(), Some("staging"));
        assert_eq!(info.user.as_deref(), Some("staging-user"));
        assert_eq!(
            info.server.as_deref(),
            Some("https://staging.example.com:6443")
        );
    }

    #[test]
    fn test_cluster_info_unknown_context() {
        let info = ClusterInfo::from_kubeconfig(&parsed(), Some("nonexistent"));
        assert_eq!(info.context.as_deref(), Some("nonexistent"));
        assert!(info.user.is_none());
        assert!(info.server.is_none());
    }
}
