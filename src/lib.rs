//! Kubetest - Kubernetes integration-test harness
//!
//! Kubetest manages the cluster side of an integration test: it creates
//! an isolated namespace per test, applies the manifests and RBAC the
//! test declares, waits for everything to come up, and tears it all down
//! afterwards, capturing logs and events when the test failed.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use kubetest::{TestClient, TestConfig, TestDirective, TestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     kubetest::telemetry::init_logging();
//!
//!     let client = TestConfig::new().resolve_client().await?;
//!     let mut test = TestClient::new(client, "my_test", TestOptions::new());
//!
//!     test.setup(&[TestDirective::manifest_file("manifests/deployment.yaml")])
//!         .await?;
//!     test.wait_until_created(Duration::from_secs(60)).await?;
//!
//!     // Test body: assert against the running workload.
//!     let pods = test.get_pods(None).await?;
//!     assert!(!pods.is_empty());
//!
//!     test.teardown(false).await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod diagnostics;
pub mod directives;
pub mod manifest;
pub mod meta;
pub mod objects;
pub mod rbac;
pub mod telemetry;
pub mod utils;
pub mod wait;

// Re-export the types most tests touch directly.
pub use client::{ClientError, NamespaceOptions, TestClient, TestOptions};
pub use condition::{Condition, Policy};
pub use config::{ClusterInfo, ConfigError, TestConfig};
pub use diagnostics::Diagnostics;
pub use directives::TestDirective;
pub use manifest::ManifestError;
pub use meta::TestMeta;
pub use objects::{ApiObject, Kind, ObjectError, ResourceOps};
pub use wait::{wait_for_condition, wait_for_conditions, WaitError};
