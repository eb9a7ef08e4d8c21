//! Per-test registry of managed objects
//!
//! Every test case owns one [`TestMeta`]. Objects registered here are
//! applied to the cluster in a fixed kind order (namespace first, RBAC
//! before workloads) and within a kind in registration order, and the
//! registry is what teardown walks to clean up.

use std::collections::BTreeMap;

use kube::Client;
use tracing::debug;

use crate::objects::{ApiObject, Kind};
use crate::wait::{self, WaitError};
use crate::Policy;

/// Registry of all objects a test manages, bucketed by kind.
///
/// Iteration order over buckets follows [`Kind`]'s ordering, which is
/// the apply order; within a bucket objects keep registration order.
#[derive(Debug, Default)]
pub struct TestMeta {
    /// Name of the test case this registry belongs to.
    pub test_name: String,
    /// The test namespace, once assigned.
    pub namespace: Option<String>,
    /// Set when a test taints a node, so the harness knows cluster
    /// state may leak past the namespace cascade.
    pub node_tainted: bool,
    buckets: BTreeMap<Kind, Vec<ApiObject>>,
}

impl TestMeta {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    /// Register an object for lifecycle management. Objects without a
    /// namespace receive the test namespace at create time, not here.
    pub fn register(&mut self, obj: ApiObject) {
        debug!(
            test = %self.test_name,
            kind = %obj.kind(),
            name = obj.name().unwrap_or("<unnamed>"),
            "registering object",
        );
        self.buckets.entry(obj.kind()).or_default().push(obj);
    }

    /// All registered objects in apply order.
    pub fn ordered(&self) -> impl Iterator<Item = &ApiObject> {
        self.buckets.values().flatten()
    }

    /// All registered objects in apply order, mutably.
    pub fn ordered_mut(&mut self) -> impl Iterator<Item = &mut ApiObject> {
        self.buckets.values_mut().flatten()
    }

    /// The registered objects of one kind, in registration order.
    pub fn of_kind(&self, kind: Kind) -> &[ApiObject] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of registered objects across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Wait until every registered object exists on the cluster and
    /// passes its readiness predicate. Transient API errors during the
    /// poll count as "not yet", so a briefly unreachable API server does
    /// not fail the wait early.
    pub async fn wait_for_registered(
        &self,
        client: &Client,
        timeout: std::time::Duration,
    ) -> Result<(), WaitError> {
        let mut conditions: Vec<_> = self
            .ordered()
            .map(|obj| obj.ready_condition(client))
            .collect();

        wait::wait_for_conditions(
            &mut conditions,
            timeout,
            wait::DEFAULT_INTERVAL,
            Policy::Once,
            false,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ConfigMap, Deployment, Namespace, Pod, Secret};
    use k8s_openapi::api::apps::v1 as apps;
    use k8s_openapi::api::core::v1 as core;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn named_meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn pod(name: &str) -> ApiObject {
        ApiObject::Pod(Pod::wrap(core::Pod {
            metadata: named_meta(name),
            ..Default::default()
        }))
    }

    #[test]
    fn test_ordered_follows_apply_order() {
        let mut meta = TestMeta::new("ordering");
        meta.register(pod("worker"));
        meta.register(ApiObject::Deployment(Deployment::wrap(apps::Deployment {
            metadata: named_meta("web"),
            ..Default::default()
        })));
        meta.register(ApiObject::Secret(Secret::wrap(core::Secret {
            metadata: named_meta("token"),
            ..Default::default()
        })));
        meta.register(ApiObject::Namespace(Namespace::named("kubetest-ordering")));
        meta.register(ApiObject::ConfigMap(ConfigMap::wrap(core::ConfigMap {
            metadata: named_meta("settings"),
            ..Default::default()
        })));

        let kinds: Vec<_> = meta.ordered().map(ApiObject::kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Namespace,
                Kind::Secret,
                Kind::ConfigMap,
                Kind::Deployment,
                Kind::Pod,
            ]
        );
    }

    #[test]
    fn test_registration_order_within_bucket() {
        let mut meta = TestMeta::new("bucket-order");
        meta.register(pod("zulu"));
        meta.register(pod("alpha"));
        meta.register(pod("mike"));

        let names: Vec<_> = meta.of_kind(Kind::Pod).iter().filter_map(|o| o.name()).collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn test_len_and_empty() {
        let mut meta = TestMeta::new("counts");
        assert!(meta.is_empty());
        meta.register(pod("a"));
        meta.register(pod("b"));
        assert_eq!(meta.len(), 2);
        assert!(!meta.is_empty());
    }
}
