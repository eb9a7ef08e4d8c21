//! Cross-module tests through the public API: manifest loading feeding
//! the registry, and the wait engine driving custom conditions.

use std::time::Duration;

use kubetest::condition::Condition;
use kubetest::manifest;
use kubetest::meta::TestMeta;
use kubetest::objects::Kind;
use kubetest::wait::{wait_for_conditions, WaitError};
use kubetest::Policy;

#[test]
fn manifest_objects_register_in_apply_order() {
    // The fixture file deliberately lists ConfigMap, Service, Deployment;
    // the registry must reorder them for apply.
    let objects = manifest::load_file("testdata/deployment.yaml").expect("load fixture");
    assert_eq!(objects.len(), 3);

    let mut meta = TestMeta::new("fixture_order");
    for obj in objects {
        meta.register(obj);
    }

    let kinds: Vec<_> = meta.ordered().map(|o| o.kind()).collect();
    assert_eq!(kinds, vec![Kind::Service, Kind::ConfigMap, Kind::Deployment]);

    let deployments = meta.of_kind(Kind::Deployment);
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].name(), Some("web"));
}

#[tokio::test]
async fn wait_reports_every_unmet_condition_by_name() {
    let mut conditions = vec![
        Condition::new("service has endpoints", || Box::pin(async { Ok(false) })),
        Condition::new("deployment ready", || Box::pin(async { Ok(true) })),
        Condition::new("pod running", || Box::pin(async { Ok(false) })),
    ];

    let err = wait_for_conditions(
        &mut conditions,
        Duration::from_millis(30),
        Duration::from_millis(10),
        Policy::Once,
        false,
    )
    .await
    .unwrap_err();

    match err {
        WaitError::Timeout { unmet, .. } => {
            assert_eq!(unmet, vec!["service has endpoints", "pod running"]);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }

    // The met condition kept its state for post-mortem inspection.
    assert!(conditions[1].met());
    assert!(!conditions[0].met());
}
