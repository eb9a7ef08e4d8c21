//! Wrapper for the Kubernetes `Node` API object
//!
//! Nodes are never created or deleted by tests; the wrapper exists for
//! observation (readiness gating, capacity checks). Create and delete
//! are implemented for contract completeness but tests should not need
//! them outside of exotic cluster-admin scenarios.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::DeleteParams;
use kube::Client;

use super::api_object::{create_cluster, delete_cluster, get_cluster};
use super::{Kind, ObjectError, ResourceOps};

/// Wrapper around `core/v1 Node`.
#[derive(Debug, Clone)]
pub struct Node {
    pub obj: core::Node,
}

impl Node {
    pub fn wrap(obj: core::Node) -> Self {
        Self { obj }
    }

    pub fn status(&self) -> Option<&core::NodeStatus> {
        self.obj.status.as_ref()
    }

    /// Total resources of the node, if reported.
    pub fn capacity(&self) -> Option<&BTreeMap<String, Quantity>> {
        self.status().and_then(|s| s.capacity.as_ref())
    }

    /// Resources available for scheduling, if reported.
    pub fn allocatable(&self) -> Option<&BTreeMap<String, Quantity>> {
        self.status().and_then(|s| s.allocatable.as_ref())
    }

    fn require_name(&self) -> Result<String, ObjectError> {
        self.name()
            .map(str::to_string)
            .ok_or(ObjectError::MissingName { kind: "Node" })
    }
}

impl ResourceOps for Node {
    fn kind(&self) -> Kind {
        Kind::Node
    }

    fn name(&self) -> Option<&str> {
        self.obj.metadata.name.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        None
    }

    fn set_namespace(&mut self, _namespace: &str) {}

    async fn create(
        &mut self,
        client: &Client,
        _namespace: Option<&str>,
    ) -> Result<(), ObjectError> {
        self.require_name()?;
        self.obj = create_cluster(client, "Node", &self.obj).await?;
        Ok(())
    }

    async fn delete(
        &mut self,
        client: &Client,
        options: Option<DeleteParams>,
    ) -> Result<(), ObjectError> {
        let name = self.require_name()?;
        delete_cluster::<core::Node>(client, "Node", &name, options).await
    }

    async fn refresh(&mut self, client: &Client) -> Result<(), ObjectError> {
        let name = self.require_name()?;
        self.obj = get_cluster(client, "Node", &name).await?;
        Ok(())
    }

    /// Ready when the node reports a `Ready` condition with status `"True"`.
    fn is_ready(&self) -> bool {
        self.status()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_condition(type_: &str, status: &str) -> Node {
        Node::wrap(core::Node {
            status: Some(core::NodeStatus {
                conditions: Some(vec![core::NodeCondition {
                    type_: type_.to_string(),
                    status: status.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_is_ready_requires_ready_true() {
        assert!(node_with_condition("Ready", "True").is_ready());
        assert!(!node_with_condition("Ready", "False").is_ready());
        assert!(!node_with_condition("Ready", "Unknown").is_ready());
        assert!(!node_with_condition("MemoryPressure", "True").is_ready());
    }

    #[test]
    fn test_is_ready_defensive_without_status() {
        assert!(!Node::wrap(core::Node::default()).is_ready());
    }

    #[test]
    fn test_capacity_accessors() {
        let mut node = node_with_condition("Ready", "True");
        node.obj.status.as_mut().unwrap().capacity = Some(BTreeMap::from([(
            "cpu".to_string(),
            Quantity("4".to_string()),
        )]));
        assert_eq!(
            node.capacity().and_then(|c| c.get("cpu")),
            Some(&Quantity("4".to_string()))
        );
        assert!(node.allocatable().is_none());
    }
}
