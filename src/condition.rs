//! Test conditions for the polling engine
//!
//! A [`Condition`] names an async predicate that the wait engine in
//! [`crate::wait`] evaluates repeatedly until it holds. Predicates capture
//! whatever they need by value (a cloned `kube::Client` is cheap), so a
//! condition is `'static` and can outlive the scope that built it.
//!
//! # Example
//!
//! ```ignore
//! use kubetest::condition::Condition;
//!
//! let client = client.clone();
//! let cond = Condition::new("deployment nginx ready", move || {
//!     let client = client.clone();
//!     Box::pin(async move {
//!         let dep: Deployment = fetch(&client, "nginx").await?;
//!         Ok(is_ready(&dep))
//!     })
//! });
//! ```

use std::fmt;

use futures::future::BoxFuture;

use crate::objects::ObjectError;

/// The future returned by a condition predicate.
pub type CheckFuture = BoxFuture<'static, Result<bool, ObjectError>>;

/// How a group of conditions is considered satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// A condition only needs to be observed true once. Met conditions are
    /// not re-evaluated on later polling passes. This is the default.
    #[default]
    Once,
    /// All conditions must hold within the same polling pass. Every
    /// condition is re-evaluated each pass, even if previously met.
    Simultaneous,
}

/// A named, evaluatable expectation against live cluster state.
///
/// The `met` flag is owned by the wait engine: it records the outcome of
/// the most recent check and lets the engine skip already-met conditions
/// under [`Policy::Once`].
pub struct Condition {
    name: String,
    check: Box<dyn Fn() -> CheckFuture + Send>,
    met: bool,
}

impl Condition {
    /// Create a condition from a human-readable name and a predicate.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> CheckFuture + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
            met: false,
        }
    }

    /// The condition's name, used in timeout diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the most recent check observed the predicate to hold.
    pub fn met(&self) -> bool {
        self.met
    }

    /// Evaluate the predicate once and record the outcome.
    ///
    /// An `Err` from the predicate leaves the condition unmet; the caller
    /// decides whether to propagate or retry.
    pub async fn check(&mut self) -> Result<bool, ObjectError> {
        match (self.check)().await {
            Ok(met) => {
                self.met = met;
                Ok(met)
            }
            Err(e) => {
                self.met = false;
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("met", &self.met)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Condition (name: {}, met: {})>", self.name, self.met)
    }
}

/// Check all conditions and sort them into met and unmet buckets.
///
/// For callers that want per-condition outcomes rather than the wait
/// engine's all-or-nothing answer. The engine itself reports timeouts
/// from the met flags of its last polling pass without re-evaluating.
pub async fn check_and_sort(
    conditions: &mut [Condition],
) -> (Vec<&Condition>, Vec<&Condition>) {
    for cond in conditions.iter_mut() {
        // Evaluation errors count as unmet here; this helper is for
        // diagnostics, not for propagating API failures.
        let _ = cond.check().await;
    }

    conditions.iter().partition(|c| c.met)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(value: bool) -> Condition {
        Condition::new(format!("always-{value}"), move || {
            Box::pin(async move { Ok(value) })
        })
    }

    #[tokio::test]
    async fn test_check_records_outcome() {
        let mut cond = always(true);
        assert!(!cond.met());

        let result = cond.check().await.unwrap();
        assert!(result);
        assert!(cond.met());
    }

    #[tokio::test]
    async fn test_check_false_stays_unmet() {
        let mut cond = always(false);
        assert!(!cond.check().await.unwrap());
        assert!(!cond.met());
    }

    #[tokio::test]
    async fn test_check_error_resets_met() {
        let mut cond = Condition::new("failing", || {
            Box::pin(async { Err(ObjectError::Proxy("boom".to_string())) })
        });

        assert!(cond.check().await.is_err());
        assert!(!cond.met());
    }

    #[tokio::test]
    async fn test_display() {
        let mut cond = always(true);
        assert_eq!(
            cond.to_string(),
            "<Condition (name: always-true, met: false)>"
        );

        cond.check().await.unwrap();
        assert_eq!(
            cond.to_string(),
            "<Condition (name: always-true, met: true)>"
        );
    }

    #[tokio::test]
    async fn test_check_and_sort() {
        let mut conditions = vec![always(true), always(false), always(true)];

        let (met, unmet) = check_and_sort(&mut conditions).await;
        assert_eq!(met.len(), 2);
        assert_eq!(unmet.len(), 1);
        assert_eq!(unmet[0].name(), "always-false");
    }

    #[test]
    fn test_default_policy_is_once() {
        assert_eq!(Policy::default(), Policy::Once);
    }
}
