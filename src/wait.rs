//! The condition polling engine
//!
//! Evaluates [`Condition`]s against live cluster state on a fixed interval
//! until they are met, a timeout elapses, or an API error is raised by a
//! predicate. This is the single polling primitive the rest of the crate
//! builds on: object readiness waits, deletion waits, and the registry's
//! bulk "everything created and ready" wait all reduce to a call here.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use kubetest::wait::wait_for_condition;
//!
//! wait_for_condition(
//!     &mut ready_condition,
//!     Duration::from_secs(30),
//!     Duration::from_secs(1),
//!     false,
//! )
//! .await?;
//! ```

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::condition::{Condition, Policy};
use crate::objects::ObjectError;

/// Default interval between polling passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised by the wait engine.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The timeout elapsed with conditions still unmet. The unmet
    /// condition names are carried for diagnostics.
    #[error("timed out after {elapsed:?} (timeout {timeout:?}) with unmet conditions: [{}]", unmet.join(", "))]
    Timeout {
        unmet: Vec<String>,
        elapsed: Duration,
        timeout: Duration,
    },

    /// A predicate raised an API error and `fail_on_api_error` was set.
    #[error("condition '{name}' failed: {source}")]
    Api {
        name: String,
        #[source]
        source: ObjectError,
    },
}

/// Wait until all conditions are met.
///
/// Conditions are evaluated once per polling pass, with `interval` slept
/// between passes. Under [`Policy::Once`] a condition is never re-evaluated
/// after it has been observed true; under [`Policy::Simultaneous`] every
/// condition is re-evaluated each pass and all must hold in the same pass.
///
/// Elapsed time is tracked from entry into this function. A `timeout` of
/// zero means "evaluate each condition once, no retry" — it never means an
/// unbounded wait.
///
/// If a predicate returns an error, the behavior depends on
/// `fail_on_api_error`: when set, the error propagates immediately as
/// [`WaitError::Api`]; when unset, the evaluation counts as "not yet met"
/// and the condition is retried on the next pass.
pub async fn wait_for_conditions(
    conditions: &mut [Condition],
    timeout: Duration,
    interval: Duration,
    policy: Policy,
    fail_on_api_error: bool,
) -> Result<(), WaitError> {
    let start = Instant::now();

    debug!(
        conditions = conditions.len(),
        ?timeout,
        ?interval,
        ?policy,
        "waiting for conditions"
    );

    loop {
        for cond in conditions.iter_mut() {
            if policy == Policy::Once && cond.met() {
                continue;
            }

            match cond.check().await {
                Ok(met) => {
                    debug!(condition = %cond.name(), met, "checked condition");
                }
                Err(e) => {
                    if fail_on_api_error {
                        return Err(WaitError::Api {
                            name: cond.name().to_string(),
                            source: e,
                        });
                    }
                    debug!(
                        condition = %cond.name(),
                        error = %e,
                        "condition check errored, treating as unmet"
                    );
                }
            }
        }

        if conditions.iter().all(Condition::met) {
            debug!(elapsed = ?start.elapsed(), "all conditions met");
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            let unmet = conditions
                .iter()
                .filter(|c| !c.met())
                .map(|c| c.name().to_string())
                .collect();
            return Err(WaitError::Timeout {
                unmet,
                elapsed,
                timeout,
            });
        }

        sleep(interval).await;
    }
}

/// Wait for a single condition with [`Policy::Once`] semantics.
pub async fn wait_for_condition(
    condition: &mut Condition,
    timeout: Duration,
    interval: Duration,
    fail_on_api_error: bool,
) -> Result<(), WaitError> {
    wait_for_conditions(
        std::slice::from_mut(condition),
        timeout,
        interval,
        Policy::Once,
        fail_on_api_error,
    )
    .await
}
