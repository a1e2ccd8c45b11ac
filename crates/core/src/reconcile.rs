//! # Reconciler
//!
//! Merges the current catalog with the parameter names a live cluster
//! reports, producing the next snapshot.
//!
//! ## The Merge
//!
//! Both inputs are walked once, ascending by name:
//!
//! ```text
//! previous: alpha bravo charlie delta echo
//! cluster:  alpha bravo         delta      golf zulu
//!           keep  keep  drop    keep  drop fetch fetch
//! ```
//!
//! Names on both sides keep their existing record untouched. Names only the
//! cluster reports are fetched with `config help`, one call each, so network
//! traffic is bounded by the delta. Names only the catalog holds are dropped.
//!
//! A failed listing aborts the cycle. A failed detail fetch only skips that
//! parameter; it is logged and counted in the report.

use crate::catalog::Catalog;
use crate::error::{FetchError, ReconcileError};
use crate::executor::{ClusterCommand, ClusterCommandExecutor};
use crate::model::ParameterInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation signal and deadline for one reconciliation cycle
#[derive(Debug, Clone, Default)]
pub struct ReconcileContext {
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort once the watched value becomes `true`
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Drive `work` to completion unless cancelled or past the deadline.
    ///
    /// On either, `work` is dropped along with anything it built.
    pub async fn run<T, F>(&self, work: F) -> Result<T, ReconcileError>
    where
        F: Future<Output = Result<T, ReconcileError>>,
    {
        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => loop {
                    let signalled = *rx.borrow_and_update();
                    if signalled {
                        break;
                    }
                    // A dropped sender can no longer cancel
                    if rx.changed().await.is_err() {
                        pending::<()>().await;
                    }
                },
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(ReconcileError::Cancelled),
            _ = expired => Err(ReconcileError::DeadlineExceeded),
            result = work => result,
        }
    }
}

/// Result of merging a catalog with a cluster name list
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub params: Vec<ParameterInfo>,
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
    /// Names whose detail fetch failed, ascending
    pub failed: Vec<String>,
    /// Duplicate entries collapsed out of the cluster list
    pub duplicates: usize,
}

/// Summary of one committed reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub total: usize,
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
    pub failed: Vec<String>,
    pub duplicates: usize,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// True when the cycle left the catalog as it was
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// A freshly built catalog, not yet visible to readers
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub catalog: Catalog,
    pub report: ReconcileReport,
}

/// Sort, drop empty entries and collapse duplicates.
///
/// Returns the cleaned list and how many duplicates were removed.
fn sorted_unique(mut names: Vec<String>) -> (Vec<String>, usize) {
    names.retain(|n| !n.is_empty());
    names.sort_unstable();
    let before = names.len();
    names.dedup();
    let duplicates = before - names.len();
    (names, duplicates)
}

/// Ordered two-pointer merge of `previous` against `cluster_names`.
///
/// `cluster_names` may arrive unsorted and with duplicates. `fetch` is called
/// exactly once per name missing from `previous`; a fetched record whose
/// name disagrees with the requested one counts as a failure.
pub async fn merge_params<F, Fut>(
    previous: &Catalog,
    cluster_names: Vec<String>,
    mut fetch: F,
) -> MergeOutcome
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ParameterInfo, FetchError>>,
{
    let (names, duplicates) = sorted_unique(cluster_names);
    let existing = previous.as_slice();

    let mut params = Vec::with_capacity(names.len());
    let mut failed = Vec::new();
    let (mut kept, mut added, mut removed) = (0, 0, 0);
    let mut i = 0;

    for name in names {
        // Skip catalog entries the cluster no longer reports
        while i < existing.len() && existing[i].name.as_str() < name.as_str() {
            removed += 1;
            i += 1;
        }

        if i < existing.len() && existing[i].name == name {
            params.push(existing[i].clone());
            kept += 1;
            i += 1;
            continue;
        }

        match fetch(name.clone()).await {
            Ok(mut info) => {
                if info.name.is_empty() {
                    info.name = name.clone();
                }
                if info.name == name {
                    params.push(info);
                    added += 1;
                } else {
                    let err = FetchError::NameMismatch {
                        requested: name.clone(),
                        returned: info.name,
                    };
                    tracing::warn!(param = %name, error = %err, "Skipping parameter with mismatched detail");
                    failed.push(name);
                }
            }
            Err(err) => {
                tracing::warn!(param = %name, error = %err, "Failed to fetch parameter detail, skipping");
                failed.push(name);
            }
        }
    }
    removed += existing.len() - i;

    MergeOutcome {
        params,
        kept,
        added,
        removed,
        failed,
        duplicates,
    }
}

/// Ask the cluster for every parameter name it knows
pub async fn list_cluster_names(
    executor: &dyn ClusterCommandExecutor,
) -> Result<Vec<String>, ReconcileError> {
    let raw = executor
        .execute(&ClusterCommand::ListParameters)
        .await
        .map_err(ReconcileError::ListFailed)?;
    serde_json::from_slice(&raw).map_err(ReconcileError::ListDecode)
}

/// Fetch and decode one parameter's `config help` reply
pub async fn fetch_detail(
    executor: &dyn ClusterCommandExecutor,
    name: String,
) -> Result<ParameterInfo, FetchError> {
    let raw = executor.execute(&ClusterCommand::describe(name)).await?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Run one reconciliation cycle against the cluster.
///
/// Builds the next catalog without touching `previous`. The caller decides
/// whether to publish it.
pub async fn reconcile(
    ctx: &ReconcileContext,
    previous: &Catalog,
    executor: &dyn ClusterCommandExecutor,
) -> Result<Reconciled, ReconcileError> {
    let started = Instant::now();

    ctx.run(async {
        let names = list_cluster_names(executor).await?;
        tracing::debug!(cluster_params = names.len(), "Listed cluster parameters");

        let outcome = merge_params(previous, names, |name| fetch_detail(executor, name)).await;
        let report = ReconcileReport {
            total: outcome.params.len(),
            kept: outcome.kept,
            added: outcome.added,
            removed: outcome.removed,
            failed: outcome.failed,
            duplicates: outcome.duplicates,
            elapsed_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };

        Ok(Reconciled {
            catalog: Catalog::from_sorted(outcome.params),
            report,
        })
    })
    .await
}
