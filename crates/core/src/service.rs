//! # Catalog Service
//!
//! Ties the store, the reconciler and a cluster executor together. Queries
//! always run against the snapshot current when they start; refreshes are
//! single-flight and publish only complete catalogs.

use crate::catalog::Catalog;
use crate::error::ReconcileError;
use crate::executor::ClusterCommandExecutor;
use crate::model::ParameterInfo;
use crate::query::{search, Query};
use crate::reconcile::{reconcile, ReconcileContext, ReconcileReport};
use crate::store::CatalogStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What a refresh trigger ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Committed(ReconcileReport),
    /// Another refresh held the slot; this trigger was dropped
    AlreadyRunning,
}

/// Shared handle to the parameter catalog
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<CatalogStore>,
    executor: Arc<dyn ClusterCommandExecutor>,
}

impl CatalogService {
    pub fn new(initial: Catalog, executor: Arc<dyn ClusterCommandExecutor>) -> Self {
        Self {
            store: Arc::new(CatalogStore::new(initial)),
            executor,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The snapshot readers currently see
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.store.current()
    }

    /// Run a query against the current snapshot
    pub fn search(&self, query: &Query) -> Vec<ParameterInfo> {
        search(&self.snapshot(), query)
    }

    /// Look up one parameter by exact name
    pub fn get(&self, name: &str) -> Option<ParameterInfo> {
        self.snapshot().get(name).cloned()
    }

    /// Reconcile with the cluster and publish the result.
    ///
    /// Returns `AlreadyRunning` without contacting the cluster if a refresh
    /// is in flight. On any error the previous snapshot stays current.
    pub async fn reconcile(&self, ctx: &ReconcileContext) -> Result<RefreshOutcome, ReconcileError> {
        let Some(guard) = self.store.try_begin_refresh() else {
            tracing::debug!("Refresh already in progress, dropping trigger");
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        let previous = self.store.current();
        tracing::info!(current = previous.len(), "Reconciliation started");
        match reconcile(ctx, &previous, self.executor.as_ref()).await {
            Ok(reconciled) => {
                let report = reconciled.report;
                guard.commit(reconciled.catalog);
                tracing::info!(
                    total = report.total,
                    kept = report.kept,
                    added = report.added,
                    removed = report.removed,
                    failed = report.failed_count(),
                    duplicates = report.duplicates,
                    elapsed_ms = report.elapsed_ms,
                    "Catalog reconciled"
                );
                Ok(RefreshOutcome::Committed(report))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reconciliation aborted, keeping previous catalog");
                Err(e)
            }
        }
    }

    /// Refresh every `period` until `shutdown` turns `true`.
    ///
    /// Each cycle gets `timeout` as its deadline and is cancelled by the same
    /// shutdown signal. Failed cycles are logged and the loop carries on.
    pub fn spawn_refresh_loop(
        &self,
        period: Duration,
        timeout: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let service = self.clone();
        let cancel = shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(period_secs = period.as_secs(), "Periodic refresh started");

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let ctx = ReconcileContext::new()
                            .with_cancel(cancel.clone())
                            .with_timeout(timeout);
                        if let Err(e) = service.reconcile(&ctx).await {
                            tracing::error!(error = %e, "Periodic refresh failed");
                        }
                    }
                }
            }

            tracing::info!("Periodic refresh stopped");
        })
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("params", &self.store.current().len())
            .field("generation", &self.store.generation())
            .field("refreshing", &self.store.is_refreshing())
            .finish()
    }
}
