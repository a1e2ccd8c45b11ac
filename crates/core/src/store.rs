//! # Catalog Store
//!
//! Holds the snapshot readers query and the single-flight refresh guard.
//!
//! Readers take an `Arc<Catalog>` and keep it for as long as they need; a
//! commit swaps the pointer and never mutates a published catalog. The
//! refresh guard is a compare-and-swap flag, so two concurrent triggers can
//! never both start a cycle.

use crate::catalog::Catalog;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Current snapshot plus the refresh-in-flight flag
#[derive(Debug)]
pub struct CatalogStore {
    current: ArcSwap<Catalog>,
    refreshing: AtomicBool,
    generation: AtomicU64,
}

impl CatalogStore {
    pub fn new(initial: Catalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            refreshing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// The snapshot visible right now
    pub fn current(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Publish a complete new snapshot; outside the crate only a
    /// [`RefreshGuard`] may do this
    pub(crate) fn commit(&self, catalog: Catalog) {
        self.current.store(Arc::new(catalog));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, "Committed catalog snapshot");
    }

    /// Number of commits since construction
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Claim the refresh slot, or `None` if a refresh is already running.
    ///
    /// The slot is released when the guard drops, including on error or
    /// cancellation.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { store: self })
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

/// Exclusive right to run one refresh cycle
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    store: &'a CatalogStore,
}

impl RefreshGuard<'_> {
    /// Publish the cycle's result and release the slot
    pub fn commit(self, catalog: Catalog) {
        self.store.commit(catalog);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.store.refreshing.store(false, Ordering::Release);
    }
}
