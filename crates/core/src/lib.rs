//! # Paramcat Core
//!
//! Searchable catalog of Ceph configuration parameters, kept in step with a
//! live cluster.
//!
//! ## Architecture
//!
//! - `model` - Parameter records as `ceph config help` describes them
//! - `catalog` / `baseline` - Immutable sorted snapshots and the shipped dataset
//! - `query` - Filtering and sorting over a snapshot
//! - `executor` - Cluster command seam (`ceph` CLI and an in-memory mock)
//! - `reconcile` - Ordered merge of a snapshot with the cluster's name list
//! - `store` / `service` - Snapshot publication and single-flight refresh
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paramcat_core::{load_baseline_file, CatalogService, CephCliConfig, CephCliExecutor, Query};
//!
//! let catalog = load_baseline_file("crates/core/data/config-index.json").await?;
//! let service = CatalogService::new(catalog, Arc::new(CephCliExecutor::new(CephCliConfig::default())));
//! let hits = service.search(&Query::new().service("osd").name("osd_scrub_*"));
//! ```

pub mod baseline;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod query;
pub mod reconcile;
pub mod service;
pub mod store;

pub use baseline::{load_baseline, load_baseline_file, to_baseline_json};
pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{ExecutorError, FetchError, LoadError, ReconcileError};
pub use executor::{CephCliConfig, CephCliExecutor, ClusterCommand, ClusterCommandExecutor, MockExecutor};
pub use model::{ParameterInfo, ScalarValue};
pub use query::{search, Query, SortField, SortOrder};
pub use reconcile::{reconcile, ReconcileContext, ReconcileReport, Reconciled};
pub use service::{CatalogService, RefreshOutcome};
pub use store::CatalogStore;
