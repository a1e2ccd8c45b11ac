//! # Catalog Configuration
//!
//! Settings for loading the baseline and refreshing it from a cluster.
//! Defaults can be overridden from `PARAMCAT_*` environment variables;
//! the binary layers command-line flags on top.

use crate::executor::CephCliConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BASELINE: &str = "PARAMCAT_BASELINE";
pub const ENV_REFRESH_INTERVAL: &str = "PARAMCAT_REFRESH_INTERVAL_SECS";
pub const ENV_RECONCILE_TIMEOUT: &str = "PARAMCAT_RECONCILE_TIMEOUT_SECS";
pub const ENV_SKIP_REFRESH: &str = "PARAMCAT_SKIP_REFRESH";
pub const ENV_CEPH_BIN: &str = "PARAMCAT_CEPH_BIN";
pub const ENV_CEPH_CONF: &str = "PARAMCAT_CEPH_CONF";
pub const ENV_CEPH_USER: &str = "PARAMCAT_CEPH_USER";
pub const ENV_COMMAND_TIMEOUT: &str = "PARAMCAT_COMMAND_TIMEOUT_SECS";

/// Shipped baseline dataset, resolved when the crate is built so the binary
/// starts from any working directory
pub const DEFAULT_BASELINE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/config-index.json");

/// Configuration for the catalog service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Baseline dataset path
    pub baseline_path: PathBuf,
    /// Seconds between periodic refreshes (0 disables the loop)
    pub refresh_interval_secs: u64,
    /// Deadline for one reconciliation cycle
    pub reconcile_timeout_secs: u64,
    /// Serve the baseline only; never contact the cluster
    pub skip_refresh: bool,
    /// How to reach the cluster
    pub ceph: CephCliConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            baseline_path: PathBuf::from(DEFAULT_BASELINE_PATH),
            refresh_interval_secs: 300,
            reconcile_timeout_secs: 120,
            skip_refresh: false,
            ceph: CephCliConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_BASELINE) {
            config.baseline_path = PathBuf::from(path);
        }
        if let Some(secs) = parse_secs(&lookup, ENV_REFRESH_INTERVAL) {
            config.refresh_interval_secs = secs;
        }
        if let Some(secs) = parse_secs(&lookup, ENV_RECONCILE_TIMEOUT) {
            config.reconcile_timeout_secs = secs;
        }
        if let Some(flag) = lookup(ENV_SKIP_REFRESH) {
            config.skip_refresh = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(bin) = lookup(ENV_CEPH_BIN) {
            config.ceph.binary = PathBuf::from(bin);
        }
        if let Some(conf) = lookup(ENV_CEPH_CONF) {
            config.ceph.conf = Some(PathBuf::from(conf));
        }
        if let Some(user) = lookup(ENV_CEPH_USER) {
            config.ceph.user = Some(user);
        }
        if let Some(secs) = parse_secs(&lookup, ENV_COMMAND_TIMEOUT) {
            config.ceph.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Periodic refresh period, if enabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.skip_refresh || self.refresh_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.refresh_interval_secs))
        }
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid duration override");
            None
        }
    }
}
