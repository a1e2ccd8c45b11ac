//! # Cluster Command Executor
//!
//! The seam between the catalog and the cluster. The catalog only needs two
//! commands, each answered with raw JSON bytes that the catalog decodes itself.
//!
//! ## Implementations
//!
//! - `ceph_cli` - runs the `ceph` binary through `tokio::process`
//! - `mock` - scripted replies and call counters for tests and offline runs

pub mod ceph_cli;
pub mod mock;

pub use ceph_cli::{CephCliConfig, CephCliExecutor};
pub use mock::MockExecutor;

use crate::error::ExecutorError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;

/// A monitor command the catalog issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCommand {
    /// `config ls` - every parameter name the cluster knows
    ListParameters,
    /// `config help` for a single parameter
    DescribeParameter { name: String },
}

impl ClusterCommand {
    pub fn describe(name: impl Into<String>) -> Self {
        ClusterCommand::DescribeParameter { name: name.into() }
    }

    /// Monitor command prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            ClusterCommand::ListParameters => "config ls",
            ClusterCommand::DescribeParameter { .. } => "config help",
        }
    }

    /// Monitor command document, as sent over a mon command channel.
    ///
    /// `config help` takes the parameter under `key`, not `name`.
    pub fn to_mon_json(&self) -> Value {
        match self {
            ClusterCommand::ListParameters => json!({
                "prefix": self.prefix(),
                "format": "json",
            }),
            ClusterCommand::DescribeParameter { name } => json!({
                "prefix": self.prefix(),
                "key": name,
                "format": "json",
            }),
        }
    }
}

impl fmt::Display for ClusterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterCommand::ListParameters => f.write_str(self.prefix()),
            ClusterCommand::DescribeParameter { name } => write!(f, "{} {}", self.prefix(), name),
        }
    }
}

/// Executes cluster commands and returns their raw JSON reply.
///
/// Transport, authentication and any retry policy belong to the
/// implementation; the catalog performs none of them.
#[async_trait]
pub trait ClusterCommandExecutor: Send + Sync {
    async fn execute(&self, command: &ClusterCommand) -> Result<Vec<u8>, ExecutorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mon_json() {
        assert_eq!(
            ClusterCommand::ListParameters.to_mon_json(),
            json!({"prefix": "config ls", "format": "json"})
        );
        assert_eq!(
            ClusterCommand::describe("osd_op_threads").to_mon_json(),
            json!({"prefix": "config help", "key": "osd_op_threads", "format": "json"})
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ClusterCommand::ListParameters.to_string(), "config ls");
        assert_eq!(
            ClusterCommand::describe("fsid").to_string(),
            "config help fsid"
        );
    }
}
