//! # Ceph CLI Executor
//!
//! Runs cluster commands through the `ceph` command line tool and returns its
//! JSON stdout. Each invocation is bounded by a timeout; the child process is
//! killed if the future is dropped.

use super::{ClusterCommand, ClusterCommandExecutor};
use crate::error::ExecutorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// How to invoke the `ceph` binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CephCliConfig {
    /// Binary to run (default: `ceph` from PATH)
    pub binary: PathBuf,
    /// Optional `--conf` path
    pub conf: Option<PathBuf>,
    /// Optional `--id` client user
    pub user: Option<String>,
    /// Per-command timeout
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for CephCliConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ceph"),
            conf: None,
            user: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Executor backed by the `ceph` command line tool
#[derive(Debug, Clone)]
pub struct CephCliExecutor {
    config: CephCliConfig,
}

impl CephCliExecutor {
    pub fn new(config: CephCliConfig) -> Self {
        Self { config }
    }

    /// Full argument list for a command
    pub fn build_args(&self, command: &ClusterCommand) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(conf) = &self.config.conf {
            args.push("--conf".to_string());
            args.push(conf.to_string_lossy().into_owned());
        }
        if let Some(user) = &self.config.user {
            args.push("--id".to_string());
            args.push(user.clone());
        }

        args.extend(command.prefix().split(' ').map(str::to_string));
        if let ClusterCommand::DescribeParameter { name } = command {
            args.push(name.clone());
        }
        args.push("--format".to_string());
        args.push("json".to_string());
        args
    }
}

#[async_trait]
impl ClusterCommandExecutor for CephCliExecutor {
    async fn execute(&self, command: &ClusterCommand) -> Result<Vec<u8>, ExecutorError> {
        let program = self.config.binary.to_string_lossy().into_owned();
        let args = self.build_args(command);
        tracing::debug!(mon_cmd = %command.to_mon_json(), program = %program, "executing cluster command");

        let child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecutorError::Timeout {
                command: command.to_string(),
                timeout: self.config.timeout,
            })?
            .map_err(|source| ExecutorError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(command = %command, status = %output.status, "cluster command failed");
            return Err(ExecutorError::CommandFailed {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn test_build_args() {
        let executor = CephCliExecutor::new(CephCliConfig {
            conf: Some(PathBuf::from("/etc/ceph/ceph.conf")),
            user: Some("admin".to_string()),
            ..Default::default()
        });

        assert_eq!(
            executor.build_args(&ClusterCommand::ListParameters),
            vec!["--conf", "/etc/ceph/ceph.conf", "--id", "admin", "config", "ls", "--format", "json"]
        );

        let bare = CephCliExecutor::new(CephCliConfig::default());
        assert_eq!(
            bare.build_args(&ClusterCommand::describe("osd_max_backfills")),
            vec!["config", "help", "osd_max_backfills", "--format", "json"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_returns_stdout() {
        let executor = CephCliExecutor::new(CephCliConfig {
            binary: PathBuf::from("echo"),
            ..Default::default()
        });
        let out = executor.execute(&ClusterCommand::ListParameters).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "config ls --format json");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_failures() {
        let failing = CephCliExecutor::new(CephCliConfig {
            binary: PathBuf::from("false"),
            ..Default::default()
        });
        let err = assert_err!(failing.execute(&ClusterCommand::ListParameters).await);
        assert!(matches!(err, ExecutorError::CommandFailed { .. }));

        let missing = CephCliExecutor::new(CephCliConfig {
            binary: PathBuf::from("/nonexistent/ceph"),
            ..Default::default()
        });
        let err = assert_err!(missing.execute(&ClusterCommand::ListParameters).await);
        assert!(matches!(err, ExecutorError::Spawn { .. }));
    }
}
