//! # Mock Executor
//!
//! Scripted stand-in for a cluster. Replies come from in-memory tables, and
//! every call is counted so tests can assert how many fetches a
//! reconciliation performed.

use super::{ClusterCommand, ClusterCommandExecutor};
use crate::error::ExecutorError;
use crate::model::ParameterInfo;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// In-memory cluster double
#[derive(Debug, Default)]
pub struct MockExecutor {
    names: Mutex<Vec<String>>,
    details: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    list_failure: Mutex<Option<String>>,
    /// When set, unknown names are described as `{name, type: <fallback>}`
    fallback_type: Option<String>,
    latency: Option<Duration>,
    list_calls: AtomicUsize,
    described: Mutex<Vec<String>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockExecutor {
    /// A cluster reporting these parameter names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Mutex::new(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Reply to `config help` for this record's name with the record itself
    pub fn with_detail(self, info: &ParameterInfo) -> Self {
        let raw = serde_json::to_vec(info).unwrap_or_default();
        self.with_raw_detail(&info.name, raw)
    }

    /// Reply to `config help <name>` with these exact bytes
    pub fn with_raw_detail(self, name: &str, raw: impl Into<Vec<u8>>) -> Self {
        locked(&self.details).insert(name.to_string(), raw.into());
        self
    }

    /// Describe any unscripted name as a minimal record of this type
    pub fn with_fallback_type(mut self, param_type: &str) -> Self {
        self.fallback_type = Some(param_type.to_string());
        self
    }

    /// Make `config help <name>` fail
    pub fn with_failing(self, name: &str) -> Self {
        locked(&self.failing).insert(name.to_string());
        self
    }

    /// Delay every reply
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Change the reported name list (node-set churn)
    pub fn set_names<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *locked(&self.names) = names.into_iter().map(Into::into).collect();
    }

    /// Make `config ls` fail with this message, or succeed again with `None`
    pub fn set_list_failure(&self, message: Option<&str>) {
        *locked(&self.list_failure) = message.map(str::to_string);
    }

    /// Number of `config ls` calls served
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Names passed to `config help`, in call order
    pub fn described(&self) -> Vec<String> {
        locked(&self.described).clone()
    }

    fn describe(&self, name: &str) -> Result<Vec<u8>, ExecutorError> {
        locked(&self.described).push(name.to_string());

        if locked(&self.failing).contains(name) {
            return Err(ExecutorError::Unavailable(format!("config help {} failed", name)));
        }
        if let Some(raw) = locked(&self.details).get(name) {
            return Ok(raw.clone());
        }
        match &self.fallback_type {
            Some(param_type) => {
                let info = ParameterInfo::new(name, param_type.as_str());
                serde_json::to_vec(&info)
                    .map_err(|e| ExecutorError::Unavailable(e.to_string()))
            }
            None => Err(ExecutorError::Unavailable(format!(
                "no detail scripted for {}",
                name
            ))),
        }
    }
}

#[async_trait]
impl ClusterCommandExecutor for MockExecutor {
    async fn execute(&self, command: &ClusterCommand) -> Result<Vec<u8>, ExecutorError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match command {
            ClusterCommand::ListParameters => {
                self.list_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(message) = locked(&self.list_failure).clone() {
                    return Err(ExecutorError::Unavailable(message));
                }
                let names = locked(&self.names).clone();
                serde_json::to_vec(&names).map_err(|e| ExecutorError::Unavailable(e.to_string()))
            }
            ClusterCommand::DescribeParameter { name } => self.describe(name),
        }
    }
}
