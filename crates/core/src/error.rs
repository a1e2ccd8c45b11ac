//! # Errors
//!
//! Error taxonomy for the catalog core. Loading the baseline is fatal,
//! a failed cluster listing aborts one reconciliation cycle, and a failed
//! per-parameter fetch is only ever counted and logged.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The baseline dataset could not be turned into a catalog
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read baseline dataset {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse baseline dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate parameter name in catalog: {0}")]
    DuplicateName(String),
}

/// A cluster command could not be executed
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// A reconciliation cycle was aborted; the previous snapshot stays current
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to list cluster parameters: {0}")]
    ListFailed(#[source] ExecutorError),
    #[error("failed to decode cluster parameter list: {0}")]
    ListDecode(#[source] serde_json::Error),
    #[error("reconciliation cancelled")]
    Cancelled,
    #[error("reconciliation exceeded its deadline")]
    DeadlineExceeded,
}

/// Fetching one parameter's detail failed; the parameter is skipped
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("failed to decode config help reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("config help for {requested} returned {returned}")]
    NameMismatch { requested: String, returned: String },
}
