//! Remote task store contract and adapters.
//!
//! # Responsibility
//! - Define the user-scoped cloud store seen by the sync engine.
//! - Classify transport failures so callers can degrade to offline mode.
//!
//! # Invariants
//! - Adapters never touch the local store.
//! - Every failure is reported as `RemoteError`; none of them is fatal to a
//!   reconciliation pass.

use crate::model::task::Task;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub mod http;
pub mod memory;

pub use http::{HttpRemoteStore, HttpRemoteStoreConfig};
pub use memory::MemoryRemoteStore;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote store failure classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network unreachable, connection refused or the store reports offline.
    Unavailable(String),
    /// The store answered but rejected the write.
    WriteFailed { status: Option<u16>, message: String },
    /// No answer within the configured bound.
    Timeout(Duration),
    /// The store answered with something that is not a task document.
    InvalidResponse(String),
    /// The adapter cannot be built from the given settings.
    Misconfigured(String),
}

impl RemoteError {
    /// Short stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "remote_unavailable",
            Self::WriteFailed { .. } => "remote_write_failed",
            Self::Timeout(_) => "remote_timeout",
            Self::InvalidResponse(_) => "remote_invalid_response",
            Self::Misconfigured(_) => "remote_misconfigured",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "remote store unavailable: {message}"),
            Self::WriteFailed {
                status: Some(status),
                message,
            } => write!(f, "remote write failed with status {status}: {message}"),
            Self::WriteFailed {
                status: None,
                message,
            } => write!(f, "remote write failed: {message}"),
            Self::Timeout(limit) => {
                write!(f, "remote call timed out after {}ms", limit.as_millis())
            }
            Self::InvalidResponse(message) => write!(f, "invalid remote response: {message}"),
            Self::Misconfigured(message) => write!(f, "remote store misconfigured: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Shared cloud store scoped to the authenticated user.
#[async_trait]
pub trait RemoteTaskStore: Send + Sync {
    /// Inserts or replaces one task document keyed by `task.id`.
    async fn put_task(&self, task: &Task) -> RemoteResult<()>;
    /// Returns every task document visible to the current user.
    async fn get_all(&self) -> RemoteResult<Vec<Task>>;
}

#[async_trait]
impl<S: RemoteTaskStore + ?Sized> RemoteTaskStore for Arc<S> {
    async fn put_task(&self, task: &Task) -> RemoteResult<()> {
        (**self).put_task(task).await
    }

    async fn get_all(&self) -> RemoteResult<Vec<Task>> {
        (**self).get_all().await
    }
}
