#![forbid(unsafe_code)]

use crate::domain::{LoaderHandle, ModuleHandle, RouteEntry};
use async_trait::async_trait;

/// Generic module load failure. The remote bundle could not be fetched or
/// parsed; the distinction does not matter to the cache, which leaves the
/// path absent and retryable either way.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct LoadError(pub String);

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The application's static route table, known at startup.
pub trait RouteTable: Send + Sync {
    fn list_routes(&self) -> Vec<RouteEntry>;
}

/// The external loader that turns a [`LoaderHandle`] into a renderable unit.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, handle: &LoaderHandle) -> Result<ModuleHandle, LoadError>;

    /// Optional fast path: a module the loader already holds in memory.
    fn already_loaded(&self, handle: &LoaderHandle) -> Option<ModuleHandle> {
        let _ = handle;
        None
    }
}

/// Durable key-value store used for history persistence under one fixed key.
///
/// Reads of missing or corrupt data return `None` rather than erroring;
/// writes are fire-and-forget with last-writer-wins semantics.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
}
