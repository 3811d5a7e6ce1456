#![forbid(unsafe_code)]

use crate::domain::RoutePath;
use crate::external::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load module for {path}: {source}")]
    Load {
        path: RoutePath,
        source: LoadError,
    },

    #[error("route not present in the route table: {0}")]
    UnknownRoute(RoutePath),

    #[error("failed to serialize navigation history: {0}")]
    Persistence(#[from] serde_json::Error),
}
