#![forbid(unsafe_code)]

use std::sync::Arc;
use std::{fmt, hash};

/// Interned route identifier. Cloning shares the underlying allocation, so
/// the same path can key the cache, the history model, and the in-flight set
/// without copying the string around.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoutePath(Arc<str>);

impl RoutePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl hash::Hash for RoutePath {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RoutePath").field(&self.0).finish()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self(Arc::from(path))
    }
}

/// Opaque handle the route table associates with a path; only the module
/// loader knows how to interpret it (chunk name, bundle URL, and so on).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LoaderHandle(Arc<str>);

impl LoaderHandle {
    pub fn new(handle: impl AsRef<str>) -> Self {
        Self(Arc::from(handle.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoaderHandle").field(&self.0).finish()
    }
}

/// One row of the external route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: RoutePath,
    pub handle: LoaderHandle,
}

impl RouteEntry {
    pub fn new(path: impl Into<RoutePath>, handle: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            handle: LoaderHandle::new(handle),
        }
    }
}
