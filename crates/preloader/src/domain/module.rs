#![forbid(unsafe_code)]

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a loaded, renderable unit.
///
/// The cache holds a non-exclusive reference to a unit it did not create and
/// cannot introspect; the external loader may hold another. Eviction drops
/// the reference and nothing more.
#[derive(Clone)]
pub struct ModuleHandle(Arc<dyn Any + Send + Sync>);

impl ModuleHandle {
    pub fn new<T: Any + Send + Sync>(module: T) -> Self {
        Self(Arc::new(module))
    }

    /// Typed view for callers that know what the loader produced.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether two handles point at the same loaded unit.
    pub fn same_module(&self, other: &ModuleHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleHandle(..)")
    }
}
