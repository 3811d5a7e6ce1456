#![forbid(unsafe_code)]

mod history;
mod module_cache;

pub use history::{NavigationHistory, TransitionRecord};
pub use module_cache::{ModuleCache, ModuleRecord};

use config::Config;

/// In-memory model state: the bounded module cache plus the navigation
/// history. One instance per running application, owned by the facade;
/// a single writer at a time.
#[derive(Debug)]
pub struct Stores {
    pub cache: ModuleCache,
    pub history: NavigationHistory,
}

impl Stores {
    pub fn new(config: &Config) -> Self {
        Self {
            cache: ModuleCache::new(&config.cache),
            history: NavigationHistory::new(&config.prediction),
        }
    }
}
