#![forbid(unsafe_code)]

pub mod clock;
pub mod domain;
pub mod error;
pub mod external;
pub mod network;
pub mod persistence;
pub mod preloader;
pub mod scheduler;
pub mod stores;

pub use error::Error;
pub use preloader::{CacheStats, Preloader, Services};

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{
    EffectiveType, LoaderHandle, ModuleHandle, NetworkSignal, NetworkTier, RouteEntry, RoutePath,
};
pub use external::{KeyValueStore, LoadError, ModuleLoader, RouteTable};
pub use network::NetworkMonitor;
pub use persistence::{HISTORY_KEY, HistoryRepository, MemoryStore, TransitionSnapshot};
pub use scheduler::{IdleScheduler, SweepPhase, TimerIdle};
pub use stores::{ModuleCache, ModuleRecord, NavigationHistory, Stores, TransitionRecord};
