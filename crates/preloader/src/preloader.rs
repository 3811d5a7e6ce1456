#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::domain::{LoaderHandle, ModuleHandle, NetworkSignal, NetworkTier, RouteEntry, RoutePath};
use crate::external::{KeyValueStore, ModuleLoader, RouteTable};
use crate::network::NetworkMonitor;
use crate::persistence::HistoryRepository;
use crate::scheduler::{IdleScheduler, SweepPhase, TimerIdle};
use crate::stores::Stores;
use config::Config;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// External collaborators injected at construction time. The network signal
/// and idle scheduler are where host capability differences enter: absent
/// signal means a pinned `Normal` tier, and `TimerIdle` is the safe default
/// when the host has no idle primitive.
pub struct Services {
    pub route_table: Box<dyn RouteTable>,
    pub loader: Box<dyn ModuleLoader>,
    pub kv_store: Box<dyn KeyValueStore>,
    pub network_signal: Option<watch::Receiver<NetworkSignal>>,
    /// `None` selects the flat-delay fallback built from
    /// `scheduler.idle_fallback_delay`.
    pub idle: Option<Box<dyn IdleScheduler>>,
    pub clock: Arc<dyn Clock>,
}

/// Read-only diagnostics snapshot; no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_count: usize,
    pub in_flight_count: usize,
    pub total_known_routes: usize,
    pub sweep_complete: bool,
    pub transition_count: usize,
}

#[derive(Debug)]
struct State {
    stores: Stores,
    /// Paths with a load currently outstanding. A second preload for a path
    /// in this set is coalesced into a no-op, never queued.
    in_flight: FxHashSet<RoutePath>,
}

/// The single coordinating authority for cache and prediction state.
///
/// Construct one per running application and pass it by reference; renders
/// never wait on it — they probe [`is_preloaded`]/[`preloaded_module`] and
/// fall through to on-demand loading on a miss.
///
/// [`is_preloaded`]: Preloader::is_preloaded
/// [`preloaded_module`]: Preloader::preloaded_module
pub struct Preloader {
    loader: Box<dyn ModuleLoader>,
    repo: HistoryRepository,
    monitor: NetworkMonitor,
    idle: Box<dyn IdleScheduler>,
    clock: Arc<dyn Clock>,
    scheduler: config::Scheduler,
    top_n: usize,
    min_probability: f32,
    routes: Vec<RouteEntry>,
    route_index: FxHashMap<RoutePath, LoaderHandle>,
    state: Mutex<State>,
    phase: Mutex<SweepPhase>,
    warmed: AtomicBool,
}

impl Preloader {
    /// Build a preloader with an empty history. No persistence is read.
    pub fn new(config: Config, services: Services) -> Self {
        let routes = services.route_table.list_routes();
        let route_index = routes
            .iter()
            .map(|entry| (entry.path.clone(), entry.handle.clone()))
            .collect();
        let idle = services.idle.unwrap_or_else(|| {
            Box::new(TimerIdle::new(
                config.scheduler.idle_fallback_delay,
                services.clock.clone(),
            ))
        });

        Self {
            loader: services.loader,
            repo: HistoryRepository::new(services.kv_store),
            monitor: NetworkMonitor::new(services.network_signal),
            idle,
            clock: services.clock,
            scheduler: config.scheduler.clone(),
            top_n: config.prediction.top_n,
            min_probability: config.prediction.min_probability,
            routes,
            route_index,
            state: Mutex::new(State {
                stores: Stores::new(&config),
                in_flight: FxHashSet::default(),
            }),
            phase: Mutex::new(SweepPhase::Pending),
            warmed: AtomicBool::new(false),
        }
    }

    /// Build a preloader and rehydrate navigation history from the durable
    /// store. Missing or corrupt data degrades to an empty history.
    pub fn load(config: Config, services: Services) -> Self {
        let preloader = Self::new(config, services);
        let counts = preloader.repo.load();
        if !counts.is_empty() {
            let mut state = preloader.state.lock();
            state.stores.history.restore(counts);
            debug!(
                transitions = state.stores.history.len(),
                "navigation history rehydrated"
            );
        }
        preloader
    }

    /// Load `path`'s module into the cache ahead of navigation.
    ///
    /// A cache hit (unless `force`) only bumps access statistics. A load
    /// already in flight for the same path coalesces this call into a no-op;
    /// the outstanding load populates the cache for both callers. Load
    /// failures are logged and leave the path absent — retryable on the next
    /// navigation, with no backoff state kept here.
    pub async fn preload_route(&self, path: impl Into<RoutePath>, force: bool) {
        let path = path.into();
        let handle = {
            let now = self.clock.now();
            let mut state = self.state.lock();
            if !force && state.stores.cache.get(&path, now).is_some() {
                trace!(%path, "preload satisfied by cache");
                return;
            }
            if state.in_flight.contains(&path) {
                trace!(%path, "preload coalesced with in-flight load");
                return;
            }
            let Some(handle) = self.route_index.get(&path) else {
                debug!(err = %crate::Error::UnknownRoute(path.clone()), "preload skipped");
                return;
            };
            state.in_flight.insert(path.clone());
            handle.clone()
        };

        let result = match self.loader.already_loaded(&handle) {
            Some(module) => Ok(module),
            None => self.loader.load(&handle).await,
        };

        let now = self.clock.now();
        let mut state = self.state.lock();
        state.in_flight.remove(&path);
        match result {
            Ok(module) => {
                trace!(%path, "module cached");
                state.stores.cache.put(path, module, now);
            }
            Err(source) => {
                // Failed loads never create a record; the path stays absent
                // and eligible for retry.
                let err = crate::Error::Load { path, source };
                warn!(%err, "module load failed");
            }
        }
    }

    /// Record one observed navigation, persist the history (write-through,
    /// last-writer-wins), then preload the likely next destinations.
    pub async fn record_navigation(
        &self,
        from: impl Into<RoutePath>,
        to: impl Into<RoutePath>,
    ) {
        let to = to.into();
        {
            let mut state = self.state.lock();
            state
                .stores
                .history
                .record_transition(from.into(), to.clone());
            if let Err(err) = self.repo.save(&state.stores.history) {
                warn!(%err, "history persistence failed");
            }
        }
        self.preload_likely_next_routes(to).await;
    }

    /// Issue non-forced preloads for the high-probability destinations
    /// reachable from `path`.
    pub async fn preload_likely_next_routes(&self, path: impl Into<RoutePath>) {
        let path = path.into();
        let predicted = {
            let state = self.state.lock();
            state
                .stores
                .history
                .predict_next(&path, self.top_n, self.min_probability)
        };
        for next in predicted {
            self.preload_route(next, false).await;
        }
    }

    /// Non-mutating probe used by the rendering layer to choose between
    /// rendering immediately and showing a loading placeholder.
    pub fn is_preloaded(&self, path: &RoutePath) -> bool {
        let now = self.clock.now();
        self.state.lock().stores.cache.has(path, now)
    }

    /// Counted cache hit returning the module handle, or `None` for a path
    /// never loaded or expired by TTL.
    pub fn preloaded_module(&self, path: &RoutePath) -> Option<ModuleHandle> {
        let now = self.clock.now();
        self.state
            .lock()
            .stores
            .cache
            .get(path, now)
            .map(|record| record.module.clone())
    }

    /// Sweep TTL-expired cache entries; callable on demand or from a timer.
    pub fn evict_expired(&self) {
        let now = self.clock.now();
        self.state.lock().stores.cache.evict_expired(now);
    }

    pub fn cache_stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            cached_count: state.stores.cache.len(),
            in_flight_count: state.in_flight.len(),
            total_known_routes: self.routes.len(),
            sweep_complete: *self.phase.lock() == SweepPhase::Complete,
            transition_count: state.stores.history.len(),
        }
    }

    pub fn phase(&self) -> SweepPhase {
        *self.phase.lock()
    }

    /// Drive the three-phase startup strategy: force-load the critical set,
    /// load the high-priority set after the first frame, then sweep the rest
    /// of the route table as idle-time background work unless the network
    /// tier forbids it. Safe to call once; repeats are no-ops.
    pub async fn warm_up(&self) {
        if self.warmed.swap(true, Ordering::SeqCst) {
            return;
        }

        for path in &self.scheduler.critical {
            self.preload_route(path.as_str(), true).await;
        }
        info!(
            critical = self.scheduler.critical.len(),
            "critical routes dispatched"
        );

        self.clock.sleep(self.scheduler.frame_delay).await;
        for path in &self.scheduler.high_priority {
            self.preload_route(path.as_str(), false).await;
        }
        *self.phase.lock() = SweepPhase::Primed;

        if self.monitor.current_tier() == NetworkTier::Restricted {
            info!("restricted network tier, background sweep skipped");
            return;
        }

        self.idle.wait_for_idle().await;
        self.background_sweep().await;
    }

    /// Re-trigger a skipped background sweep once conditions improve. Runs
    /// only when the tier has climbed to `Aggressive` and the sweep has not
    /// already completed.
    pub async fn resume_background(&self) {
        if *self.phase.lock() == SweepPhase::Complete {
            return;
        }
        if self.monitor.current_tier() != NetworkTier::Aggressive {
            return;
        }
        self.idle.wait_for_idle().await;
        self.background_sweep().await;
    }

    /// Exhaustive sweep over every route not already cached, in fixed-size
    /// batches with a mandatory pause between them. Single load failures are
    /// logged inside `preload_route` and never halt the sweep.
    async fn background_sweep(&self) {
        if *self.phase.lock() == SweepPhase::Complete {
            return;
        }

        let pending: Vec<RoutePath> = {
            let now = self.clock.now();
            let state = self.state.lock();
            self.routes
                .iter()
                .map(|entry| entry.path.clone())
                .filter(|path| {
                    !state.stores.cache.has(path, now) && !state.in_flight.contains(path)
                })
                .collect()
        };
        debug!(pending = pending.len(), "background sweep started");

        let batch_size = self.scheduler.batch_size.max(1);
        for (index, batch) in pending.chunks(batch_size).enumerate() {
            if index > 0 {
                self.clock.sleep(self.scheduler.batch_pause).await;
            }
            stream::iter(batch.iter().cloned())
                .for_each_concurrent(batch_size, |path| self.preload_route(path, false))
                .await;
        }

        *self.phase.lock() = SweepPhase::Complete;
        info!("background sweep complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::RouteEntry;
    use crate::external::{LoadError, ModuleLoader};
    use crate::persistence::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct StaticRoutes(Vec<RouteEntry>);

    impl RouteTable for StaticRoutes {
        fn list_routes(&self) -> Vec<RouteEntry> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait]
    impl ModuleLoader for CountingLoader {
        async fn load(&self, handle: &LoaderHandle) -> Result<ModuleHandle, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LoadError::new(format!("fetch failed: {}", handle.as_str())))
            } else {
                Ok(ModuleHandle::new(handle.as_str().to_string()))
            }
        }
    }

    fn services(loader: CountingLoader, routes: Vec<RouteEntry>) -> Services {
        Services {
            route_table: Box::new(StaticRoutes(routes)),
            loader: Box::new(loader),
            kv_store: Box::new(MemoryStore::new()),
            network_signal: None,
            idle: None,
            clock: Arc::new(ManualClock::new()),
        }
    }

    fn routes(paths: &[&str]) -> Vec<RouteEntry> {
        paths
            .iter()
            .map(|path| RouteEntry::new(*path, format!("chunk:{path}")))
            .collect()
    }

    #[tokio::test]
    async fn failed_load_leaves_path_absent_and_retryable() {
        let preloader = Preloader::new(
            Config::default(),
            services(
                CountingLoader {
                    fail: true,
                    ..Default::default()
                },
                routes(&["/a"]),
            ),
        );

        preloader.preload_route("/a", false).await;
        assert!(!preloader.is_preloaded(&RoutePath::new("/a")));
        let stats = preloader.cache_stats();
        assert_eq!(stats.cached_count, 0);
        assert_eq!(stats.in_flight_count, 0);

        // No backoff state: the next attempt goes straight to the loader.
        preloader.preload_route("/a", false).await;
    }

    #[tokio::test]
    async fn unknown_route_is_ignored() {
        let preloader = Preloader::new(
            Config::default(),
            services(CountingLoader::default(), routes(&["/a"])),
        );

        preloader.preload_route("/nope", false).await;
        assert_eq!(preloader.cache_stats().cached_count, 0);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_unless_forced() {
        let calls = Arc::new(AtomicU32::new(0));
        let loader = CountingLoader {
            calls: calls.clone(),
            fail: false,
        };
        let preloader = Preloader::new(Config::default(), services(loader, routes(&["/a"])));

        preloader.preload_route("/a", false).await;
        preloader.preload_route("/a", false).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "hit short-circuits");
        assert_eq!(preloader.cache_stats().cached_count, 1);

        // Force bypasses the hit check and reloads.
        preloader.preload_route("/a", true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(preloader.cache_stats().cached_count, 1);
    }

    #[tokio::test]
    async fn record_navigation_persists_and_preloads_likely_next() {
        let preloader = Preloader::new(
            Config::default(),
            services(CountingLoader::default(), routes(&["/a", "/b"])),
        );

        // Build up /a -> /b past the 0.3 probability threshold.
        for _ in 0..4 {
            preloader.record_navigation("/a", "/b").await;
        }
        // The prediction fires from /b's predecessors; navigate to /a again.
        preloader.record_navigation("/b", "/a").await;
        preloader.preload_likely_next_routes("/a").await;

        assert!(preloader.is_preloaded(&RoutePath::new("/b")));
        assert_eq!(preloader.cache_stats().transition_count, 2);
    }

    #[tokio::test]
    async fn preloaded_module_is_a_counted_hit() {
        let preloader = Preloader::new(
            Config::default(),
            services(CountingLoader::default(), routes(&["/a"])),
        );

        preloader.preload_route("/a", false).await;
        let module = preloader.preloaded_module(&RoutePath::new("/a")).unwrap();
        assert_eq!(
            module.downcast_ref::<String>().map(String::as_str),
            Some("chunk:/a")
        );
        assert!(preloader.preloaded_module(&RoutePath::new("/b")).is_none());
    }
}
