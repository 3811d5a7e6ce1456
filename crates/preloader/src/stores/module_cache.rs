#![forbid(unsafe_code)]

use crate::domain::{ModuleHandle, RoutePath};
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// One cached route module with its access statistics.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub path: RoutePath,
    pub module: ModuleHandle,
    pub loaded_at: Instant,
    pub access_count: u64,
    pub last_accessed_at: Instant,
}

/// Bounded map of route path to loaded module.
///
/// Entries older than `ttl` are treated as absent on lookup even before they
/// are physically purged. Capacity overruns evict the entry with the lowest
/// desirability score synchronously, inside `put`.
#[derive(Debug)]
pub struct ModuleCache {
    entries: FxHashMap<RoutePath, ModuleRecord>,
    capacity: usize,
    ttl: Duration,
    decay_reference: Duration,
}

impl ModuleCache {
    pub fn new(config: &config::Cache) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity: config.capacity.max(1),
            ttl: config.ttl,
            decay_reference: config.decay_reference.max(Duration::from_secs(1)),
        }
    }

    /// Counted lookup. A hit bumps the access statistics; an entry past its
    /// TTL is purged and reported absent, same as a path never loaded.
    pub fn get(&mut self, path: &RoutePath, now: Instant) -> Option<&ModuleRecord> {
        if self.expired(path, now) {
            self.entries.remove(path);
            return None;
        }
        let record = self.entries.get_mut(path)?;
        record.access_count += 1;
        record.last_accessed_at = now;
        Some(record)
    }

    /// Insert or overwrite the record for `path`, resetting its statistics.
    /// Runs eviction before returning if the insertion overflows capacity.
    pub fn put(&mut self, path: RoutePath, module: ModuleHandle, now: Instant) {
        self.entries.insert(
            path.clone(),
            ModuleRecord {
                path,
                module,
                loaded_at: now,
                access_count: 1,
                last_accessed_at: now,
            },
        );
        while self.entries.len() > self.capacity {
            self.evict_one(now);
        }
    }

    /// Non-mutating existence check respecting the TTL.
    pub fn has(&self, path: &RoutePath, now: Instant) -> bool {
        self.entries.contains_key(path) && !self.expired(path, now)
    }

    /// Sweep out every entry whose age exceeds the TTL.
    pub fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, record| now.saturating_duration_since(record.loaded_at) <= ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "expired cache entries swept");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.entries.values()
    }

    fn expired(&self, path: &RoutePath, now: Instant) -> bool {
        self.entries
            .get(path)
            .is_some_and(|record| now.saturating_duration_since(record.loaded_at) > self.ttl)
    }

    /// Desirability: raw access frequency discounted by time sat unused.
    /// An entry idle for exactly `decay_reference` scores half its count.
    fn score(&self, record: &ModuleRecord, now: Instant) -> f64 {
        let idle = now.saturating_duration_since(record.last_accessed_at);
        record.access_count as f64
            / (1.0 + idle.as_secs_f64() / self.decay_reference.as_secs_f64())
    }

    fn evict_one(&mut self, now: Instant) {
        let victim = self
            .entries
            .values()
            .map(|record| (self.score(record, now), record))
            .min_by(|(a_score, a), (b_score, b)| {
                a_score
                    .total_cmp(b_score)
                    // Lower score loses; among equals the oldest load loses.
                    .then_with(|| a.loaded_at.cmp(&b.loaded_at))
            })
            .map(|(score, record)| (record.path.clone(), score));

        if let Some((path, score)) = victim {
            trace!(%path, score, "evicting lowest-scored cache entry");
            self.entries.remove(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn cache(capacity: usize, ttl_secs: u64) -> ModuleCache {
        ModuleCache::new(&config::Cache {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
            decay_reference: Duration::from_secs(3600),
        })
    }

    fn module() -> ModuleHandle {
        ModuleHandle::new(())
    }

    #[test]
    fn second_put_overwrites_single_record() {
        let mut cache = cache(4, 600);
        let now = Instant::now();
        let path = RoutePath::new("/login");

        cache.put(path.clone(), module(), now);
        let _ = cache.get(&path, now);
        let _ = cache.get(&path, now);
        cache.put(path.clone(), module(), now);

        assert_eq!(cache.len(), 1);
        let record = cache.get(&path, now).unwrap();
        // Overwrite resets statistics; this get is the second access.
        assert_eq!(record.access_count, 2);
    }

    #[test]
    fn ttl_expiry_reports_absent() {
        let mut cache = cache(4, 60);
        let t0 = Instant::now();
        let path = RoutePath::new("/users");

        cache.put(path.clone(), module(), t0);
        assert!(cache.has(&path, t0 + Duration::from_secs(60)));
        assert!(!cache.has(&path, t0 + Duration::from_secs(61)));
        assert!(cache.get(&path, t0 + Duration::from_secs(61)).is_none());
        // The expired lookup also purged the record.
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_removes_the_minimum_scored_entry() {
        let mut cache = cache(2, 86_400);
        let start = Instant::now();
        let now = start + Duration::from_secs(7200);

        // A: one access, idle for two hours. Score = 1 / (1 + 2) ~ 0.33.
        let a = RoutePath::new("/a");
        cache.put(a.clone(), module(), start);

        // B: five accesses, last one a minute ago. Score ~ 5 / 1.017 ~ 4.9.
        let b = RoutePath::new("/b");
        cache.put(b.clone(), module(), start);
        for _ in 0..4 {
            let _ = cache.get(&b, now - Duration::from_secs(60));
        }

        // C enters with score 1 / (1 + 0) = 1; the minimum is A.
        cache.put(RoutePath::new("/c"), module(), now);

        assert_eq!(cache.len(), 2);
        assert!(!cache.has(&a, now), "stale entry should lose");
        assert!(cache.has(&b, now));
        assert!(cache.has(&RoutePath::new("/c"), now));
    }

    #[test]
    fn eviction_tie_breaks_on_oldest_load() {
        let mut cache = cache(2, 86_400);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(10);

        let old = RoutePath::new("/old");
        let new = RoutePath::new("/new");
        cache.put(old.clone(), module(), t0);
        cache.put(new.clone(), module(), t1);

        // Equalize scores: both have access_count 1 and identical idle time.
        let now = t1 + Duration::from_secs(5);
        if let Some(record) = cache.entries.get_mut(&old) {
            record.last_accessed_at = t1;
        }

        cache.put(RoutePath::new("/next"), module(), now);
        assert!(!cache.has(&old, now));
        assert!(cache.has(&new, now));
    }

    #[test]
    fn evict_expired_sweeps_only_overage_entries() {
        let mut cache = cache(8, 100);
        let t0 = Instant::now();
        cache.put(RoutePath::new("/fresh"), module(), t0 + Duration::from_secs(90));
        cache.put(RoutePath::new("/stale"), module(), t0);

        cache.evict_expired(t0 + Duration::from_secs(120));
        assert_eq!(cache.len(), 1);
        assert!(cache.has(&RoutePath::new("/fresh"), t0 + Duration::from_secs(120)));
    }

    proptest! {
        #[test]
        fn capacity_invariant_holds_after_every_put(
            capacity in 1usize..8,
            puts in prop::collection::vec((0u8..32, 0u64..10_000), 1..100),
        ) {
            let mut cache = cache(capacity, 1_000_000);
            let start = Instant::now();

            for (route, offset_secs) in puts {
                let now = start + Duration::from_secs(offset_secs);
                cache.put(RoutePath::new(format!("/route/{route}")), module(), now);
                prop_assert!(cache.len() <= capacity);
            }
        }

        #[test]
        fn get_never_resurrects_expired_entries(
            ttl in 1u64..1_000,
            age in 0u64..2_000,
        ) {
            let mut cache = cache(4, ttl);
            let t0 = Instant::now();
            let path = RoutePath::new("/p");
            cache.put(path.clone(), module(), t0);

            let now = t0 + Duration::from_secs(age);
            let hit = cache.get(&path, now).is_some();
            prop_assert_eq!(hit, age <= ttl);
        }
    }
}
