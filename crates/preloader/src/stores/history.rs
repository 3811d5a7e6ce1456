#![forbid(unsafe_code)]

use crate::domain::RoutePath;
use rustc_hash::FxHashMap;
use tracing::trace;

/// One observed (from, to) navigation pair. `probability` is a pure function
/// of `count`, recomputed on every observation, never mutated independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    pub from: RoutePath,
    pub to: RoutePath,
    pub count: u32,
    pub probability: f32,
}

/// Bounded collection of transition records keyed by (from, to).
///
/// The estimator is a deliberately simple saturating linear ramp:
/// `min(count / saturation_count, ceiling)`. Monotonic in `count` and bounded
/// away from 1, so an outlier streak never forces unconditional preloading.
#[derive(Debug)]
pub struct NavigationHistory {
    records: FxHashMap<(RoutePath, RoutePath), TransitionRecord>,
    max_records: usize,
    saturation_count: u32,
    ceiling: f32,
}

impl NavigationHistory {
    pub fn new(config: &config::Prediction) -> Self {
        Self {
            records: FxHashMap::default(),
            max_records: config.max_transitions.max(1),
            saturation_count: config.saturation_count.max(1),
            ceiling: config.probability_ceiling,
        }
    }

    /// Record one observed navigation, creating or bumping the matching
    /// record and re-deriving its probability.
    pub fn record_transition(&mut self, from: RoutePath, to: RoutePath) {
        let key = (from.clone(), to.clone());
        let saturation_count = self.saturation_count;
        let ceiling = self.ceiling;
        let record = self.records.entry(key).or_insert_with(|| TransitionRecord {
            from,
            to,
            count: 0,
            probability: 0.0,
        });
        record.count = record.count.saturating_add(1);
        record.probability = (record.count as f32 / saturation_count as f32).min(ceiling);
        trace!(
            from = %record.from,
            to = %record.to,
            count = record.count,
            probability = record.probability,
            "transition recorded"
        );

        if self.records.len() > self.max_records {
            self.trim();
        }
    }

    /// Up to `top_n` destinations reachable from `from` with probability at
    /// least `min_probability`, most probable first.
    pub fn predict_next(
        &self,
        from: &RoutePath,
        top_n: usize,
        min_probability: f32,
    ) -> Vec<RoutePath> {
        let mut candidates: Vec<&TransitionRecord> = self
            .records
            .values()
            .filter(|record| record.from == *from && record.probability >= min_probability)
            .collect();
        candidates.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                // Saturated records share a probability; prefer the heavier
                // count, then a stable path order.
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.to.cmp(&b.to))
        });
        candidates
            .into_iter()
            .take(top_n)
            .map(|record| record.to.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.values()
    }

    /// Rebuild the model from persisted (from, to, count) triples.
    /// Probabilities are re-derived, not trusted from storage.
    pub fn restore(&mut self, counts: impl IntoIterator<Item = (RoutePath, RoutePath, u32)>) {
        self.records.clear();
        for (from, to, count) in counts {
            if count == 0 {
                continue;
            }
            let probability = self.derive(count);
            self.records.insert(
                (from.clone(), to.clone()),
                TransitionRecord {
                    from,
                    to,
                    count,
                    probability,
                },
            );
        }
        if self.records.len() > self.max_records {
            self.trim();
        }
    }

    fn derive(&self, count: u32) -> f32 {
        (count as f32 / self.saturation_count as f32).min(self.ceiling)
    }

    /// Drop the lowest-probability surplus so the model stays bounded no
    /// matter how long a session runs.
    fn trim(&mut self) {
        let surplus = self.records.len().saturating_sub(self.max_records);
        if surplus == 0 {
            return;
        }
        let mut keyed: Vec<((RoutePath, RoutePath), f32)> = self
            .records
            .iter()
            .map(|(key, record)| (key.clone(), record.probability))
            .collect();
        keyed.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| a.0.cmp(&b.0))
        });
        for (key, _) in keyed.into_iter().take(surplus) {
            self.records.remove(&key);
        }
        trace!(dropped = surplus, "navigation history trimmed");
    }
}
