#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prediction {
    /// Maximum number of distinct navigation transitions the history model
    /// keeps. When exceeded, the lowest-probability records are dropped
    /// first, keeping the model bounded regardless of session length.
    pub max_transitions: usize,

    /// Number of observations of a transition after which its estimated
    /// probability stops growing. The estimate ramps linearly:
    /// `count / saturation_count`, capped by `probability_ceiling`.
    pub saturation_count: u32,

    /// Upper bound on any transition probability. Kept strictly below 1.0 so
    /// a single outlier streak never causes unconditional preloading.
    pub probability_ceiling: f32,

    /// Maximum number of predicted next destinations preloaded after each
    /// navigation.
    pub top_n: usize,

    /// Minimum transition probability a destination needs before it is worth
    /// preloading speculatively.
    pub min_probability: f32,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            max_transitions: 100,
            saturation_count: 10,
            probability_ceiling: 0.95,
            top_n: 3,
            min_probability: 0.3,
        }
    }
}
