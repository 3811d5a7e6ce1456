#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Scheduler {
    /// Routes preloaded immediately at startup, force-reloaded to guarantee
    /// freshness. Keep this set small: it runs before everything else.
    pub critical: Vec<String>,

    /// Routes preloaded right after the first render frame. Cache hits
    /// short-circuit, so repeating a critical route here is harmless.
    pub high_priority: Vec<String>,

    /// Pause between the critical phase and the high-priority phase, standing
    /// in for "after the first render frame". **Measured in milliseconds**.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub frame_delay: Duration,

    /// Number of routes loaded concurrently per batch during the background
    /// sweep.
    ///
    /// ## Note
    ///
    /// This is the only fan-out bound in the subsystem; raising it trades
    /// interactive smoothness for sweep speed.
    pub batch_size: usize,

    /// Mandatory pause between background sweep batches. **Measured in
    /// milliseconds**.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub batch_pause: Duration,

    /// Flat delay used by the fallback idle scheduler on hosts that provide
    /// no real idle-time primitive. **Measured in milliseconds**.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub idle_fallback_delay: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            critical: vec![
                "/".to_string(),
                "/dashboard".to_string(),
                "/login".to_string(),
            ],
            high_priority: vec![
                "/users".to_string(),
                "/profile".to_string(),
                "/settings".to_string(),
            ],
            frame_delay: Duration::from_millis(50),
            batch_size: 3,
            batch_pause: Duration::from_millis(500),
            idle_fallback_delay: Duration::from_millis(2000),
        }
    }
}
