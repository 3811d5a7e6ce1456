#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Cache {
    /// Maximum number of route modules held in the cache at once. When an
    /// insertion pushes the cache past this bound, the entry with the lowest
    /// desirability score is evicted synchronously.
    ///
    /// ## Note
    ///
    /// Setting this too low makes warm-up churn: the background sweep will
    /// evict the very modules the critical phase just loaded.
    pub capacity: usize,

    /// Maximum age of a cache entry. Entries older than this are treated as
    /// absent on lookup even if not yet physically purged. **Measured in
    /// seconds**.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub ttl: Duration,

    /// Reference interval for the eviction score's staleness discount. An
    /// entry unused for exactly this long has its access frequency halved.
    /// **Measured in seconds**.
    ///
    /// The one-hour default is a tunable, not a load-tested optimum.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub decay_reference: Duration,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            capacity: 20,
            ttl: Duration::from_secs(30 * 60),
            decay_reference: Duration::from_secs(3600),
        }
    }
}
