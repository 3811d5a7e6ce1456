#![forbid(unsafe_code)]

use crate::clock::Clock;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Capability probe for cooperative idle-time scheduling.
///
/// Hosts with a real idle primitive implement this over it; everyone else
/// gets [`TimerIdle`], the guaranteed-safe flat-delay fallback selected at
/// construction time. Completion means "low-priority work may start now",
/// nothing stronger.
#[async_trait]
pub trait IdleScheduler: Send + Sync {
    async fn wait_for_idle(&self);
}

/// Flat-delay stand-in for hosts without an idle-scheduling primitive.
pub struct TimerIdle {
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl TimerIdle {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { delay, clock }
    }
}

impl fmt::Debug for TimerIdle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerIdle").field("delay", &self.delay).finish()
    }
}

#[async_trait]
impl IdleScheduler for TimerIdle {
    async fn wait_for_idle(&self) {
        self.clock.sleep(self.delay).await;
    }
}

/// Warm-up progress. Phases are strictly sequential; each starts only after
/// the previous one has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Critical set not yet dispatched.
    Pending,
    /// Critical and high-priority sets dispatched; exhaustive sweep not run
    /// (either not reached yet, or skipped on a restricted tier).
    Primed,
    /// Exhaustive background sweep finished; terminal.
    Complete,
}
