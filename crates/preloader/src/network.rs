#![forbid(unsafe_code)]

use crate::domain::{NetworkSignal, NetworkTier};
use tokio::sync::watch;

/// Derives the loading-aggressiveness tier from the host's network-quality
/// signal.
///
/// The host publishes signal changes through a `watch` channel; the monitor
/// reads whatever value is current at the time of the query, so the tier is
/// always recomputed from the latest signal. Hosts without any
/// network-quality capability construct the monitor with no channel and stay
/// at the conservative default forever.
#[derive(Debug)]
pub struct NetworkMonitor {
    signal: Option<watch::Receiver<NetworkSignal>>,
}

impl NetworkMonitor {
    pub fn new(signal: Option<watch::Receiver<NetworkSignal>>) -> Self {
        Self { signal }
    }

    /// Monitor for hosts that expose no network-quality API at all.
    pub fn unavailable() -> Self {
        Self { signal: None }
    }

    pub fn current_tier(&self) -> NetworkTier {
        match &self.signal {
            Some(rx) => rx.borrow().tier(),
            None => NetworkTier::Normal,
        }
    }
}
