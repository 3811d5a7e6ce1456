#![forbid(unsafe_code)]

use std::fmt;

/// Coarse loading-aggressiveness classification derived from the host's
/// network-quality signal. Never persisted; always recomputed from the
/// current signal.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NetworkTier {
    Restricted,
    Normal,
    Aggressive,
}

impl fmt::Debug for NetworkTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkTier::Restricted => "Restricted",
            NetworkTier::Normal => "Normal",
            NetworkTier::Aggressive => "Aggressive",
        };
        f.write_str(name)
    }
}

/// Effective connection class as reported by the host, mirroring the usual
/// `effectiveType` vocabulary. `Unknown` covers hosts that expose the change
/// notification but not the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectiveType {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    #[default]
    Unknown,
}

/// One sample of the host's network-quality signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkSignal {
    pub effective_type: EffectiveType,
    /// The user's "reduce data usage" preference.
    pub save_data: bool,
}

impl NetworkSignal {
    pub fn tier(&self) -> NetworkTier {
        if self.save_data {
            return NetworkTier::Restricted;
        }
        match self.effective_type {
            EffectiveType::Slow2g | EffectiveType::TwoG => NetworkTier::Restricted,
            EffectiveType::ThreeG => NetworkTier::Normal,
            EffectiveType::FourG | EffectiveType::Unknown => NetworkTier::Aggressive,
        }
    }
}
