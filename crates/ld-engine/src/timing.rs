//! Timing profiles for the spin and round-transition sequence

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile for the draw sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingProfile {
    /// Normal presentation timing
    #[default]
    Normal,
    /// Fast mode
    Turbo,
    /// Studio mode (near-instant, for rehearsals and testing)
    Studio,
    /// Custom timing
    Custom,
}

/// Detailed timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Display flicker cadence while spinning (ms)
    pub tick_interval_ms: u64,

    /// Time from spin start to the committed draw (ms)
    pub spin_duration_ms: u64,

    /// Pause between a round's final winner and the next round (ms)
    pub transition_delay_ms: u64,
}

impl TimingConfig {
    /// Normal presentation timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            tick_interval_ms: 120,
            spin_duration_ms: 3000,
            transition_delay_ms: 2000,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            tick_interval_ms: 60,
            spin_duration_ms: 1200,
            transition_delay_ms: 800,
        }
    }

    /// Studio mode
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            tick_interval_ms: 10,
            spin_duration_ms: 50,
            transition_delay_ms: 20,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster). Intervals never drop below 1 ms.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| ((ms as f64 * factor).round() as u64).max(1);
        Self {
            profile: TimingProfile::Custom,
            tick_interval_ms: scale(self.tick_interval_ms),
            spin_duration_ms: scale(self.spin_duration_ms),
            transition_delay_ms: scale(self.transition_delay_ms),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// Flicker ticks that fit into one spin
    pub fn ticks_per_spin(&self) -> u64 {
        self.spin_duration_ms / self.tick_interval_ms.max(1)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}
