//! Engine phases and the read-only snapshot handed to presentation layers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::history::WinRecord;
use crate::round::{Round, RoundProgress};

/// Draw state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Configuring; the only phase that accepts round edits
    #[default]
    Idle,
    /// Pool built, waiting for a spin
    Ready,
    /// Flicker animation running, commit pending
    Spinning,
    /// Winner shown, current round still needs winners
    Revealed,
    /// Round just completed, pause before the next one
    Transitioning,
    /// Every round completed
    Finished,
}

impl Phase {
    /// A timer-driven step is pending
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Spinning | Self::Transitioning)
    }

    pub fn accepts_spin(&self) -> bool {
        matches!(self, Self::Ready | Self::Revealed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Spinning => "spinning",
            Self::Revealed => "revealed",
            Self::Transitioning => "transitioning",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Value on the big display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayValue {
    /// Placeholder shown before the first spin
    #[default]
    Unknown,
    Number(i64),
}

impl DisplayValue {
    pub fn number(&self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::Number(n) => Some(*n),
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("?"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Read-only view of the engine after a transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub phase: Phase,
    /// Equals the round count once every round is done
    pub current_round_index: usize,
    pub current_round: Option<Round>,
    pub rounds: Vec<RoundProgress>,
    /// Numbers still in the pool
    pub remaining: usize,
    /// Pool size at initialization
    pub pool_size: usize,
    pub displayed: DisplayValue,
    /// Newest first
    pub history: Vec<WinRecord>,
}

impl EngineSnapshot {
    pub fn total_drawn(&self) -> usize {
        self.history.len()
    }

    pub fn latest_winner(&self) -> Option<&WinRecord> {
        self.history.first()
    }

    pub fn to_json(&self) -> DrawResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DrawError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_predicates() {
        assert!(Phase::Ready.accepts_spin());
        assert!(Phase::Revealed.accepts_spin());
        for phase in [Phase::Idle, Phase::Spinning, Phase::Transitioning, Phase::Finished] {
            assert!(!phase.accepts_spin());
        }
        assert!(Phase::Spinning.is_busy());
        assert!(Phase::Transitioning.is_busy());
        assert!(!Phase::Revealed.is_busy());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(DisplayValue::Unknown.to_string(), "?");
        assert_eq!(DisplayValue::Number(-3).to_string(), "-3");
        assert_eq!(DisplayValue::Number(8).number(), Some(8));
    }
}
