//! Effects sink: sound, confetti and other fire-and-forget side effects

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::history::WinRecord;
use crate::round::Round;

/// Receiver of presentation side effects.
///
/// The engine never waits on these and only logs returned errors.
pub trait EffectsSink: Send {
    /// A cosmetic flicker value was shown
    fn on_tick(&mut self, _value: i64) -> anyhow::Result<()> {
        Ok(())
    }

    /// A winner was committed
    fn on_win(&mut self, _record: &WinRecord) -> anyhow::Result<()> {
        Ok(())
    }

    /// Celebration (confetti) for a committed winner
    fn on_celebrate(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// A round reached its winner count and the transition pause elapsed
    fn on_round_complete(&mut self, _round: &Round) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ignores every effect
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEffects;

impl EffectsSink for NullEffects {}

/// Effect notification as data, for sinks that forward or record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawEvent {
    Tick { value: i64 },
    Win { record: WinRecord },
    Celebrate,
    RoundComplete { round: Round },
}

impl DrawEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Win { .. } => "win",
            Self::Celebrate => "celebrate",
            Self::RoundComplete { .. } => "round_complete",
        }
    }
}

/// Records every effect into a shared list. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct RecordingEffects {
    events: Arc<Mutex<Vec<DrawEvent>>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DrawEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events of one type
    pub fn count(&self, type_name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.type_name() == type_name)
            .count()
    }

    fn push(&self, event: DrawEvent) -> anyhow::Result<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

impl EffectsSink for RecordingEffects {
    fn on_tick(&mut self, value: i64) -> anyhow::Result<()> {
        self.push(DrawEvent::Tick { value })
    }

    fn on_win(&mut self, record: &WinRecord) -> anyhow::Result<()> {
        self.push(DrawEvent::Win {
            record: record.clone(),
        })
    }

    fn on_celebrate(&mut self) -> anyhow::Result<()> {
        self.push(DrawEvent::Celebrate)
    }

    fn on_round_complete(&mut self, round: &Round) -> anyhow::Result<()> {
        self.push(DrawEvent::RoundComplete {
            round: round.clone(),
        })
    }
}
