//! Round plan: the ordered stages of a draw

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::history::HistoryLedger;

/// Stable round identifier, unique within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One sequential stage requiring a fixed number of winners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// Display label
    pub name: String,
    /// Winners needed before the next round may begin
    pub required_count: u32,
}

/// Configuration-time edit of a single round field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundUpdate {
    Name(String),
    RequiredCount(u32),
}

/// Drawn-versus-required tally for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProgress {
    pub round_id: RoundId,
    pub name: String,
    pub drawn: u32,
    pub required: u32,
    pub is_complete: bool,
}

/// Ordered list of rounds. Order defines draw sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    rounds: Vec<Round>,
    next_id: u64,
}

impl RoundPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan from `(name, required_count)` pairs
    pub fn from_specs<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut plan = Self::new();
        for (name, count) in specs {
            plan.add_round(name, count);
        }
        plan
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EDITING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Append a round; ids are never reused
    pub fn add_round(&mut self, name: impl Into<String>, required_count: u32) -> RoundId {
        self.next_id += 1;
        let id = RoundId(self.next_id);
        self.rounds.push(Round {
            id,
            name: name.into(),
            required_count,
        });
        id
    }

    pub fn remove_round(&mut self, id: RoundId) -> DrawResult<Round> {
        let index = self
            .rounds
            .iter()
            .position(|r| r.id == id)
            .ok_or(DrawError::UnknownRound(id))?;
        Ok(self.rounds.remove(index))
    }

    pub fn update_round(&mut self, id: RoundId, update: RoundUpdate) -> DrawResult<&Round> {
        let round = self
            .rounds
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DrawError::UnknownRound(id))?;

        match update {
            RoundUpdate::Name(name) => round.name = name,
            RoundUpdate::RequiredCount(count) => round.required_count = count,
        }
        Ok(round)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn get(&self, id: RoundId) -> Option<&Round> {
        self.rounds.iter().find(|r| r.id == id)
    }

    /// Round at `index`, `None` once every round is done
    pub fn current_round(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }

    /// Sum of required winners across all rounds
    pub fn total_required(&self) -> u64 {
        self.rounds.iter().map(|r| r.required_count as u64).sum()
    }

    /// Check the plan can be played out of a pool of `pool_size` numbers.
    ///
    /// Rejects an empty plan and zero-count rounds before the capacity check.
    pub fn validate(&self, pool_size: u64) -> DrawResult<()> {
        if self.rounds.is_empty() {
            return Err(DrawError::EmptyPlan);
        }
        if let Some(round) = self.rounds.iter().find(|r| r.required_count == 0) {
            return Err(DrawError::ZeroCountRound(round.id));
        }

        let required = self.total_required();
        if required > pool_size {
            return Err(DrawError::InsufficientPool {
                required,
                available: pool_size,
            });
        }
        Ok(())
    }

    pub fn progress_of(&self, round: &Round, history: &HistoryLedger) -> RoundProgress {
        let drawn = history.count_for_round(round.id) as u32;
        RoundProgress {
            round_id: round.id,
            name: round.name.clone(),
            drawn,
            required: round.required_count,
            is_complete: drawn >= round.required_count,
        }
    }

    /// Progress of every round, in plan order
    pub fn progress(&self, history: &HistoryLedger) -> Vec<RoundProgress> {
        self.rounds
            .iter()
            .map(|r| self.progress_of(r, history))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::WinRecord;

    fn prize_plan() -> RoundPlan {
        RoundPlan::from_specs([("Third Prize", 3), ("Second Prize", 2), ("First Prize", 1)])
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let mut plan = prize_plan();
        let ids: Vec<_> = plan.rounds().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RoundId(1), RoundId(2), RoundId(3)]);

        plan.remove_round(RoundId(3)).unwrap();
        let added = plan.add_round("Grand Prize", 1);
        assert_eq!(added, RoundId(4));
    }

    #[test]
    fn test_validate_capacity() {
        let plan = prize_plan();
        assert_eq!(plan.total_required(), 6);
        assert!(plan.validate(6).is_ok());
        assert!(matches!(
            plan.validate(5),
            Err(DrawError::InsufficientPool {
                required: 6,
                available: 5
            })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_and_zero_rounds() {
        assert!(matches!(
            RoundPlan::new().validate(10),
            Err(DrawError::EmptyPlan)
        ));

        let plan = RoundPlan::from_specs([("A", 1), ("B", 0)]);
        assert!(matches!(
            plan.validate(10),
            Err(DrawError::ZeroCountRound(RoundId(2)))
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let mut plan = prize_plan();
        plan.update_round(RoundId(1), RoundUpdate::Name("Consolation".into()))
            .unwrap();
        plan.update_round(RoundId(1), RoundUpdate::RequiredCount(5))
            .unwrap();

        let round = plan.get(RoundId(1)).unwrap();
        assert_eq!(round.name, "Consolation");
        assert_eq!(round.required_count, 5);

        assert!(matches!(
            plan.update_round(RoundId(42), RoundUpdate::RequiredCount(1)),
            Err(DrawError::UnknownRound(RoundId(42)))
        ));

        let removed = plan.remove_round(RoundId(2)).unwrap();
        assert_eq!(removed.name, "Second Prize");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.current_round(1).unwrap().name, "First Prize");
        assert!(plan.current_round(2).is_none());
    }

    #[test]
    fn test_progress_counts_matching_records() {
        let plan = prize_plan();
        let mut history = HistoryLedger::new();
        let third = plan.current_round(0).unwrap();
        history.record(WinRecord::now(7, third));
        history.record(WinRecord::now(9, third));

        let progress = plan.progress_of(third, &history);
        assert_eq!(progress.drawn, 2);
        assert_eq!(progress.required, 3);
        assert!(!progress.is_complete);

        let second = plan.current_round(1).unwrap();
        assert_eq!(plan.progress_of(second, &history).drawn, 0);
    }
}
