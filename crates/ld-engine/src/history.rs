//! History Ledger
//!
//! Append-only record of committed winners:
//! - Newest-first ordering across the whole draw
//! - Per-round views in draw order
//! - JSON export

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::round::{Round, RoundId};

// ============ Win Record ============

/// One committed winner. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub number: i64,
    pub round_id: RoundId,
    pub round_name: String,
    pub timestamp: DateTime<Utc>,
}

impl WinRecord {
    /// Record `number` as a winner of `round`, stamped with the current time
    pub fn now(number: i64, round: &Round) -> Self {
        Self {
            number,
            round_id: round.id,
            round_name: round.name.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

// ============ History Ledger ============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLedger {
    /// Newest first
    records: VecDeque<WinRecord>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a record
    pub fn record(&mut self, record: WinRecord) {
        self.records.push_front(record);
    }

    /// Records of one round, oldest first
    pub fn all_for_round(&self, round_id: RoundId) -> Vec<&WinRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.round_id == round_id)
            .collect()
    }

    pub fn count_for_round(&self, round_id: RoundId) -> usize {
        self.records
            .iter()
            .filter(|r| r.round_id == round_id)
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent winner
    pub fn latest(&self) -> Option<&WinRecord> {
        self.records.front()
    }

    /// Newest-first iteration
    pub fn iter(&self) -> impl Iterator<Item = &WinRecord> {
        self.records.iter()
    }

    /// Every drawn number, newest first
    pub fn numbers(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.number).collect()
    }

    pub fn to_vec(&self) -> Vec<WinRecord> {
        self.records.iter().cloned().collect()
    }

    /// Only the engine clears the ledger, as part of a full reset
    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Export as pretty JSON (newest first)
    pub fn to_json(&self) -> DrawResult<String> {
        serde_json::to_string_pretty(&self.records)
            .map_err(|e| DrawError::Serialization(e.to_string()))
    }
}
