//! Number pool: the not-yet-drawn candidates
//!
//! The pool never materializes its range. Slot `i` holds `min + i` unless a
//! draw moved another number there, so memory grows with draws, not with
//! the size of the range.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::selector::{RandomSource, pick_index};

/// Inclusive numeric range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawRange {
    pub min: i64,
    pub max: i64,
}

impl DrawRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Count of integers in the range, or an error for inverted ranges.
    ///
    /// Saturates at `u64::MAX` for the full `i64` range.
    pub fn size(&self) -> DrawResult<u64> {
        let size = self.exact_size()?;
        Ok(u64::try_from(size).unwrap_or(u64::MAX))
    }

    fn exact_size(&self) -> DrawResult<i128> {
        if self.min > self.max {
            return Err(DrawError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(self.max as i128 - self.min as i128 + 1)
    }
}

impl Default for DrawRange {
    fn default() -> Self {
        Self { min: 1, max: 100 }
    }
}

/// Remaining candidates of a draw.
///
/// Only shrinks: every [`take`](Self::take) removes exactly one number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberPool {
    base: i64,
    len: usize,
    initial_size: usize,
    /// Live slots (`< len`) whose number is not `base + slot`
    moved: HashMap<usize, i64>,
}

impl NumberPool {
    /// Pool holding every integer of `range`
    pub fn from_range(range: DrawRange) -> DrawResult<Self> {
        let exact = range.exact_size()?;
        let len = usize::try_from(exact).map_err(|_| DrawError::RangeTooLarge {
            size: u64::try_from(exact).unwrap_or(u64::MAX),
            limit: usize::MAX as u64,
        })?;

        Ok(Self {
            base: range.min,
            len,
            initial_size: len,
            moved: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size at creation
    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    pub fn contains(&self, number: i64) -> bool {
        let offset = number as i128 - self.base as i128;
        if offset < 0 || offset >= self.initial_size as i128 {
            return false;
        }

        let home = offset as usize;
        if home < self.len && !self.moved.contains_key(&home) {
            return true;
        }
        self.moved.values().any(|&n| n == number)
    }

    /// Look at a random remaining number without removing it
    pub fn peek_random<R: RandomSource + ?Sized>(&self, rng: &mut R) -> DrawResult<i64> {
        let slot = pick_index(self.len, rng)?;
        Ok(self.number_at(slot))
    }

    /// Remove and return a random remaining number
    pub fn take_random<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> DrawResult<i64> {
        let slot = pick_index(self.len, rng)?;
        Ok(self.take(slot))
    }

    fn number_at(&self, slot: usize) -> i64 {
        match self.moved.get(&slot) {
            Some(&number) => number,
            None => self.base.wrapping_add_unsigned(slot as u64),
        }
    }

    /// Remove the number at `slot`, moving the last number into its place
    fn take(&mut self, slot: usize) -> i64 {
        let last = self.len - 1;
        let number = self.number_at(slot);
        let last_number = self.number_at(last);

        self.moved.remove(&last);
        if slot != last {
            self.moved.insert(slot, last_number);
        }
        self.len = last;
        number
    }
}
