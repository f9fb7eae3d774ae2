//! Error types for the draw engine

use thiserror::Error;

use crate::round::RoundId;

/// Why an intent was turned away.
///
/// Rejections are benign: the engine state is left exactly as it was and
/// the caller may surface the reason as a notice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("the draw has not been initialized")]
    NotInitialized,

    #[error("a spin is already in progress")]
    AlreadySpinning,

    #[error("a round transition is in progress")]
    Transitioning,

    #[error("all rounds are finished")]
    Finished,

    #[error("no numbers remain in the pool")]
    PoolExhausted,

    #[error("there is no active round")]
    NoCurrentRound,

    #[error("rounds can only be edited while configuring")]
    PlanLocked,
}

/// Core error type
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Insufficient pool: {required} winners requested but the range holds {available} numbers")]
    InsufficientPool { required: u64, available: u64 },

    #[error("Invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },

    #[error("Range too large: {size} numbers exceeds the limit of {limit}")]
    RangeTooLarge { size: u64, limit: u64 },

    #[error("Round plan is empty")]
    EmptyPlan,

    #[error("Round {0} requires zero winners")]
    ZeroCountRound(RoundId),

    #[error("Invalid round '{0}': expected NAME=COUNT")]
    InvalidRoundSpec(String),

    #[error("Unknown round: {0}")]
    UnknownRound(RoundId),

    #[error("Intent rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Selection from an empty pool")]
    EmptyPoolSelection,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrawError {
    /// True for benign intent rejections (as opposed to validation or logic errors)
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The rejection reason, if this is one
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(r) => Some(*r),
            _ => None,
        }
    }
}

/// Result type alias
pub type DrawResult<T> = Result<T, DrawError>;
