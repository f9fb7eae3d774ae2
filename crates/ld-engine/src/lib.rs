//! # ld-engine: Lucky Draw Engine
//!
//! Draws unique numbers from a range across sequential rounds, with a timed
//! spin / reveal / transition sequence for presentation layers.
//!
//! ## Features
//!
//! - **Number Pool**: every number is drawn at most once
//! - **Round Plan**: ordered rounds, each needing a fixed number of winners
//! - **History Ledger**: newest-first record of winners, per-round views
//! - **Timed Engine**: flicker ticks, delayed commit, round transitions
//! - **Timer Abstraction**: virtual clock for tests, pluggable live timers
//!
//! ## Architecture
//!
//! ```text
//! DrawEngine
//!     │
//!     ├── RoundPlan (rounds, validation)
//!     ├── NumberPool (remaining numbers)
//!     ├── HistoryLedger (WinRecords)
//!     └── TimerService (tick / commit / transition timers)
//!           │
//!           v
//!     EngineSnapshot + effects (tick, win, celebrate, round complete)
//! ```

pub mod clock;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod history;
pub mod pool;
pub mod round;
pub mod selector;
pub mod state;
pub mod timing;

pub use clock::*;
pub use config::*;
pub use effects::*;
pub use engine::*;
pub use error::*;
pub use history::*;
pub use pool::*;
pub use round::*;
pub use selector::*;
pub use state::*;
pub use timing::*;
