//! # ld-session: Async Lucky Draw Session
//!
//! Runs a [`ld_engine::DrawEngine`] inside a single tokio task with real timers.
//!
//! ## Features
//!
//! - Intents from any task, serialized through one command channel
//! - Snapshot broadcast after every transition
//! - Effect events (tick, win, celebrate, round complete) as a stream
//! - Timer tasks aborted on reset, reconfiguration and shutdown

pub mod session;
pub mod timers;

pub use session::*;
pub use timers::*;
