//! Timer service abstraction and a deterministic virtual clock
//!
//! The engine never sleeps. It asks a [`TimerService`] to deliver a
//! [`TimerToken`] later and reacts when the driver hands the token back via
//! `DrawEngine::fire`. Live sessions back this with tokio tasks; tests and
//! simulations use [`VirtualClock`], which only moves when told to.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a scheduled timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Periodic display flicker while spinning
    SpinTick,
    /// One-shot end of spin, commits the draw
    SpinComplete,
    /// One-shot end of the pause after a completed round
    RoundTransition,
}

/// Token delivered back to the engine when a timer fires.
///
/// `serial` is unique per scheduling, so a token from a cancelled or
/// superseded timer never matches the engine's live handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub serial: u64,
}

/// Cancellation handle returned by a [`TimerService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// One-shot and periodic scheduling with cancellation
pub trait TimerService {
    /// Deliver `token` once after `delay`
    fn after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle;

    /// Deliver `token` every `interval`, first delivery one interval from now
    fn every(&mut self, interval: Duration, token: TimerToken) -> TimerHandle;

    /// Stop a timer. Cancelling a finished or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct Scheduled {
    handle: TimerHandle,
    due: Duration,
    interval: Option<Duration>,
    token: TimerToken,
}

/// Manually advanced clock.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Duration,
    next_handle: u64,
    scheduled: Vec<Scheduled>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Timers still scheduled
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Pop the earliest timer due at or before `until`, moving time to its due point.
    ///
    /// Periodic timers are re-armed one interval later, or dropped when that
    /// would overflow.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerToken> {
        let index = self
            .scheduled
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.handle.0))
            .map(|(i, _)| i)?;

        let entry = &mut self.scheduled[index];
        self.now = self.now.max(entry.due);
        let token = entry.token;
        let interval = entry.interval;

        match interval {
            // A re-arm past the end of time never fires again
            Some(interval) => match self.scheduled[index].due.checked_add(interval) {
                Some(next) => self.scheduled[index].due = next,
                None => {
                    self.scheduled.remove(index);
                }
            },
            None => {
                self.scheduled.remove(index);
            }
        }
        Some(token)
    }

    /// Move time forward without firing anything
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn schedule(&mut self, due: Duration, interval: Option<Duration>, token: TimerToken) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.scheduled.push(Scheduled {
            handle,
            due,
            interval,
            token,
        });
        handle
    }
}

impl TimerService for VirtualClock {
    fn after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        self.schedule(self.now.saturating_add(delay), None, token)
    }

    fn every(&mut self, interval: Duration, token: TimerToken) -> TimerHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.schedule(self.now.saturating_add(interval), Some(interval), token)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.scheduled.retain(|s| s.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TimerKind, serial: u64) -> TimerToken {
        TimerToken { kind, serial }
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut clock = VirtualClock::new();
        clock.after(Duration::from_millis(100), token(TimerKind::SpinComplete, 1));

        assert!(clock.pop_due(Duration::from_millis(99)).is_none());
        let fired = clock.pop_due(Duration::from_millis(100)).unwrap();
        assert_eq!(fired.kind, TimerKind::SpinComplete);
        assert_eq!(clock.now(), Duration::from_millis(100));
        assert!(clock.pop_due(Duration::from_secs(10)).is_none());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_periodic_rearms() {
        let mut clock = VirtualClock::new();
        clock.every(Duration::from_millis(120), token(TimerKind::SpinTick, 1));

        let mut fired = 0;
        while clock.pop_due(Duration::from_millis(600)).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 5);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_same_instant_fires_in_schedule_order() {
        let mut clock = VirtualClock::new();
        clock.every(Duration::from_millis(100), token(TimerKind::SpinTick, 1));
        clock.after(Duration::from_millis(100), token(TimerKind::SpinComplete, 2));

        let until = Duration::from_millis(100);
        assert_eq!(clock.pop_due(until).unwrap().kind, TimerKind::SpinTick);
        assert_eq!(clock.pop_due(until).unwrap().kind, TimerKind::SpinComplete);
    }

    #[test]
    fn test_due_times_saturate() {
        let mut clock = VirtualClock::new();
        clock.set_now(Duration::MAX);
        clock.after(Duration::from_secs(1), token(TimerKind::SpinComplete, 1));
        clock.every(Duration::from_secs(1), token(TimerKind::SpinTick, 2));

        assert_eq!(clock.pop_due(Duration::MAX).unwrap().kind, TimerKind::SpinComplete);
        assert_eq!(clock.pop_due(Duration::MAX).unwrap().kind, TimerKind::SpinTick);
        assert_eq!(clock.now(), Duration::MAX);
        assert!(clock.pop_due(Duration::MAX).is_none());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut clock = VirtualClock::new();
        let handle = clock.every(Duration::from_millis(10), token(TimerKind::SpinTick, 1));
        clock.cancel(handle);
        clock.cancel(handle);
        assert!(clock.pop_due(Duration::from_secs(1)).is_none());
    }
}
