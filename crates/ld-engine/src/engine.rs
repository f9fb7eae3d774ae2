//! Draw Engine: the spin / reveal / transition state machine

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::{TimerHandle, TimerKind, TimerService, TimerToken, VirtualClock};
use crate::effects::{EffectsSink, NullEffects};
use crate::error::{DrawError, DrawResult, Rejection};
use crate::history::{HistoryLedger, WinRecord};
use crate::pool::{DrawRange, NumberPool};
use crate::round::{Round, RoundId, RoundPlan, RoundUpdate};
use crate::selector::RandomSource;
use crate::state::{DisplayValue, EngineSnapshot, Phase};
use crate::timing::TimingConfig;

#[derive(Debug, Clone, Copy)]
struct LiveTimer {
    handle: TimerHandle,
    serial: u64,
}

/// Live timer per kind. At most one of each exists at a time.
#[derive(Debug, Default)]
struct ActiveTimers {
    tick: Option<LiveTimer>,
    spin_complete: Option<LiveTimer>,
    transition: Option<LiveTimer>,
}

impl ActiveTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<LiveTimer> {
        match kind {
            TimerKind::SpinTick => &mut self.tick,
            TimerKind::SpinComplete => &mut self.spin_complete,
            TimerKind::RoundTransition => &mut self.transition,
        }
    }
}

/// Lucky draw engine
///
/// Owns the pool, the round plan and the history ledger. All mutation goes
/// through intents (`initialize`, `start_spin`, `reset`, round edits) and
/// through [`fire`](Self::fire), which the timer driver calls with tokens
/// previously handed to the [`TimerService`].
pub struct DrawEngine<T: TimerService, R: RandomSource = StdRng> {
    /// Rounds to play, in order
    plan: RoundPlan,
    /// Range of the last successful initialize
    range: Option<DrawRange>,
    phase: Phase,
    current_round_index: usize,
    pool: NumberPool,
    history: HistoryLedger,
    displayed: DisplayValue,
    timing: TimingConfig,
    timers: T,
    active: ActiveTimers,
    next_serial: u64,
    effects: Box<dyn EffectsSink>,
    rng: R,
}

impl<T: TimerService> DrawEngine<T, StdRng> {
    /// Create an engine seeded from the OS
    pub fn new(timers: T) -> Self {
        Self::with_rng(timers, StdRng::from_os_rng())
    }

    /// Seed RNG for reproducible draws
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl<T: TimerService, R: RandomSource> DrawEngine<T, R> {
    pub fn with_rng(timers: T, rng: R) -> Self {
        Self {
            plan: RoundPlan::new(),
            range: None,
            phase: Phase::Idle,
            current_round_index: 0,
            pool: NumberPool::default(),
            history: HistoryLedger::new(),
            displayed: DisplayValue::Unknown,
            timing: TimingConfig::default(),
            timers,
            active: ActiveTimers::default(),
            next_serial: 0,
            effects: Box::new(NullEffects),
            rng,
        }
    }

    pub fn with_plan(mut self, plan: RoundPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_effects(mut self, effects: impl EffectsSink + 'static) -> Self {
        self.effects = Box::new(effects);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.plan.current_round(self.current_round_index)
    }

    pub fn plan(&self) -> &RoundPlan {
        &self.plan
    }

    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn displayed(&self) -> DisplayValue {
        self.displayed
    }

    pub fn range(&self) -> Option<DrawRange> {
        self.range
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            current_round_index: self.current_round_index,
            current_round: self.current_round().cloned(),
            rounds: self.plan.progress(&self.history),
            remaining: self.pool.len(),
            pool_size: self.pool.initial_size(),
            displayed: self.displayed,
            history: self.history.to_vec(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION (Idle only)
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn add_round(&mut self, name: impl Into<String>, required_count: u32) -> DrawResult<RoundId> {
        self.ensure_configuring()?;
        Ok(self.plan.add_round(name, required_count))
    }

    pub fn remove_round(&mut self, id: RoundId) -> DrawResult<Round> {
        self.ensure_configuring()?;
        self.plan.remove_round(id)
    }

    pub fn update_round(&mut self, id: RoundId, update: RoundUpdate) -> DrawResult<()> {
        self.ensure_configuring()?;
        self.plan.update_round(id, update)?;
        Ok(())
    }

    fn ensure_configuring(&self) -> DrawResult<()> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(self.reject(Rejection::PlanLocked))
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Build a fresh pool for `range` and start at round 0.
    ///
    /// On failure nothing changes, including a spin in flight.
    pub fn initialize(&mut self, range: DrawRange) -> DrawResult<()> {
        let size = range.size()?;
        self.plan.validate(size)?;
        let pool = NumberPool::from_range(range)?;

        self.cancel_all();
        self.range = Some(range);
        self.pool = pool;
        self.history.clear();
        self.current_round_index = 0;
        self.displayed = DisplayValue::Unknown;
        self.phase = Phase::Ready;

        log::info!(
            "[DrawEngine] Initialized [{}, {}]: {} numbers, {} rounds, {} winners",
            range.min,
            range.max,
            self.pool.len(),
            self.plan.len(),
            self.plan.total_required()
        );
        Ok(())
    }

    /// Install `plan` and initialize. On failure the previous plan stays.
    pub fn initialize_with(&mut self, range: DrawRange, plan: RoundPlan) -> DrawResult<()> {
        let previous = std::mem::replace(&mut self.plan, plan);
        if let Err(e) = self.initialize(range) {
            self.plan = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Initialize again with the last range
    pub fn reset(&mut self) -> DrawResult<()> {
        let range = self
            .range
            .ok_or_else(|| self.reject(Rejection::NotInitialized))?;
        log::info!("[DrawEngine] Reset");
        self.initialize(range)
    }

    /// Return to configuration, discarding the pool and history
    pub fn enter_configuration(&mut self) {
        self.cancel_all();
        self.pool = NumberPool::default();
        self.history.clear();
        self.current_round_index = 0;
        self.displayed = DisplayValue::Unknown;
        self.phase = Phase::Idle;
        log::info!("[DrawEngine] Configuring");
    }

    /// Cancel every outstanding timer. Also done on drop.
    pub fn dispose(&mut self) {
        self.cancel_all();
        log::debug!("[DrawEngine] Disposed in phase {}", self.phase);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Begin a spin cycle: flicker ticks now, committed draw after the spin duration
    pub fn start_spin(&mut self) -> DrawResult<()> {
        if !self.phase.accepts_spin() {
            let rejection = match self.phase {
                Phase::Idle => Rejection::NotInitialized,
                Phase::Spinning => Rejection::AlreadySpinning,
                Phase::Transitioning => Rejection::Transitioning,
                _ => Rejection::Finished,
            };
            return Err(self.reject(rejection));
        }
        if self.pool.is_empty() {
            return Err(self.reject(Rejection::PoolExhausted));
        }
        if self.current_round().is_none() {
            return Err(self.reject(Rejection::NoCurrentRound));
        }

        self.phase = Phase::Spinning;
        self.schedule(TimerKind::SpinTick);
        self.schedule(TimerKind::SpinComplete);

        log::debug!(
            "[DrawEngine] Spin started for round {} ({} numbers left, {} ticks)",
            self.current_round_index,
            self.pool.len(),
            self.timing.ticks_per_spin()
        );
        Ok(())
    }

    /// Deliver a fired timer.
    ///
    /// Returns `Ok(false)` for tokens of cancelled or superseded timers,
    /// which are ignored.
    pub fn fire(&mut self, token: TimerToken) -> DrawResult<bool> {
        let live = match *self.active.slot(token.kind) {
            Some(live) if live.serial == token.serial => live,
            _ => {
                log::trace!("[DrawEngine] Ignoring stale timer {:?}", token);
                return Ok(false);
            }
        };

        match token.kind {
            TimerKind::SpinTick => self.tick()?,
            TimerKind::SpinComplete => {
                self.release(TimerKind::SpinComplete, live);
                self.commit_draw()?;
            }
            TimerKind::RoundTransition => {
                self.release(TimerKind::RoundTransition, live);
                self.finish_transition();
            }
        }
        Ok(true)
    }

    /// Cosmetic flicker: show a random remaining number, remove nothing
    fn tick(&mut self) -> DrawResult<()> {
        let value = self.pool.peek_random(&mut self.rng)?;
        self.displayed = DisplayValue::Number(value);
        self.notify(|fx| fx.on_tick(value));
        Ok(())
    }

    /// Authoritative draw, independent of the last flicker value
    fn commit_draw(&mut self) -> DrawResult<()> {
        if let Some(tick) = self.active.tick.take() {
            self.timers.cancel(tick.handle);
        }

        let Some(round) = self.current_round().cloned() else {
            log::error!("[DrawEngine] Commit without an active round");
            self.phase = Phase::Finished;
            return Err(DrawError::Rejected(Rejection::NoCurrentRound));
        };

        let number = match self.pool.take_random(&mut self.rng) {
            Ok(number) => number,
            Err(e) => {
                log::error!("[DrawEngine] Commit failed: {}", e);
                self.phase = Phase::Ready;
                return Err(e);
            }
        };

        let record = WinRecord::now(number, &round);
        self.history.record(record.clone());
        self.displayed = DisplayValue::Number(number);
        self.phase = Phase::Revealed;

        log::info!(
            "[DrawEngine] {} winner: {} ({} numbers left)",
            round.name,
            number,
            self.pool.len()
        );

        self.notify(|fx| fx.on_win(&record));
        self.notify(|fx| fx.on_celebrate());

        let drawn = self.history.count_for_round(round.id);
        if drawn >= round.required_count as usize {
            self.phase = Phase::Transitioning;
            self.schedule(TimerKind::RoundTransition);
            log::debug!("[DrawEngine] Round {} complete", round.name);
        }
        Ok(())
    }

    fn finish_transition(&mut self) {
        if let Some(round) = self.current_round().cloned() {
            self.notify(|fx| fx.on_round_complete(&round));
        }

        self.current_round_index = (self.current_round_index + 1).min(self.plan.len());
        self.phase = if self.current_round_index < self.plan.len() {
            Phase::Ready
        } else {
            log::info!(
                "[DrawEngine] All rounds finished, {} winners drawn",
                self.history.total_count()
            );
            Phase::Finished
        };
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════════════

    fn schedule(&mut self, kind: TimerKind) {
        self.next_serial += 1;
        let token = TimerToken {
            kind,
            serial: self.next_serial,
        };
        let handle = match kind {
            TimerKind::SpinTick => self.timers.every(self.timing.tick_interval(), token),
            TimerKind::SpinComplete => self.timers.after(self.timing.spin_duration(), token),
            TimerKind::RoundTransition => self.timers.after(self.timing.transition_delay(), token),
        };

        let previous = self.active.slot(kind).replace(LiveTimer {
            handle,
            serial: token.serial,
        });
        if let Some(previous) = previous {
            self.timers.cancel(previous.handle);
        }
    }

    /// Forget a one-shot that just fired
    fn release(&mut self, kind: TimerKind, live: LiveTimer) {
        *self.active.slot(kind) = None;
        self.timers.cancel(live.handle);
    }

    fn cancel_all(&mut self) {
        for kind in [
            TimerKind::SpinTick,
            TimerKind::SpinComplete,
            TimerKind::RoundTransition,
        ] {
            if let Some(live) = self.active.slot(kind).take() {
                self.timers.cancel(live.handle);
            }
        }
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn EffectsSink) -> anyhow::Result<()>) {
        if let Err(e) = f(self.effects.as_mut()) {
            log::warn!("[DrawEngine] Effect failed: {:#}", e);
        }
    }

    fn reject(&self, rejection: Rejection) -> DrawError {
        log::debug!("[DrawEngine] Rejected in phase {}: {}", self.phase, rejection);
        DrawError::Rejected(rejection)
    }
}

impl<T: TimerService, R: RandomSource> Drop for DrawEngine<T, R> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL TIME DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

impl<R: RandomSource> DrawEngine<VirtualClock, R> {
    /// Move virtual time forward, firing everything that falls due
    pub fn advance(&mut self, by: Duration) -> DrawResult<()> {
        let target = self.timers.now().saturating_add(by);
        while let Some(token) = self.timers.pop_due(target) {
            self.fire(token)?;
        }
        self.timers.set_now(target);
        Ok(())
    }

    /// Fire timers until no spin or transition is pending
    pub fn run_until_settled(&mut self) -> DrawResult<()> {
        while self.phase.is_busy() {
            let Some(token) = self.timers.pop_due(Duration::MAX) else {
                break;
            };
            self.fire(token)?;
        }
        Ok(())
    }

    /// Spin and let the spin (and any round transition) play out
    pub fn spin_to_completion(&mut self) -> DrawResult<()> {
        self.start_spin()?;
        self.run_until_settled()
    }
}
