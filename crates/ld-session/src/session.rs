//! Draw Session: single-owner engine task driven by tokio timers

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use ld_engine::{
    DrawConfig, DrawEngine, DrawError, DrawEvent, DrawRange, EffectsSink, EngineSnapshot, Round,
    RoundId, RoundPlan, RoundUpdate, TimerToken, TimingConfig, WinRecord,
};

use crate::timers::TokioTimers;

/// Engine type owned by the session task
pub type SessionEngine = DrawEngine<TokioTimers>;

type Job = Box<dyn FnOnce(&mut SessionEngine) + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

/// Forwards effects as [`DrawEvent`]s; a missing audience is not an error
struct ChannelEffects {
    tx: broadcast::Sender<DrawEvent>,
}

impl EffectsSink for ChannelEffects {
    fn on_tick(&mut self, value: i64) -> anyhow::Result<()> {
        let _ = self.tx.send(DrawEvent::Tick { value });
        Ok(())
    }

    fn on_win(&mut self, record: &WinRecord) -> anyhow::Result<()> {
        let _ = self.tx.send(DrawEvent::Win {
            record: record.clone(),
        });
        Ok(())
    }

    fn on_celebrate(&mut self) -> anyhow::Result<()> {
        let _ = self.tx.send(DrawEvent::Celebrate);
        Ok(())
    }

    fn on_round_complete(&mut self, round: &Round) -> anyhow::Result<()> {
        let _ = self.tx.send(DrawEvent::RoundComplete {
            round: round.clone(),
        });
        Ok(())
    }
}

/// Async handle to a running draw.
///
/// The engine lives in one spawned task; every intent is a message to that
/// task, so callers on any thread see a serialized sequence of transitions.
pub struct DrawSession {
    /// Intents for the engine task
    command_tx: mpsc::Sender<Command>,

    /// Snapshot after every transition
    snapshot_tx: broadcast::Sender<EngineSnapshot>,

    /// Effect notifications
    event_tx: broadcast::Sender<DrawEvent>,

    /// Most recently published snapshot
    latest: Arc<RwLock<EngineSnapshot>>,

    /// Engine task handle
    task: Option<JoinHandle<()>>,
}

impl DrawSession {
    /// Spawn with a default builder. Must be called within a tokio runtime.
    pub fn spawn(plan: RoundPlan) -> Self {
        SessionBuilder::new().plan(plan).spawn()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTENTS
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn initialize(&self, range: DrawRange) -> SessionResult<EngineSnapshot> {
        self.call(move |engine| engine.initialize(range).map(|_| engine.snapshot()))
            .await?
            .map_err(Into::into)
    }

    /// Replace the round plan and initialize in one intent
    pub async fn initialize_with(&self, range: DrawRange, plan: RoundPlan) -> SessionResult<EngineSnapshot> {
        self.call(move |engine| engine.initialize_with(range, plan).map(|_| engine.snapshot()))
            .await?
            .map_err(Into::into)
    }

    pub async fn start_spin(&self) -> SessionResult<EngineSnapshot> {
        self.call(|engine| engine.start_spin().map(|_| engine.snapshot()))
            .await?
            .map_err(Into::into)
    }

    pub async fn reset(&self) -> SessionResult<EngineSnapshot> {
        self.call(|engine| engine.reset().map(|_| engine.snapshot()))
            .await?
            .map_err(Into::into)
    }

    /// Back to configuration; discards the pool and history
    pub async fn enter_configuration(&self) -> SessionResult<EngineSnapshot> {
        self.call(|engine| {
            engine.enter_configuration();
            engine.snapshot()
        })
        .await
    }

    pub async fn add_round(&self, name: impl Into<String>, required_count: u32) -> SessionResult<RoundId> {
        let name = name.into();
        self.call(move |engine| engine.add_round(name, required_count))
            .await?
            .map_err(Into::into)
    }

    pub async fn remove_round(&self, id: RoundId) -> SessionResult<Round> {
        self.call(move |engine| engine.remove_round(id))
            .await?
            .map_err(Into::into)
    }

    pub async fn update_round(&self, id: RoundId, update: RoundUpdate) -> SessionResult<()> {
        self.call(move |engine| engine.update_round(id, update))
            .await?
            .map_err(Into::into)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OBSERVATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fresh snapshot, ordered after every intent sent before it
    pub async fn snapshot(&self) -> SessionResult<EngineSnapshot> {
        self.call(|engine| engine.snapshot()).await
    }

    /// Last published snapshot, without a round trip to the engine task
    pub fn latest_snapshot(&self) -> EngineSnapshot {
        self.latest.read().clone()
    }

    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<EngineSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DrawEvent> {
        self.event_tx.subscribe()
    }

    /// Wait until no spin or round transition is pending
    pub async fn wait_until_settled(&self) -> SessionResult<EngineSnapshot> {
        let mut snapshots = self.snapshot_tx.subscribe();
        let current = self.snapshot().await?;
        if !current.phase.is_busy() {
            return Ok(current);
        }

        loop {
            match snapshots.recv().await {
                Ok(snapshot) if !snapshot.phase.is_busy() => return Ok(snapshot),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("[DrawSession] Snapshot receiver lagged by {}", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SessionError::Closed),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the engine task; pending timers are cancelled
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("[DrawSession] Engine task ended abnormally: {}", e);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════════════

    async fn call<T, F>(&self, f: F) -> SessionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SessionEngine) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let _ = reply_tx.send(f(engine));
        });

        self.command_tx
            .send(Command::Run(job))
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    async fn run(
        mut engine: SessionEngine,
        mut command_rx: mpsc::Receiver<Command>,
        mut fired_rx: mpsc::UnboundedReceiver<TimerToken>,
        snapshot_tx: broadcast::Sender<EngineSnapshot>,
        latest: Arc<RwLock<EngineSnapshot>>,
    ) {
        log::debug!("[DrawSession] Engine task started");

        loop {
            tokio::select! {
                biased;

                // Intents
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(Command::Run(job)) => {
                            job(&mut engine);
                            Self::publish(&engine, &snapshot_tx, &latest);
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }

                // Timers
                Some(token) = fired_rx.recv() => {
                    match engine.fire(token) {
                        Ok(true) => Self::publish(&engine, &snapshot_tx, &latest),
                        Ok(false) => {}
                        Err(e) => {
                            log::error!("[DrawSession] Timer {:?} failed: {}", token.kind, e);
                            Self::publish(&engine, &snapshot_tx, &latest);
                        }
                    }
                }
            }
        }

        engine.dispose();
        log::info!("[DrawSession] Engine task stopped");
    }

    fn publish(
        engine: &SessionEngine,
        snapshot_tx: &broadcast::Sender<EngineSnapshot>,
        latest: &RwLock<EngineSnapshot>,
    ) {
        let snapshot = engine.snapshot();
        *latest.write() = snapshot.clone();
        let _ = snapshot_tx.send(snapshot);
    }
}

impl Drop for DrawSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Session builder
pub struct SessionBuilder {
    plan: RoundPlan,
    timing: TimingConfig,
    seed: Option<u64>,
    channel_capacity: usize,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            plan: RoundPlan::new(),
            timing: TimingConfig::default(),
            seed: None,
            channel_capacity: 256,
        }
    }

    /// Plan, timing and seed from a draw config. The range is passed to `initialize`.
    pub fn from_config(config: &DrawConfig) -> Self {
        Self {
            plan: config.plan(),
            timing: config.timing_config(),
            seed: config.seed,
            channel_capacity: 256,
        }
    }

    pub fn plan(mut self, plan: RoundPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Fixed RNG seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Buffer size of the snapshot and event channels
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Start the engine task. Must be called within a tokio runtime.
    pub fn spawn(self) -> DrawSession {
        let (timers, fired_rx) = TokioTimers::new();
        let (event_tx, _) = broadcast::channel(self.channel_capacity);
        let (snapshot_tx, _) = broadcast::channel(self.channel_capacity);
        let (command_tx, command_rx) = mpsc::channel(64);

        let mut engine = DrawEngine::new(timers)
            .with_plan(self.plan)
            .with_timing(self.timing)
            .with_effects(ChannelEffects {
                tx: event_tx.clone(),
            });
        if let Some(seed) = self.seed {
            engine.seed(seed);
        }

        let latest = Arc::new(RwLock::new(engine.snapshot()));
        let task = tokio::spawn(DrawSession::run(
            engine,
            command_rx,
            fired_rx,
            snapshot_tx.clone(),
            Arc::clone(&latest),
        ));

        DrawSession {
            command_tx,
            snapshot_tx,
            event_tx,
            latest,
            task: Some(task),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error("Draw session is closed")]
    Closed,
}

impl SessionError {
    /// True for benign intent rejections
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Draw(e) if e.is_rejection())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
