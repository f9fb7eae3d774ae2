//! Tokio-backed timer service
//!
//! Each timer is a spawned task that sleeps and then sends its token on an
//! unbounded channel. Cancelling aborts the task; dropping the service
//! aborts everything still running.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use ld_engine::{TimerHandle, TimerService, TimerToken};

pub struct TokioTimers {
    fired_tx: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<u64, JoinHandle<()>>,
    next_handle: u64,
}

impl TokioTimers {
    /// Create the service and the receiver for fired tokens.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let timers = Self {
            fired_tx,
            tasks: HashMap::new(),
            next_handle: 0,
        };
        (timers, fired_rx)
    }

    /// Tasks not yet cancelled (finished one-shots included until cancelled)
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    fn register(&mut self, task: JoinHandle<()>) -> TimerHandle {
        self.next_handle += 1;
        self.tasks.insert(self.next_handle, task);
        TimerHandle(self.next_handle)
    }
}

impl TimerService for TokioTimers {
    fn after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        let tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(token);
        });
        self.register(task)
    }

    fn every(&mut self, interval: Duration, token: TimerToken) -> TimerHandle {
        let tx = self.fired_tx.clone();
        let period = interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            // A first tick beyond the end of time never fires
            let Some(start) = Instant::now().checked_add(period) else {
                return;
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(token).is_err() {
                    break;
                }
            }
        });
        self.register(task)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle.0) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
