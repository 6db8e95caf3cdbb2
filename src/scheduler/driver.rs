//! Live update driver: one task per feed

use super::state::{ConnectionMode, FeedState};
use crate::error::ErrorKind;
use crate::feed::{PriceSnapshot, PriceSource, PriceStream, StreamEvent};
use crate::telemetry::{incr_counter, record_fetch_latency, set_price_gauge, FeedCounter};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timing for one scheduler
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl SchedulerConfig {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// A control command could not be delivered
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler for {0} has terminated")]
    Terminated(String),

    #[error("no scheduler for feed {0}")]
    UnknownFeed(String),
}

enum Command {
    SetManual(Decimal),
    Rearm,
}

/// Where the driver goes next; `None` from a phase stops the task
enum Phase {
    Init,
    Streaming(PriceStream),
    Polling,
    Manual,
}

/// Spawns live update drivers
pub struct LiveScheduler {
    source: Arc<dyn PriceSource>,
    config: SchedulerConfig,
    state: Arc<watch::Sender<FeedState>>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl LiveScheduler {
    /// Start keeping `source` fresh; the returned handle owns the task
    pub fn spawn(source: Arc<dyn PriceSource>, config: SchedulerConfig) -> SchedulerHandle {
        let id = source.id().to_string();
        let (state_tx, state_rx) = watch::channel(FeedState::new());
        let state_tx = Arc::new(state_tx);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let driver = LiveScheduler {
            source,
            config,
            state: state_tx.clone(),
            commands: cmd_rx,
        };
        let task = tokio::spawn(driver.run());

        tracing::debug!(feed = %id, poll_secs = config.poll_interval.as_secs(), "Scheduler spawned");

        SchedulerHandle {
            id,
            state_tx,
            state_rx,
            commands: cmd_tx,
            task,
        }
    }

    fn id(&self) -> &str {
        self.source.id()
    }

    async fn run(mut self) {
        let mut phase = Phase::Init;
        loop {
            let next = match phase {
                Phase::Init => Some(self.connect().await),
                Phase::Streaming(stream) => self.stream(stream).await,
                Phase::Polling => self.poll().await,
                Phase::Manual => self.manual().await,
            };
            match next {
                Some(p) => phase = p,
                None => break,
            }
        }
        tracing::debug!(feed = %self.id(), "Scheduler stopped");
    }

    /// Try to open the push stream; any failure degrades to polling silently
    async fn connect(&mut self) -> Phase {
        self.publish(|s| s.mode = ConnectionMode::Init);

        let subscribed =
            tokio::time::timeout(self.config.request_timeout, self.source.subscribe()).await;

        match subscribed {
            Ok(Ok(Some(stream))) => Phase::Streaming(stream),
            Ok(Ok(None)) => Phase::Polling,
            Ok(Err(e)) => {
                tracing::info!(feed = %self.id(), error = %e, "Stream unavailable, polling instead");
                Phase::Polling
            }
            Err(_) => {
                tracing::info!(feed = %self.id(), "Stream subscribe timed out, polling instead");
                Phase::Polling
            }
        }
    }

    async fn stream(&mut self, mut stream: PriceStream) -> Option<Phase> {
        self.publish(|s| s.mode = ConnectionMode::Streaming);
        tracing::info!(feed = %self.id(), "Streaming");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => return self.on_command(cmd),
                event = stream.next() => match event {
                    StreamEvent::Snapshot(snapshot) => {
                        incr_counter(FeedCounter::StreamMessage, self.id());
                        self.apply(snapshot);
                    }
                    StreamEvent::Heartbeat => {
                        tracing::trace!(feed = %self.id(), "Heartbeat");
                    }
                    StreamEvent::Malformed(e) => {
                        incr_counter(FeedCounter::StreamMalformed, self.id());
                        tracing::warn!(feed = %self.id(), error = %e, "Dropping malformed stream message");
                    }
                    StreamEvent::Closed(reason) => {
                        incr_counter(FeedCounter::StreamFallback, self.id());
                        match reason {
                            Some(e) => tracing::warn!(feed = %self.id(), error = %e, "Stream lost, falling back to polling"),
                            None => tracing::info!(feed = %self.id(), "Stream ended, falling back to polling"),
                        }
                        return Some(Phase::Polling);
                    }
                },
            }
        }
    }

    async fn poll(&mut self) -> Option<Phase> {
        self.publish(|s| s.mode = ConnectionMode::Polling);
        tracing::info!(feed = %self.id(), period_secs = self.config.poll_interval.as_secs(), "Polling");

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => return self.on_command(cmd),
                _ = interval.tick() => self.refresh().await,
            }
        }
    }

    async fn manual(&mut self) -> Option<Phase> {
        loop {
            match self.commands.recv().await {
                Some(Command::SetManual(value)) => self.set_manual(value),
                Some(Command::Rearm) => return Some(Phase::Init),
                None => return None,
            }
        }
    }

    /// One bounded fetch; failures mark the state without touching the value
    async fn refresh(&mut self) {
        let started = Instant::now();
        let result =
            tokio::time::timeout(self.config.request_timeout, self.source.fetch_once()).await;
        record_fetch_latency(self.id(), started.elapsed());

        match result {
            Ok(Ok(snapshot)) => {
                incr_counter(FeedCounter::Refresh, self.id());
                self.apply(snapshot);
            }
            Ok(Err(e)) => {
                incr_counter(FeedCounter::RefreshFailure, self.id());
                tracing::warn!(feed = %self.id(), error = %e, "Refresh failed, keeping last value");
                self.publish(|s| s.record_failure(e.kind()));
            }
            Err(_) => {
                incr_counter(FeedCounter::RefreshFailure, self.id());
                tracing::warn!(feed = %self.id(), timeout_ms = self.config.request_timeout.as_millis() as u64, "Refresh timed out, keeping last value");
                self.publish(|s| s.record_failure(ErrorKind::Network));
            }
        }
    }

    fn on_command(&mut self, cmd: Option<Command>) -> Option<Phase> {
        match cmd? {
            Command::SetManual(value) => {
                self.set_manual(value);
                Some(Phase::Manual)
            }
            Command::Rearm => Some(Phase::Init),
        }
    }

    fn set_manual(&mut self, value: Decimal) {
        incr_counter(FeedCounter::ManualOverride, self.id());
        tracing::info!(feed = %self.id(), %value, "Manual value set, live updates paused");
        let snapshot = PriceSnapshot::new(self.id(), value);
        self.publish(|s| {
            s.apply_snapshot(snapshot);
            s.mode = ConnectionMode::Manual;
        });
    }

    fn apply(&self, snapshot: PriceSnapshot) {
        set_price_gauge(self.id(), snapshot.value);
        self.publish(|s| s.apply_snapshot(snapshot));
    }

    /// Write the state unless the handle already marked it terminated
    fn publish(&self, f: impl FnOnce(&mut FeedState)) {
        self.state.send_if_modified(|state| {
            if state.mode == ConnectionMode::Terminated {
                return false;
            }
            f(state);
            true
        });
    }
}

/// Control and observation handle for one running scheduler
///
/// Dropping the handle terminates the scheduler.
pub struct SchedulerHandle {
    id: String,
    state_tx: Arc<watch::Sender<FeedState>>,
    state_rx: watch::Receiver<FeedState>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state
    pub fn state(&self) -> FeedState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that sees every state change
    pub fn subscribe_state(&self) -> watch::Receiver<FeedState> {
        self.state_tx.subscribe()
    }

    /// Replace the value by hand and pause automatic refresh
    pub fn set_manual(&self, value: Decimal) -> Result<(), SchedulerError> {
        self.send(Command::SetManual(value))
    }

    /// Resume automatic refresh, trying the stream first
    pub fn rearm(&self) -> Result<(), SchedulerError> {
        self.send(Command::Rearm)
    }

    /// Stop the driver and release its timer and connection
    ///
    /// Idempotent. The state is marked `Terminated` before this returns.
    pub fn terminate(&self) {
        self.task.abort();
        self.state_tx.send_if_modified(|state| {
            if state.mode == ConnectionMode::Terminated {
                return false;
            }
            state.mode = ConnectionMode::Terminated;
            true
        });
    }

    pub fn is_terminated(&self) -> bool {
        self.state_rx.borrow().mode == ConnectionMode::Terminated
    }

    /// The driver task has actually exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn send(&self, cmd: Command) -> Result<(), SchedulerError> {
        if self.is_terminated() {
            return Err(SchedulerError::Terminated(self.id.clone()));
        }
        self.commands
            .send(cmd)
            .map_err(|_| SchedulerError::Terminated(self.id.clone()))
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}
