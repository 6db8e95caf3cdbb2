//! Integration tests for the live update scheduler

use alu_dash::error::{ErrorKind, FeedError};
use alu_dash::feed::{PriceSnapshot, PriceSource, PriceStream, StreamEvent};
use alu_dash::scheduler::{ConnectionMode, LiveScheduler, SchedulerConfig, SchedulerHandle};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

/// Source with a test-driven push stream and a fixed poll result
struct MockSource {
    stream: Mutex<Option<mpsc::Receiver<StreamEvent>>>,
    poll: Mutex<Result<Decimal, FeedError>>,
    fetches: AtomicUsize,
}

impl MockSource {
    fn streaming(poll: Decimal) -> (Arc<Self>, mpsc::Sender<StreamEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let source = Arc::new(Self {
            stream: Mutex::new(Some(rx)),
            poll: Mutex::new(Ok(poll)),
            fetches: AtomicUsize::new(0),
        });
        (source, tx)
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn fail_polls(&self, err: FeedError) {
        *self.poll.lock().unwrap() = Err(err);
    }
}

#[async_trait]
impl PriceSource for MockSource {
    fn id(&self) -> &str {
        "lme_3m"
    }

    async fn fetch_once(&self) -> Result<PriceSnapshot, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.poll
            .lock()
            .unwrap()
            .clone()
            .map(|v| PriceSnapshot::new("lme_3m", v))
    }

    async fn subscribe(&self) -> Result<Option<PriceStream>, FeedError> {
        Ok(self.stream.lock().unwrap().take().map(PriceStream::new))
    }
}

fn spawn(source: Arc<MockSource>) -> SchedulerHandle {
    LiveScheduler::spawn(source, SchedulerConfig::new(Duration::from_secs(10)))
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn snapshot(value: Decimal) -> StreamEvent {
    StreamEvent::Snapshot(PriceSnapshot::new("lme_3m", value))
}

#[tokio::test(start_paused = true)]
async fn test_streaming_replaces_snapshot() {
    let (source, tx) = MockSource::streaming(dec!(1));
    let handle = spawn(source.clone());
    settle().await;
    assert_eq!(handle.state().mode, ConnectionMode::Streaming);

    tx.send(snapshot(dec!(2639.50))).await.unwrap();
    tx.send(StreamEvent::Heartbeat).await.unwrap();
    tx.send(snapshot(dec!(2641.00))).await.unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.value(), Some(dec!(2641.00)));
    assert!(state.last_error.is_none());
    assert_eq!(source.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_latest_arrival_wins_over_upstream_order() {
    let (source, tx) = MockSource::streaming(dec!(1));
    let handle = spawn(source);
    settle().await;

    let received = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 5).unwrap();
    let upstream_late = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
    let upstream_early = Utc.with_ymd_and_hms(2026, 10, 19, 9, 29, 0).unwrap();

    let first = PriceSnapshot::new("lme_3m", dec!(2641.00))
        .with_source_timestamp(Some(upstream_late))
        .with_timestamp(received);
    let second = PriceSnapshot::new("lme_3m", dec!(2639.50))
        .with_source_timestamp(Some(upstream_early))
        .with_timestamp(received - chrono::Duration::seconds(3));
    tx.send(StreamEvent::Snapshot(first)).await.unwrap();
    tx.send(StreamEvent::Snapshot(second)).await.unwrap();
    settle().await;

    let state = handle.state();
    let held = state.snapshot.as_ref().unwrap();
    assert_eq!(held.value, dec!(2639.50));
    assert_eq!(held.source_timestamp, Some(upstream_early));
    assert_eq!(held.timestamp, received);
    assert_eq!(state.updated_at, Some(received));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_keeps_previous_value() {
    let (source, tx) = MockSource::streaming(dec!(1));
    let handle = spawn(source);
    settle().await;

    tx.send(snapshot(dec!(2639.50))).await.unwrap();
    tx.send(StreamEvent::Malformed(FeedError::parse("bad json")))
        .await
        .unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.value(), Some(dec!(2639.50)));
    assert_eq!(state.mode, ConnectionMode::Streaming);
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stream_loss_falls_back_to_polling_silently() {
    let (source, tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source.clone());
    settle().await;

    tx.send(StreamEvent::Closed(Some(FeedError::Network("reset".into()))))
        .await
        .unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.mode, ConnectionMode::Polling);
    assert_eq!(source.fetches(), 1);
    assert_eq!(state.value(), Some(dec!(2600)));
    assert!(state.last_error.is_none());
    assert!(tx.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_after_fallback_keeps_last_value() {
    let (source, tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source.clone());
    settle().await;

    tx.send(snapshot(dec!(2639.50))).await.unwrap();
    drop(tx);
    settle().await;
    assert_eq!(handle.state().value(), Some(dec!(2600)));

    source.fail_polls(FeedError::parse("N/A"));
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;

    let state = handle.state();
    assert_eq!(state.value(), Some(dec!(2600)));
    assert_eq!(state.last_error, Some(ErrorKind::Parse));
    assert!(state.is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_manual_mode_drops_stream_and_pauses() {
    let (source, tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source.clone());
    settle().await;

    assert_ok!(handle.set_manual(dec!(2700)));
    settle().await;

    let state = handle.state();
    assert_eq!(state.mode, ConnectionMode::Manual);
    assert_eq!(state.value(), Some(dec!(2700)));
    assert!(tx.is_closed());

    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(source.fetches(), 0);
    assert_eq!(handle.state().value(), Some(dec!(2700)));

    // Stream was consumed, so re-arming lands in polling
    assert_ok!(handle.rearm());
    settle().await;
    assert_eq!(handle.state().mode, ConnectionMode::Polling);
    assert_eq!(handle.state().value(), Some(dec!(2600)));
}

#[tokio::test(start_paused = true)]
async fn test_terminate_releases_stream_and_timer() {
    let (source, tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source.clone());
    settle().await;

    let mut observer = handle.subscribe_state();
    handle.terminate();
    settle().await;

    assert!(tx.is_closed());
    assert!(handle.is_finished());
    assert_eq!(observer.borrow_and_update().mode, ConnectionMode::Terminated);

    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(source.fetches(), 0);
    assert!(!observer.has_changed().unwrap_or(false));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_terminates() {
    let (source, tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source);
    let observer = handle.subscribe_state();
    settle().await;

    drop(handle);
    settle().await;

    assert!(tx.is_closed());
    assert_eq!(observer.borrow().mode, ConnectionMode::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_terminate_is_idempotent() {
    let (source, _tx) = MockSource::streaming(dec!(2600));
    let handle = spawn(source);
    handle.terminate();
    handle.terminate();
    assert!(handle.is_terminated());
    assert_err!(handle.rearm());
    assert_err!(handle.set_manual(dec!(1)));
}
