//! Live update scheduler
//!
//! One driver task per feed keeps a `FeedState` fresh. It prefers the
//! feed's push stream, falls back to polling when the stream is missing or
//! lost, and pauses entirely while the user holds a manual value. The task
//! is the only writer of its state; readers observe it through a
//! `watch::Receiver`.

mod driver;
mod state;

pub use driver::{LiveScheduler, SchedulerConfig, SchedulerError, SchedulerHandle};
pub use state::{ConnectionMode, FeedState};
