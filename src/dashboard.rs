//! Registry of running schedulers
//!
//! The dashboard owns one scheduler handle per configured feed and hands out
//! aggregators that read their states. Shutting it down terminates them all.

use crate::aggregate::{DashboardView, FeedRole, PriceAggregator};
use crate::config::Config;
use crate::feed::{HttpFeed, PriceSource};
use crate::scheduler::{LiveScheduler, SchedulerConfig, SchedulerError, SchedulerHandle};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
pub struct Dashboard {
    schedulers: BTreeMap<FeedRole, SchedulerHandle>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a scheduler for every configured feed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.scheduler.request_timeout();
        let mut dashboard = Self::new();

        for (id, feed) in config.feeds.iter() {
            let Some(role) = FeedRole::from_id(id) else {
                continue;
            };
            let source = Arc::new(HttpFeed::from_config(id, feed, timeout));
            let schedule = SchedulerConfig::new(feed.poll_interval()).request_timeout(timeout);
            dashboard.add_source(role, source, schedule);
        }

        tracing::info!(feeds = dashboard.len(), "Dashboard started");
        dashboard
    }

    /// Start a scheduler for `role`, terminating any it replaces
    pub fn add_source(
        &mut self,
        role: FeedRole,
        source: Arc<dyn PriceSource>,
        config: SchedulerConfig,
    ) {
        let handle = LiveScheduler::spawn(source, config);
        if let Some(previous) = self.schedulers.insert(role, handle) {
            previous.terminate();
        }
    }

    pub fn handle(&self, role: FeedRole) -> Option<&SchedulerHandle> {
        self.schedulers.get(&role)
    }

    pub fn len(&self) -> usize {
        self.schedulers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedulers.is_empty()
    }

    /// A fresh reader over every scheduler's state
    pub fn aggregator(&self) -> PriceAggregator {
        let mut aggregator = PriceAggregator::new();
        for (role, handle) in &self.schedulers {
            aggregator.insert(*role, handle.subscribe_state());
        }
        aggregator
    }

    pub fn view(&self) -> DashboardView {
        self.aggregator().view()
    }

    /// Hold a user-entered value for one feed
    pub fn set_manual(&self, role: FeedRole, value: Decimal) -> Result<(), SchedulerError> {
        self.require(role)?.set_manual(value)
    }

    /// Return one feed to live updates
    pub fn rearm(&self, role: FeedRole) -> Result<(), SchedulerError> {
        self.require(role)?.rearm()
    }

    /// Terminate every scheduler
    pub fn shutdown(&mut self) {
        for (role, handle) in std::mem::take(&mut self.schedulers) {
            tracing::debug!(feed = %role, "Terminating scheduler");
            handle.terminate();
        }
    }

    fn require(&self, role: FeedRole) -> Result<&SchedulerHandle, SchedulerError> {
        self.schedulers
            .get(&role)
            .ok_or_else(|| SchedulerError::UnknownFeed(role.to_string()))
    }
}
