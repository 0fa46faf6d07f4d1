use crate::gateway::SutroGateway;
use crate::reading::Reading;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

type UpdateCallback = Box<dyn Fn(&Reading) + Send + Sync>;

pub struct PollingCoordinatorBuilder {
    gateway: Arc<SutroGateway>,
    update_interval: Duration,
    subscribers: Vec<UpdateCallback>,
}

impl PollingCoordinatorBuilder {
    /// Sets the refresh interval, floored at [`MIN_UPDATE_INTERVAL`].
    pub fn interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval.max(MIN_UPDATE_INTERVAL);
        self
    }

    /// Registers a callback run after every successful refresh.
    pub fn on_update(mut self, f: impl Fn(&Reading) + Send + Sync + 'static) -> Self {
        self.subscribers.push(Box::new(f));
        self
    }

    pub fn build(self) -> PollingCoordinator {
        PollingCoordinator {
            gateway: self.gateway,
            update_interval: self.update_interval,
            subscribers: self.subscribers,
        }
    }
}

/// Drives the gateway on a fixed interval and fans successful readings out to
/// subscribers. A failed cycle is logged by the gateway and skipped.
pub struct PollingCoordinator {
    gateway: Arc<SutroGateway>,
    update_interval: Duration,
    subscribers: Vec<UpdateCallback>,
}

impl PollingCoordinator {
    pub fn builder(gateway: Arc<SutroGateway>) -> PollingCoordinatorBuilder {
        PollingCoordinatorBuilder {
            gateway,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            subscribers: Vec::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<SutroGateway> {
        &self.gateway
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Runs a single refresh cycle, returning whether a new reading arrived.
    pub async fn refresh(&self) -> bool {
        match self.gateway.update().await {
            Some(reading) => {
                self.notify(&reading);
                true
            }
            None => false,
        }
    }

    /// Refresh performed once at setup, before the periodic task starts.
    pub async fn first_refresh(&self) -> bool {
        let refreshed = self.refresh().await;
        if !refreshed {
            info!("First refresh did not return a reading; serving empty data until next poll");
        }
        refreshed
    }

    /// Spawns the polling task. Abort the returned handle to stop polling.
    ///
    /// Polls right away unless a reading is already cached, e.g. from
    /// [`first_refresh`](Self::first_refresh).
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(
            "Starting Sutro polling every {}s",
            self.update_interval.as_secs()
        );

        let mut refresh_interval = interval(self.update_interval);
        refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it when a reading is already cached
        if !self.gateway.data().is_empty() {
            refresh_interval.tick().await;
        }

        loop {
            refresh_interval.tick().await;
            self.refresh().await;
        }
    }

    fn notify(&self, reading: &Reading) {
        debug!(subscribers = self.subscribers.len(), "notifying subscribers");
        for subscriber in &self.subscribers {
            subscriber(reading);
        }
    }
}
