use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        let probe = &self.context.config.probe;
        if !probe.enabled || probe.targets.is_empty() {
            info!("Probe job disabled");
            return;
        }

        info!("Starting background job scheduler");

        tokio::spawn(Self::probe_job(Arc::clone(&self)));
        tokio::spawn(Self::probe_retention_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Probe the configured stages (runs every probe interval)
    async fn probe_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.probe.interval_secs);
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let results = tasks::run_probes(&scheduler.context).await;
            let failed = results.iter().filter(|p| !p.success).count();
            if failed > 0 {
                info!("Probe run finished: {}/{} failed", failed, results.len());
            }
        }
    }

    /// Drop old probe datapoints (runs daily)
    async fn probe_retention_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(86400)); // Every 24 hours

        loop {
            interval.tick().await;

            match tasks::purge_probe_metrics(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Purged {} old probe datapoints", count);
                    }
                }
                Err(e) => error!("Failed to purge probe datapoints: {}", e),
            }
        }
    }
}
