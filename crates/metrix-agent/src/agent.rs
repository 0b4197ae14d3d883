//! Poll and report loops.
//!
//! Two independent tasks, each on its own interval. Both stop once the
//! shutdown flag flips to true or its sender is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::collector::Collector;
use crate::config::AgentConfig;
use crate::reporter::{ReportError, Reporter};

pub struct Agent {
    cfg: AgentConfig,
    collector: Collector,
    reporter: Reporter,
}

impl Agent {
    pub fn new(cfg: AgentConfig, collector: Collector, reporter: Reporter) -> Self {
        Self { cfg, collector, reporter }
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Send the current snapshot and acknowledge it on success. Returns how
    /// many records were sent.
    pub async fn report_once(&self) -> Result<usize, ReportError> {
        let batch = self.collector.snapshot();
        self.reporter.send(&batch).await?;
        self.collector.acknowledge(&batch);
        Ok(batch.len())
    }

    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        let poll = {
            let agent = Arc::clone(&self);
            every(self.cfg.poll(), shutdown.clone(), move || {
                let agent = Arc::clone(&agent);
                async move { agent.collector.poll() }
            })
        };
        let report = {
            let agent = Arc::clone(&self);
            every(self.cfg.report(), shutdown, move || {
                let agent = Arc::clone(&agent);
                async move {
                    match agent.report_once().await {
                        Ok(n) => tracing::info!(records = n, "metrics reported"),
                        Err(e) => tracing::error!(error = %e, "failed to report metrics"),
                    }
                }
            })
        };

        tracing::info!(
            endpoint = %self.reporter.endpoint(),
            poll_s = self.cfg.poll_interval,
            report_s = self.cfg.report_interval,
            "agent running"
        );
        tokio::join!(poll, report);
        tracing::info!("agent stopped");
    }
}

async fn every<F, Fut>(period: Duration, mut shutdown: watch::Receiver<bool>, mut f: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = tick.tick() => f().await,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
