// src/schedule.rs
use metrics::counter;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct ScheduleCfg {
    pub interval: Duration,
    /// Stop after this many runs; `None` runs until the future is dropped.
    pub max_runs: Option<usize>,
}

impl ScheduleCfg {
    pub fn every_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs.max(1)),
            max_runs: None,
        }
    }
}

/// Run `job` on every tick (the first tick fires immediately). Each run
/// completes before the next tick is awaited, so runs never overlap. A failing
/// run is logged and the loop continues. Returns the number of runs.
pub async fn run_scheduled<F>(cfg: ScheduleCfg, mut job: F) -> usize
where
    F: FnMut(usize) -> anyhow::Result<()>,
{
    crate::telemetry::ensure_metrics_described();
    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut runs = 0usize;
    loop {
        if cfg.max_runs.is_some_and(|max| runs >= max) {
            return runs;
        }
        ticker.tick().await;

        match job(runs) {
            Ok(()) => {
                tracing::info!(target: "schedule", run = runs, "scheduled run finished");
            }
            Err(e) => {
                counter!("lifecycle_scheduled_failures_total").increment(1);
                tracing::warn!(target: "schedule", run = runs, error = %format!("{e:#}"), "scheduled run failed");
            }
        }
        counter!("lifecycle_scheduled_runs_total").increment(1);
        runs += 1;
    }
}
