// src/telemetry.rs
//! Metric registration and the tracing subscriber used by the binary.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Event targets used across the crate, info level; everything else at warn.
pub const DEFAULT_LOG_FILTER: &str = "cli=info,pipeline=info,lifecycle=info,schedule=info,config=info,warn";

/// One-time metrics registration (so series show up on any installed recorder).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "lifecycle_entities_scored_total",
            "Content items scored by an audit run."
        );
        describe_counter!(
            "lifecycle_bucket_entities_total",
            "Entities placed in each bucket, labelled by bucket."
        );
        describe_counter!(
            "lifecycle_mutations_total",
            "Lifecycle flags changed by the executor."
        );
        describe_counter!(
            "lifecycle_mutation_failures_total",
            "Lifecycle flag writes that failed."
        );
        describe_counter!(
            "lifecycle_cascade_relaxations_total",
            "Cascade stages run beyond the first."
        );
        describe_counter!(
            "lifecycle_scheduled_runs_total",
            "Audit runs started by the watch scheduler."
        );
        describe_counter!(
            "lifecycle_scheduled_failures_total",
            "Scheduled audit runs that returned an error."
        );
        describe_gauge!(
            "lifecycle_last_run_ts",
            "Unix ts when an audit pipeline last ran."
        );
    });
}

/// Install the global subscriber. `RUST_LOG` wins over the default filter.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
