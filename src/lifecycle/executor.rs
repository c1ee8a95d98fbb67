//! # State Transition Executor
//! Applies one lifecycle flag to every entity of a bucket.
//!
//! - dry run: reads only, reports what would change
//! - live: needs `force` or an interactive confirmation, otherwise cancelled
//! - idempotent: entities already at the target flag are reported as unchanged
//! - a failing write is recorded and the batch continues

use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::LifecycleFlag;
use crate::scoring::ScoredEntity;
use crate::store::ContentStore;
use crate::telemetry::ensure_metrics_described;

/// Interactive confirmation seam (stdin prompt in the CLI, fixed answers in tests).
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Answers yes without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Answers no without asking (non-interactive contexts without `--force`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    DryRun,
    Execute,
    Cancelled,
}

/// Gate decision, independent of how `confirmed` was obtained.
pub fn should_execute(dry_run: bool, force: bool, confirmed: bool) -> Gate {
    if dry_run {
        Gate::DryRun
    } else if force || confirmed {
        Gate::Execute
    } else {
        Gate::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    DryRun,
    Completed,
    /// Completed, but some writes failed.
    PartialFailure,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedMutation {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub target: LifecycleFlag,
    /// Entities whose flag differs from the target (would change / attempted).
    pub planned: Vec<String>,
    pub mutated: Vec<String>,
    /// Already at the target flag.
    pub unchanged: Vec<String>,
    pub failed: Vec<FailedMutation>,
}

impl ExecutionReport {
    fn new(status: ExecutionStatus, target: LifecycleFlag) -> Self {
        Self {
            status,
            target,
            planned: Vec::new(),
            mutated: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Number of entities actually mutated.
    pub fn count(&self) -> usize {
        self.mutated.len()
    }
}

/// Moves a bucket to one target flag.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    target: LifecycleFlag,
}

impl Executor {
    pub fn new(target: LifecycleFlag) -> Self {
        Self { target }
    }

    pub fn target(&self) -> LifecycleFlag {
        self.target
    }

    pub fn execute<S, C>(
        &self,
        bucket: &[ScoredEntity],
        opts: ExecuteOptions,
        store: &mut S,
        confirm: &mut C,
    ) -> ExecutionReport
    where
        S: ContentStore + ?Sized,
        C: Confirm + ?Sized,
    {
        ensure_metrics_described();

        // Plan against current storage state, not the flag captured at scoring time.
        let mut report = ExecutionReport::new(ExecutionStatus::Completed, self.target);
        for e in bucket {
            match store.flag(&e.id) {
                Ok(flag) if flag == self.target => report.unchanged.push(e.id.clone()),
                Ok(_) => report.planned.push(e.id.clone()),
                Err(err) => report.failed.push(FailedMutation {
                    id: e.id.clone(),
                    error: err.to_string(),
                }),
            }
        }

        if report.planned.is_empty() && !opts.dry_run {
            info!(target: "lifecycle", target_flag = %self.target, "nothing to change");
            report.status = status_after(&report);
            return report;
        }

        let needs_prompt = !opts.dry_run && !opts.force;
        let confirmed = needs_prompt
            && confirm.confirm(&format!(
                "Set {} entities to '{}'?",
                report.planned.len(),
                self.target
            ));

        match should_execute(opts.dry_run, opts.force, confirmed) {
            Gate::DryRun => {
                info!(
                    target: "lifecycle",
                    target_flag = %self.target,
                    would_change = report.planned.len(),
                    "dry run, no changes written"
                );
                report.status = ExecutionStatus::DryRun;
            }
            Gate::Cancelled => {
                warn!(target: "lifecycle", planned = report.planned.len(), "cancelled by user");
                report.status = ExecutionStatus::Cancelled;
            }
            Gate::Execute => {
                for id in report.planned.clone() {
                    match store.set_flag(&id, self.target) {
                        Ok(()) => {
                            info!(target: "lifecycle", %id, target_flag = %self.target, "flag updated");
                            counter!("lifecycle_mutations_total").increment(1);
                            report.mutated.push(id);
                        }
                        Err(err) => {
                            warn!(target: "lifecycle", %id, error = %err, "flag update failed");
                            counter!("lifecycle_mutation_failures_total").increment(1);
                            report.failed.push(FailedMutation {
                                id,
                                error: err.to_string(),
                            });
                        }
                    }
                }
                report.status = status_after(&report);
            }
        }

        report
    }
}

fn status_after(report: &ExecutionReport) -> ExecutionStatus {
    if report.failed.is_empty() {
        ExecutionStatus::Completed
    } else {
        ExecutionStatus::PartialFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentEntity, EntityKind};
    use crate::scoring::FormulaVariant;
    use crate::signals::PerformanceSummary;
    use crate::store::{Dataset, MemoryStore};
    use chrono::{TimeZone, Utc};

    /// Counts prompts and always answers yes.
    #[derive(Default)]
    struct CountingConfirm {
        asked: usize,
    }

    impl Confirm for CountingConfirm {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.asked += 1;
            true
        }
    }

    fn post(id: &str, flag: LifecycleFlag) -> ContentEntity {
        ContentEntity {
            id: id.into(),
            kind: EntityKind::BlogPost,
            title: id.into(),
            url: None,
            content: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            rating: None,
            product: None,
            sections_complete: false,
            flag,
        }
    }

    fn scored(e: &ContentEntity) -> ScoredEntity {
        ScoredEntity {
            id: e.id.clone(),
            kind: e.kind,
            title: e.title.clone(),
            score: 0.0,
            age_days: 100,
            signals: PerformanceSummary::default(),
            formula: FormulaVariant::ContentFallback,
            flag: e.flag,
        }
    }

    #[test]
    fn live_run_with_nothing_planned_never_prompts() {
        let done = post("done", LifecycleFlag::NoIndex);
        let bucket = vec![scored(&done)];
        let mut store = MemoryStore::new(Dataset {
            content: vec![done],
            ..Default::default()
        });
        let mut confirm = CountingConfirm::default();

        let report = Executor::new(LifecycleFlag::NoIndex).execute(
            &bucket,
            ExecuteOptions::default(),
            &mut store,
            &mut confirm,
        );

        assert_eq!(confirm.asked, 0);
        assert_eq!(report.status, ExecutionStatus::Completed);
        assert_eq!(report.unchanged, vec!["done".to_string()]);
        assert!(report.planned.is_empty());
        assert_eq!(store.writes, 0);

        let empty = Executor::new(LifecycleFlag::NoIndex).execute(
            &[],
            ExecuteOptions::default(),
            &mut store,
            &mut confirm,
        );
        assert_eq!(confirm.asked, 0);
        assert_eq!(empty.status, ExecutionStatus::Completed);
    }

    #[test]
    fn live_run_with_pending_changes_prompts_once() {
        let live = post("live", LifecycleFlag::Indexed);
        let bucket = vec![scored(&live)];
        let mut store = MemoryStore::new(Dataset {
            content: vec![live],
            ..Default::default()
        });
        let mut confirm = CountingConfirm::default();

        let report = Executor::new(LifecycleFlag::NoIndex).execute(
            &bucket,
            ExecuteOptions::default(),
            &mut store,
            &mut confirm,
        );

        assert_eq!(confirm.asked, 1);
        assert_eq!(report.mutated, vec!["live".to_string()]);
    }

    #[test]
    fn gate_truth_table() {
        assert_eq!(should_execute(true, true, true), Gate::DryRun);
        assert_eq!(should_execute(true, false, false), Gate::DryRun);
        assert_eq!(should_execute(false, true, false), Gate::Execute);
        assert_eq!(should_execute(false, false, true), Gate::Execute);
        assert_eq!(should_execute(false, false, false), Gate::Cancelled);
    }

    #[test]
    fn fixed_confirmers() {
        assert!(AlwaysConfirm.confirm("?"));
        assert!(!NeverConfirm.confirm("?"));
    }
}
