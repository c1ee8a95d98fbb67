// src/pipeline.rs
//! End-to-end runs: storage → signals → scorer → ranker → categorizer → executor,
//! plus the product lists consumed by the site (homepage, Top-N, deals).

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::AuditSection;
use crate::error::{EngineResult, Warning};
use crate::lifecycle::{
    categorize, Bucket, Categorization, CategorizeParams, Confirm, ExecuteOptions,
    ExecutionReport, Executor,
};
use crate::model::{age_days, EntityKind, LifecycleFlag};
use crate::ranking::{
    self, run_cascade, smart_picks, CascadeOutcome, CascadeStage, SmartPick, SmartPickParams,
};
use crate::scoring::{ScoredEntity, ScoredProduct, Scorer};
use crate::signals::{DateRange, SignalKey, SignalRepository};
use crate::store::ContentStore;
use crate::telemetry::ensure_metrics_described;

/// Which lifecycle run: what gets evaluated and the flag losers receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTarget {
    /// Blog posts; losers are set to `noindex`.
    BlogPosts,
    /// Reviews; losers are unpublished.
    Reviews,
}

impl AuditTarget {
    pub fn kind(self) -> EntityKind {
        match self {
            AuditTarget::BlogPosts => EntityKind::BlogPost,
            AuditTarget::Reviews => EntityKind::Review,
        }
    }

    pub fn target_flag(self) -> LifecycleFlag {
        match self {
            AuditTarget::BlogPosts => LifecycleFlag::NoIndex,
            AuditTarget::Reviews => LifecycleFlag::Draft,
        }
    }

    /// Drafts are unpublished; a noindex audit must not touch them.
    fn evaluates(self, flag: LifecycleFlag) -> bool {
        flag != LifecycleFlag::Draft || self.target_flag() == LifecycleFlag::Draft
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditParams {
    pub categorize: CategorizeParams,
    pub min_age_days: i64,
    /// Signal window; 0 = all time.
    pub window_days: u32,
    pub execute: ExecuteOptions,
}

impl Default for AuditParams {
    fn default() -> Self {
        AuditSection::default().into()
    }
}

impl From<AuditSection> for AuditParams {
    fn from(s: AuditSection) -> Self {
        Self {
            categorize: s.categorize_params(),
            min_age_days: s.min_age_days,
            window_days: s.window_days,
            execute: ExecuteOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub target: AuditTarget,
    pub evaluated_at: DateTime<Utc>,
    pub evaluated: usize,
    /// Ids younger than `min_age_days`, not evaluated.
    pub skipped_too_young: Vec<String>,
    pub categorization: Categorization,
    pub execution: ExecutionReport,
    pub warnings: Vec<Warning>,
}

/// Score, rank and categorize every eligible entity of `target`, then move the
/// losers to the target flag (subject to dry-run / confirmation).
pub fn run_audit<S, C>(
    target: AuditTarget,
    store: &mut S,
    signals: &SignalRepository,
    scorer: &Scorer,
    params: &AuditParams,
    confirm: &mut C,
) -> EngineResult<AuditReport>
where
    S: ContentStore + ?Sized,
    C: Confirm + ?Sized,
{
    ensure_metrics_described();
    let now = scorer.now();
    let range = DateRange::from_window_days(params.window_days, now.date_naive());

    let mut warnings = Vec::new();
    let mut skipped_too_young = Vec::new();
    let mut scored: Vec<ScoredEntity> = Vec::new();

    for entity in store.content(target.kind())? {
        if !target.evaluates(entity.flag) {
            continue;
        }
        if age_days(entity.created_at, now) < params.min_age_days {
            skipped_too_young.push(entity.id);
            continue;
        }
        let summary = signals.summary(&SignalKey::for_entity(&entity), &range);
        if !summary.has_data() {
            warn!(
                target: "pipeline",
                audit = ?target,
                entity_id = %entity.id,
                "no signal data in window, scoring with fallback"
            );
            warnings.push(Warning::NoSignalData {
                entity_id: entity.id.clone(),
            });
        }
        scored.push(scorer.score_content(&entity, summary));
    }

    if scored.is_empty() {
        warn!(
            target: "pipeline",
            audit = ?target,
            skipped_too_young = skipped_too_young.len(),
            "nothing old enough to evaluate"
        );
        warnings.push(Warning::NothingToEvaluate {
            skipped_too_young: skipped_too_young.len(),
        });
    }

    let ranked = ranking::rank(scored);
    let categorization = categorize(&ranked, &params.categorize);

    counter!("lifecycle_entities_scored_total").increment(ranked.len() as u64);
    for bucket in [Bucket::Winners, Bucket::Candidates, Bucket::Losers] {
        counter!("lifecycle_bucket_entities_total", "bucket" => bucket_label(bucket))
            .increment(categorization.bucket(bucket).len() as u64);
    }

    info!(
        target: "pipeline",
        audit = ?target,
        evaluated = ranked.len(),
        keep_count = categorization.keep_count,
        winners = categorization.winners.len(),
        candidates = categorization.candidates.len(),
        losers = categorization.losers.len(),
        skipped_too_young = skipped_too_young.len(),
        "categorized"
    );

    let execution = Executor::new(target.target_flag()).execute(
        &categorization.losers,
        params.execute,
        store,
        confirm,
    );

    gauge!("lifecycle_last_run_ts").set(now.timestamp().max(0) as f64);

    Ok(AuditReport {
        target,
        evaluated_at: now,
        evaluated: ranked.len(),
        skipped_too_young,
        categorization,
        execution,
        warnings,
    })
}

fn bucket_label(b: Bucket) -> &'static str {
    match b {
        Bucket::Winners => "winners",
        Bucket::Candidates => "candidates",
        Bucket::Losers => "losers",
    }
}

/// Homepage slots (savings, rating, newest, filler).
pub fn homepage_picks<S, R>(
    store: &S,
    params: &SmartPickParams,
    scorer: &Scorer,
    rng: &mut R,
) -> EngineResult<Vec<SmartPick>>
where
    S: ContentStore + ?Sized,
    R: Rng + ?Sized,
{
    let products = store.products()?;
    Ok(smart_picks(&products, params, scorer, rng))
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPicksReport {
    /// The homepage selection the Top-N list was kept apart from.
    pub homepage: Vec<SmartPick>,
    pub outcome: CascadeOutcome,
    pub warnings: Vec<Warning>,
}

/// Top-N products via the cascade, excluding the homepage picks so both lists
/// never show the same set.
pub fn top_picks<S, R>(
    store: &S,
    stages: &[CascadeStage],
    n: usize,
    pick_params: &SmartPickParams,
    scorer: &Scorer,
    rng: &mut R,
) -> EngineResult<TopPicksReport>
where
    S: ContentStore + ?Sized,
    R: Rng + ?Sized,
{
    ensure_metrics_described();
    let products = store.products()?;
    let homepage = smart_picks(&products, pick_params, scorer, rng);
    let exclude: HashSet<String> = homepage.iter().map(|p| p.product.id.clone()).collect();

    let outcome = run_cascade(&products, stages, n, &exclude, scorer);
    counter!("lifecycle_cascade_relaxations_total").increment(outcome.relaxations() as u64);

    let mut warnings = Vec::new();
    if !outcome.is_satisfied() {
        warnings.push(Warning::InsufficientCandidates {
            wanted: n,
            found: outcome.picks.len(),
        });
    }

    info!(
        target: "pipeline",
        wanted = n,
        found = outcome.picks.len(),
        satisfied_by = outcome.satisfied_by.as_deref().unwrap_or("-"),
        excluded = exclude.len(),
        "top picks selected"
    );

    Ok(TopPicksReport {
        homepage,
        outcome,
        warnings,
    })
}

/// Discount-ranked product list.
pub fn deals<S>(store: &S, n: usize, scorer: &Scorer) -> EngineResult<Vec<ScoredProduct>>
where
    S: ContentStore + ?Sized,
{
    let products = store.products()?;
    Ok(ranking::deals(&products, n, scorer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NeverConfirm;
    use crate::model::ContentEntity;
    use crate::site::SiteContext;
    use crate::store::{Dataset, MemoryStore};
    use chrono::{Duration, TimeZone};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn missing_signals_are_reported_and_logged() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let post = ContentEntity {
            id: "quiet".into(),
            kind: EntityKind::BlogPost,
            title: "Quiet post".into(),
            url: None,
            content: "<p>text</p>".into(),
            created_at: now - Duration::days(200),
            rating: None,
            product: None,
            sections_complete: false,
            flag: LifecycleFlag::Indexed,
        };
        let mut store = MemoryStore::new(Dataset {
            content: vec![post],
            ..Default::default()
        });
        let signals =
            SignalRepository::from_rows(SiteContext::new("https://gear.example").unwrap(), vec![]);
        let mut params = AuditParams::default();
        params.execute.dry_run = true;

        let logs = LogBuf::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let report = tracing::subscriber::with_default(subscriber, || {
            run_audit(
                AuditTarget::BlogPosts,
                &mut store,
                &signals,
                &Scorer::new(now),
                &params,
                &mut NeverConfirm,
            )
        })
        .unwrap();

        assert_eq!(
            report.warnings,
            vec![Warning::NoSignalData {
                entity_id: "quiet".into()
            }]
        );
        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("no signal data"), "{out}");
        assert!(out.contains("entity_id=quiet"), "{out}");
    }

    #[test]
    fn targets_map_to_kinds_and_flags() {
        assert_eq!(AuditTarget::BlogPosts.kind(), EntityKind::BlogPost);
        assert_eq!(AuditTarget::BlogPosts.target_flag(), LifecycleFlag::NoIndex);
        assert_eq!(AuditTarget::Reviews.kind(), EntityKind::Review);
        assert_eq!(AuditTarget::Reviews.target_flag(), LifecycleFlag::Draft);
    }

    #[test]
    fn noindex_audit_skips_drafts_but_review_cleanup_keeps_them() {
        assert!(!AuditTarget::BlogPosts.evaluates(LifecycleFlag::Draft));
        assert!(AuditTarget::BlogPosts.evaluates(LifecycleFlag::NoIndex));
        assert!(AuditTarget::Reviews.evaluates(LifecycleFlag::Draft));
    }

    #[test]
    fn params_follow_config_section() {
        let section = AuditSection {
            keep_percentage: 50,
            min_age_days: 7,
            window_days: 0,
            ..Default::default()
        };
        let p = AuditParams::from(section);
        assert_eq!(p.categorize.keep_percentage, 50);
        assert_eq!(p.min_age_days, 7);
        assert_eq!(p.window_days, 0);
        assert!(!p.execute.dry_run && !p.execute.force);
    }
}
