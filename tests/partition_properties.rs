// tests/partition_properties.rs
// Randomized checks of the categorizer and scorer invariants (seeded, reproducible).

use content_lifecycle::lifecycle::keep_count;
use content_lifecycle::ranking::rank;
use content_lifecycle::scoring::{content_score, performance_score};
use content_lifecycle::{
    categorize, Bucket, CategorizeParams, EntityKind, FormulaVariant, LifecycleFlag,
    PerformanceSummary, ScoredEntity,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn random_entity(rng: &mut StdRng, i: usize) -> ScoredEntity {
    let impressions = if rng.random_bool(0.3) { 0 } else { rng.random_range(0..50) };
    let clicks = if rng.random_bool(0.6) { 0 } else { rng.random_range(0..5) };
    ScoredEntity {
        id: format!("e{i:03}"),
        kind: EntityKind::BlogPost,
        title: String::new(),
        // coarse scores so ties are common
        score: f64::from(rng.random_range(0..20u32)) * 5.0,
        age_days: rng.random_range(0..400),
        signals: PerformanceSummary {
            total_clicks: clicks,
            total_impressions: impressions,
            ..Default::default()
        },
        formula: FormulaVariant::ContentFallback,
        flag: LifecycleFlag::Indexed,
    }
}

#[test]
fn buckets_always_partition_the_input() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let n = rng.random_range(0..40);
        let items: Vec<ScoredEntity> = (0..n).map(|i| random_entity(&mut rng, i)).collect();
        let params = CategorizeParams {
            keep_percentage: rng.random_range(0..=100),
            grace_period_days: rng.random_range(0..120),
            weak_signal_impressions: rng.random_range(0..6),
        };

        let ranked = rank(items);
        let c = categorize(&ranked, &params);

        assert_eq!(c.total(), n);
        let mut seen = HashSet::new();
        for b in [Bucket::Winners, Bucket::Candidates, Bucket::Losers] {
            for e in c.bucket(b) {
                assert!(seen.insert(e.id.clone()), "{} in two buckets", e.id);
            }
        }
        assert_eq!(seen.len(), n);

        // winners are exactly the ranked prefix of length keep_count
        let keep = keep_count(n, params.keep_percentage);
        assert_eq!(c.winners.len(), keep.min(n));
        let prefix: Vec<_> = ranked.iter().take(keep).map(|e| &e.id).collect();
        let winners: Vec<_> = c.winners.iter().map(|e| &e.id).collect();
        assert_eq!(prefix, winners);

        // grace override: a young non-winner with impressions is never a loser
        for e in &c.losers {
            assert!(!(e.age_days <= params.grace_period_days && e.signals.total_impressions > 0));
            assert_eq!(e.signals.total_clicks, 0);
            assert!(e.signals.total_impressions <= params.weak_signal_impressions);
        }
    }
}

#[test]
fn ranking_ignores_input_order() {
    let mut rng = StdRng::seed_from_u64(99);
    let items: Vec<ScoredEntity> = (0..30).map(|i| random_entity(&mut rng, i)).collect();
    let mut reversed = items.clone();
    reversed.reverse();

    let a: Vec<_> = rank(items).into_iter().map(|e| e.id).collect();
    let b: Vec<_> = rank(reversed).into_iter().map(|e| e.id).collect();
    assert_eq!(a, b);
}

#[test]
fn performance_score_grows_with_clicks() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let base = PerformanceSummary {
            total_clicks: rng.random_range(0..1_000),
            total_impressions: rng.random_range(0..10_000),
            avg_ctr: rng.random_range(0.0..1.0),
            avg_position: rng.random_range(1.0..150.0),
            query_count: 1,
        };
        let more = PerformanceSummary {
            total_clicks: base.total_clicks + rng.random_range(1..100),
            ..base
        };
        assert!(performance_score(&more) > performance_score(&base));
    }
}

#[test]
fn fallback_only_when_performance_is_zero() {
    assert_eq!(content_score(0.0, 42.0), (42.0, FormulaVariant::ContentFallback));
    assert_eq!(content_score(0.5, 42.0), (0.5, FormulaVariant::ContentPerformance));
    assert_eq!(
        performance_score(&PerformanceSummary::default()),
        0.0,
        "no data scores zero so the fallback applies"
    );
}
