// src/ranking/mod.rs
//! Ranker/Selector: deterministic ordering and bounded Top-N selection.
//!
//! Ordering is always: primary score desc → secondary desc → id asc, so ties
//! never depend on input order.

pub mod cascade;
pub mod smart_pick;

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::Product;
use crate::scoring::{ProductFormula, ScoredEntity, ScoredProduct, Scorer};

pub use cascade::{default_cascade, run_cascade, CascadeOutcome, CascadeStage};
pub use smart_pick::{smart_picks, PickSlot, SmartPick, SmartPickParams};

/// Anything that can be put in a deterministic ranking.
pub trait Rankable {
    fn rank_id(&self) -> &str;
    fn primary(&self) -> f64;
    fn secondary(&self) -> f64;
}

impl Rankable for ScoredEntity {
    fn rank_id(&self) -> &str {
        &self.id
    }
    fn primary(&self) -> f64 {
        self.score
    }
    /// Visibility breaks score ties for content.
    fn secondary(&self) -> f64 {
        self.signals.total_impressions as f64
    }
}

impl Rankable for ScoredProduct {
    fn rank_id(&self) -> &str {
        &self.product.id
    }
    fn primary(&self) -> f64 {
        self.score
    }
    fn secondary(&self) -> f64 {
        self.secondary
    }
}

/// Total order used everywhere; NaN sorts as the lowest value.
pub fn compare<T: Rankable>(a: &T, b: &T) -> Ordering {
    desc(a.primary(), b.primary())
        .then_with(|| desc(a.secondary(), b.secondary()))
        .then_with(|| a.rank_id().cmp(b.rank_id()))
}

fn desc(a: f64, b: f64) -> Ordering {
    let a = if a.is_nan() { f64::NEG_INFINITY } else { a };
    let b = if b.is_nan() { f64::NEG_INFINITY } else { b };
    b.total_cmp(&a)
}

/// Sort in place by the canonical order.
pub fn rank<T: Rankable>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(compare);
    items
}

/// Drop excluded ids, rank, keep the first `n`.
pub fn select_top_n<T: Rankable + Clone>(items: &[T], n: usize, exclude: &HashSet<String>) -> Vec<T> {
    let kept: Vec<T> = items
        .iter()
        .filter(|it| !exclude.contains(it.rank_id()))
        .cloned()
        .collect();
    let mut ranked = rank(kept);
    ranked.truncate(n);
    ranked
}

/// Discount-ranked list: deal score desc, then absolute savings desc.
pub fn deals(products: &[Product], n: usize, scorer: &Scorer) -> Vec<ScoredProduct> {
    let scored: Vec<ScoredProduct> = products
        .iter()
        .filter(|p| p.available && p.is_discounted())
        .map(|p| scorer.score_product(p, ProductFormula::Deal))
        .collect();
    select_top_n(&scored, n, &HashSet::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[derive(Clone, Debug)]
    struct Item(&'static str, f64, f64);

    impl Rankable for Item {
        fn rank_id(&self) -> &str {
            self.0
        }
        fn primary(&self) -> f64 {
            self.1
        }
        fn secondary(&self) -> f64 {
            self.2
        }
    }

    fn ids<T: Rankable>(v: &[T]) -> Vec<&str> {
        v.iter().map(|x| x.rank_id()).collect()
    }

    #[test]
    fn ties_resolve_by_secondary_then_id() {
        let items = vec![
            Item("c", 10.0, 1.0),
            Item("b", 10.0, 1.0),
            Item("a", 10.0, 5.0),
            Item("z", 11.0, 0.0),
        ];
        let ranked = rank(items.clone());
        assert_eq!(ids(&ranked), vec!["z", "a", "b", "c"]);

        let mut reversed = items;
        reversed.reverse();
        assert_eq!(ids(&rank(reversed)), vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn nan_sorts_last() {
        let ranked = rank(vec![Item("n", f64::NAN, 0.0), Item("a", 0.0, 0.0)]);
        assert_eq!(ids(&ranked), vec!["a", "n"]);
    }

    #[test]
    fn top_n_honours_exclusions() {
        let items = vec![Item("a", 3.0, 0.0), Item("b", 2.0, 0.0), Item("c", 1.0, 0.0)];
        let exclude: HashSet<String> = ["a".to_string()].into();
        assert_eq!(ids(&select_top_n(&items, 2, &exclude)), vec!["b", "c"]);
        assert!(select_top_n(&items, 0, &HashSet::new()).is_empty());
    }

    #[test]
    fn deals_break_ties_on_savings() {
        let mk = |id: &str, price: f64, orig: f64| Product {
            id: id.into(),
            title: id.into(),
            price,
            original_price: Some(orig),
            rating: Some(4.0),
            rating_count: 5,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            available: true,
        };
        // Same 25% discount and rating; larger absolute saving wins.
        let products = vec![mk("small", 75.0, 100.0), mk("big", 300.0, 400.0), mk("none", 50.0, 50.0)];
        let scorer = Scorer::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let out = deals(&products, 10, &scorer);
        assert_eq!(ids(&out), vec!["big", "small"]);
    }
}
