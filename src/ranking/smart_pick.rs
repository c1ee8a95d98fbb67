//! Homepage "smart picks": a fixed number of slots, each filled by a different
//! criterion in priority order. A product chosen by an earlier slot is never
//! considered again.
//!
//! 1. best absolute savings among discounted, well-rated products
//! 2. best rating
//! 3. most recently added within the recent window
//! 4. random filler until all slots are used or candidates run out

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::Product;
use crate::scoring::Scorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickSlot {
    BestSavings,
    BestRated,
    Newest,
    Filler,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartPick {
    pub slot: PickSlot,
    pub product: Product,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartPickParams {
    pub slots: usize,
    /// Minimum rating for the savings slot.
    pub min_deal_rating: f32,
    pub recent_window_days: i64,
}

impl Default for SmartPickParams {
    fn default() -> Self {
        Self {
            slots: 4,
            min_deal_rating: 4.0,
            recent_window_days: 14,
        }
    }
}

/// Fill homepage slots. `rng` only drives the filler slot.
pub fn smart_picks<R: Rng + ?Sized>(
    products: &[Product],
    params: &SmartPickParams,
    scorer: &Scorer,
    rng: &mut R,
) -> Vec<SmartPick> {
    let mut out: Vec<SmartPick> = Vec::with_capacity(params.slots);
    let mut taken: HashSet<&str> = HashSet::new();
    let pool: Vec<&Product> = products.iter().filter(|p| p.available).collect();

    let take = |slot: PickSlot, p: Option<&Product>, out: &mut Vec<SmartPick>| {
        if out.len() >= params.slots {
            return;
        }
        if let Some(p) = p {
            out.push(SmartPick {
                slot,
                product: p.clone(),
            });
        }
    };

    // 1) best savings among discounted + well-rated
    let best_savings = pool
        .iter()
        .copied()
        .filter(|p| {
            p.is_discounted() && p.rating.is_some_and(|r| r >= params.min_deal_rating)
        })
        .min_by(|a, b| {
            desc(a.savings(), b.savings())
                .then_with(|| desc(f64::from(a.rating_or_zero()), f64::from(b.rating_or_zero())))
                .then_with(|| a.id.cmp(&b.id))
        });
    if let Some(p) = best_savings {
        taken.insert(p.id.as_str());
    }
    take(PickSlot::BestSavings, best_savings, &mut out);

    // 2) best rating among the rest
    let best_rated = pool
        .iter()
        .copied()
        .filter(|p| p.rating.is_some() && !taken.contains(p.id.as_str()))
        .min_by(|a, b| {
            desc(f64::from(a.rating_or_zero()), f64::from(b.rating_or_zero()))
                .then_with(|| b.rating_count.cmp(&a.rating_count))
                .then_with(|| a.id.cmp(&b.id))
        });
    if let Some(p) = best_rated {
        taken.insert(p.id.as_str());
    }
    take(PickSlot::BestRated, best_rated, &mut out);

    // 3) newest within the recent window; a window past the calendar's range has no cutoff
    let cutoff = Duration::try_days(params.recent_window_days.max(0))
        .and_then(|window| scorer.now().checked_sub_signed(window));
    let newest = pool
        .iter()
        .copied()
        .filter(|p| cutoff.map_or(true, |c| p.created_at >= c) && !taken.contains(p.id.as_str()))
        .min_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    if let Some(p) = newest {
        taken.insert(p.id.as_str());
    }
    take(PickSlot::Newest, newest, &mut out);

    // 4) random filler
    let mut rest: Vec<&Product> = pool
        .iter()
        .copied()
        .filter(|p| !taken.contains(p.id.as_str()))
        .collect();
    // Stable base order so a seeded rng is reproducible regardless of input order.
    rest.sort_by(|a, b| a.id.cmp(&b.id));
    rest.shuffle(rng);
    for p in rest {
        if out.len() >= params.slots {
            break;
        }
        take(PickSlot::Filler, Some(p), &mut out);
    }

    out
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
