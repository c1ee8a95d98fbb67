//! # Lifecycle Categorizer
//! Splits a ranked collection into winners / candidates / losers.
//!
//! Stateless: every call recomputes the partition from the ranked input.
//!
//! ```text
//! keep_count = ceil(total * keep_percentage / 100)
//! rank < keep_count                                  → winner
//! age ≤ grace AND impressions > 0                    → candidate (grace period)
//! impressions > weak_threshold OR clicks > 0         → candidate (weak signal)
//! otherwise                                          → loser
//! ```

pub mod executor;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::scoring::ScoredEntity;

pub use executor::{
    should_execute, AlwaysConfirm, Confirm, ExecuteOptions, ExecutionReport, ExecutionStatus,
    Executor, Gate, NeverConfirm,
};

/// Impressions above this count keep an old, low-ranked entity as a candidate.
pub const DEFAULT_WEAK_SIGNAL_IMPRESSIONS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Winners,
    Candidates,
    Losers,
}

/// Why a below-cutoff entity was spared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateReason {
    GracePeriod,
    WeakSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorizeParams {
    /// 0..=100, clamped.
    pub keep_percentage: u8,
    pub grace_period_days: i64,
    pub weak_signal_impressions: u64,
}

impl Default for CategorizeParams {
    fn default() -> Self {
        Self {
            keep_percentage: 70,
            grace_period_days: 60,
            weak_signal_impressions: DEFAULT_WEAK_SIGNAL_IMPRESSIONS,
        }
    }
}

/// The three buckets of one invocation, each in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Categorization {
    pub keep_count: usize,
    pub winners: Vec<ScoredEntity>,
    pub candidates: Vec<ScoredEntity>,
    pub losers: Vec<ScoredEntity>,
    /// Reason per candidate id.
    pub candidate_reasons: HashMap<String, CandidateReason>,
}

impl Categorization {
    pub fn total(&self) -> usize {
        self.winners.len() + self.candidates.len() + self.losers.len()
    }

    pub fn bucket(&self, b: Bucket) -> &[ScoredEntity] {
        match b {
            Bucket::Winners => &self.winners,
            Bucket::Candidates => &self.candidates,
            Bucket::Losers => &self.losers,
        }
    }

    /// Which bucket an id landed in, if any.
    pub fn bucket_of(&self, id: &str) -> Option<Bucket> {
        [Bucket::Winners, Bucket::Candidates, Bucket::Losers]
            .into_iter()
            .find(|b| self.bucket(*b).iter().any(|e| e.id == id))
    }
}

/// `ceil(total * pct / 100)` in integer arithmetic.
pub fn keep_count(total: usize, keep_percentage: u8) -> usize {
    let pct = usize::from(keep_percentage.min(100));
    (total * pct).div_ceil(100)
}

/// Partition `ranked` (already in rank order) into the three buckets.
pub fn categorize(ranked: &[ScoredEntity], params: &CategorizeParams) -> Categorization {
    let keep = keep_count(ranked.len(), params.keep_percentage);
    let mut out = Categorization {
        keep_count: keep,
        ..Default::default()
    };

    for (rank, e) in ranked.iter().enumerate() {
        if rank < keep {
            out.winners.push(e.clone());
            continue;
        }

        let impressions = e.signals.total_impressions;
        let reason = if e.age_days <= params.grace_period_days && impressions > 0 {
            Some(CandidateReason::GracePeriod)
        } else if impressions > params.weak_signal_impressions || e.signals.total_clicks > 0 {
            Some(CandidateReason::WeakSignal)
        } else {
            None
        };

        match reason {
            Some(r) => {
                out.candidate_reasons.insert(e.id.clone(), r);
                out.candidates.push(e.clone());
            }
            None => out.losers.push(e.clone()),
        }
    }

    out
}
