//! # Scorer
//! Pure functions mapping signals and static attributes to a single
//! non-negative score. No I/O.
//!
//! All formulas live behind [`FormulaVariant`]:
//! - `ContentPerformance` = clicks*10 + impressions*0.5 + ctr*100 + max(0, 100 - min(position, 100))
//! - `ContentFallback`    = min(50, chars/50) + max(0, 100 - age_days) + bonuses
//! - `ProductDeal`        = discount% + rating*10 (tie-break: absolute savings)
//! - `ProductQuality`     = rating*20 (tie-break: rating count)
//!
//! For content, a positive performance score always wins; the fallback is only
//! used when performance is exactly zero. There is no blending.

pub mod weights;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{age_days, clamp_rating, ContentEntity, EntityKind, LifecycleFlag, Product};
use crate::signals::PerformanceSummary;
use crate::text::stripped_char_len;
use weights::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormulaVariant {
    ContentPerformance,
    ContentFallback,
    ProductDeal,
    ProductQuality,
}

/// The product subset of [`FormulaVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductFormula {
    Deal,
    Quality,
}

impl From<ProductFormula> for FormulaVariant {
    fn from(f: ProductFormula) -> Self {
        match f {
            ProductFormula::Deal => FormulaVariant::ProductDeal,
            ProductFormula::Quality => FormulaVariant::ProductQuality,
        }
    }
}

/// Static attributes feeding the fallback formula.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FallbackInputs {
    /// Character length of the content with markup stripped.
    pub content_chars: usize,
    pub age_days: i64,
    pub rating: Option<f32>,
    /// Price of the associated product, if any.
    pub product_price: Option<f64>,
    pub sections_complete: bool,
}

impl FallbackInputs {
    pub fn from_entity(entity: &ContentEntity, now: DateTime<Utc>) -> Self {
        Self {
            content_chars: stripped_char_len(&entity.content),
            age_days: age_days(entity.created_at, now),
            rating: entity.rating,
            product_price: entity.product.as_ref().map(|p| p.price),
            sections_complete: entity.sections_complete,
        }
    }
}

/// Performance score from aggregated signals.
pub fn performance_score(s: &PerformanceSummary) -> f64 {
    let ctr = if s.avg_ctr.is_finite() {
        s.avg_ctr.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let position = if s.avg_position.is_finite() && s.avg_position > 0.0 {
        s.avg_position
    } else {
        POSITION_CAP
    };

    s.total_clicks as f64 * CLICK_WEIGHT
        + s.total_impressions as f64 * IMPRESSION_WEIGHT
        + ctr * CTR_SCALE
        + (POSITION_CAP - position.min(POSITION_CAP)).max(0.0)
}

/// Heuristic score for content without performance data.
pub fn fallback_score(i: &FallbackInputs) -> f64 {
    let length = (i.content_chars as f64 / CHARS_PER_LENGTH_POINT).min(LENGTH_SCORE_CAP);
    let freshness = (FRESHNESS_BASE - i.age_days.max(0) as f64).max(0.0);

    let mut bonuses = 0.0;
    if let Some(r) = i.rating {
        bonuses += RATING_BONUS * (f64::from(clamp_rating(r)) / RATING_SCALE_MAX);
    }
    if let Some(price) = i.product_price {
        bonuses += PRODUCT_BONUS;
        if price.is_finite() && price > PREMIUM_PRICE_THRESHOLD {
            bonuses += PREMIUM_PRODUCT_BONUS;
        }
    }
    if i.sections_complete {
        bonuses += SECTIONS_BONUS;
    }

    length + freshness + bonuses
}

/// Performance wins whenever it is positive; fallback otherwise.
pub fn content_score(performance: f64, fallback: f64) -> (f64, FormulaVariant) {
    if performance > 0.0 {
        (performance, FormulaVariant::ContentPerformance)
    } else {
        (fallback.max(0.0), FormulaVariant::ContentFallback)
    }
}

/// Combined discount/quality score for discount-ranked lists.
pub fn deal_score(p: &Product) -> f64 {
    p.discount_percent() + f64::from(p.rating_or_zero()) * DEAL_RATING_WEIGHT
}

/// Rating-only score for "best of" lists.
pub fn quality_score(p: &Product) -> f64 {
    f64::from(p.rating_or_zero()) * QUALITY_RATING_WEIGHT
}

/// A content item with its computed score for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntity {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub score: f64,
    pub age_days: i64,
    pub signals: PerformanceSummary,
    pub formula: FormulaVariant,
    /// Flag at evaluation time (informational; the executor re-reads storage).
    pub flag: LifecycleFlag,
}

/// A product with the score of the variant it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f64,
    /// Tie-break value: savings for deals, rating count for quality.
    pub secondary: f64,
    pub formula: FormulaVariant,
}

/// Evaluation-time scorer; `now` pins ages so a run is reproducible.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    now: DateTime<Utc>,
}

impl Scorer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Score a content item given its (possibly default) signal summary.
    pub fn score_content(&self, entity: &ContentEntity, summary: PerformanceSummary) -> ScoredEntity {
        let inputs = FallbackInputs::from_entity(entity, self.now);
        let (score, formula) = content_score(performance_score(&summary), fallback_score(&inputs));
        ScoredEntity {
            id: entity.id.clone(),
            kind: entity.kind,
            title: entity.title.clone(),
            score,
            age_days: inputs.age_days,
            signals: summary,
            formula,
            flag: entity.flag,
        }
    }

    pub fn score_product(&self, product: &Product, formula: ProductFormula) -> ScoredProduct {
        let (score, secondary) = match formula {
            ProductFormula::Deal => (deal_score(product), product.savings()),
            ProductFormula::Quality => (quality_score(product), f64::from(product.rating_count)),
        };
        ScoredProduct {
            product: product.clone(),
            score: score.max(0.0),
            secondary,
            formula: formula.into(),
        }
    }
}
