//! Formula constants. Empirically chosen; changing any of them changes
//! observable ranking, so they live in one place and are not tuned at runtime.

// --- content performance ---
pub const CLICK_WEIGHT: f64 = 10.0;
pub const IMPRESSION_WEIGHT: f64 = 0.5;
/// CTR in [0,1] mapped onto a 0..100 bonus.
pub const CTR_SCALE: f64 = 100.0;
/// Position cap; also the no-data sentinel.
pub const POSITION_CAP: f64 = 100.0;

// --- content fallback ---
pub const LENGTH_SCORE_CAP: f64 = 50.0;
pub const CHARS_PER_LENGTH_POINT: f64 = 50.0;
pub const FRESHNESS_BASE: f64 = 100.0;
pub const RATING_BONUS: f64 = 20.0;
pub const RATING_SCALE_MAX: f64 = 5.0;
pub const PRODUCT_BONUS: f64 = 15.0;
pub const PREMIUM_PRODUCT_BONUS: f64 = 10.0;
pub const PREMIUM_PRICE_THRESHOLD: f64 = 200.0;
pub const SECTIONS_BONUS: f64 = 15.0;

// --- products ---
/// Deal score: discount percent + rating * this.
pub const DEAL_RATING_WEIGHT: f64 = 10.0;
/// Quality score: rating * this (0..100).
pub const QUALITY_RATING_WEIGHT: f64 = 20.0;
