//! # Signal Repository
//! Read-only access to dated search-performance rows (clicks, impressions,
//! CTR, position) for one site, aggregated into a [`PerformanceSummary`] per
//! entity and date range.
//!
//! Absence of data is never an error: callers get the default summary and
//! decide on a fallback. A missing site URL is, and surfaces at construction.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{EngineError, EngineResult};
use crate::model::ContentEntity;
use crate::site::SiteContext;
use crate::text::query_fragment;

/// Position used when there is no data: far enough down to score nothing.
pub const DEFAULT_POSITION: f64 = 100.0;

/// One dated measurement for a query or page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub site: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default = "default_position")]
    pub position: f64,
}

fn default_position() -> f64 {
    DEFAULT_POSITION
}

/// Aggregated signals for one entity over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_clicks: u64,
    pub total_impressions: u64,
    /// Mean CTR in [0, 1].
    pub avg_ctr: f64,
    /// Mean position, > 0.
    pub avg_position: f64,
    pub query_count: u64,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            total_clicks: 0,
            total_impressions: 0,
            avg_ctr: 0.0,
            avg_position: DEFAULT_POSITION,
            query_count: 0,
        }
    }
}

impl PerformanceSummary {
    pub fn has_data(&self) -> bool {
        self.total_clicks > 0 || self.total_impressions > 0
    }
}

/// Inclusive date range; `start == None` means "all time".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn all_time(end: NaiveDate) -> Self {
        Self { start: None, end }
    }

    /// `days == 0` → all time, otherwise the last `days` days up to `today`.
    /// A window reaching past the earliest representable date is all time too.
    pub fn from_window_days(days: u32, today: NaiveDate) -> Self {
        if days == 0 {
            return Self::all_time(today);
        }
        match today.checked_sub_signed(Duration::days(i64::from(days))) {
            Some(start) => Self {
                start: Some(start),
                end: today,
            },
            None => Self::all_time(today),
        }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d <= self.end && self.start.map_or(true, |s| d >= s)
    }
}

/// How an entity is matched against signal rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKey {
    /// Exact page URL (trailing slash insensitive).
    Page(String),
    /// Case-insensitive substring of the search query.
    Query(String),
}

impl SignalKey {
    /// Page key when the entity has a URL, otherwise a title-derived query fragment.
    pub fn for_entity(entity: &ContentEntity) -> Self {
        match entity.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => SignalKey::Page(u.to_string()),
            _ => SignalKey::Query(query_fragment(&entity.title)),
        }
    }

    fn matches(&self, row: &SignalRow) -> bool {
        match self {
            SignalKey::Page(url) => row
                .page
                .as_deref()
                .is_some_and(|p| normalize_url(p) == normalize_url(url)),
            SignalKey::Query(fragment) => {
                if fragment.is_empty() {
                    return false;
                }
                row.query
                    .as_deref()
                    .is_some_and(|q| q.to_lowercase().contains(fragment.as_str()))
            }
        }
    }
}

fn normalize_url(u: &str) -> &str {
    u.trim().trim_end_matches('/')
}

/// Where signal rows come from (search-console export, database, fixtures...).
pub trait SignalSource {
    fn load_signals(&self, site: &SiteContext) -> anyhow::Result<Vec<SignalRow>>;
}

/// Site-scoped, in-memory view over signal rows.
#[derive(Debug, Clone)]
pub struct SignalRepository {
    site: SiteContext,
    rows: Vec<SignalRow>,
}

impl SignalRepository {
    /// Load every row for `site` from `source`; rows of other sites are dropped.
    pub fn load(site: &SiteContext, source: &dyn SignalSource) -> EngineResult<Self> {
        let rows = source
            .load_signals(site)
            .map_err(|e| EngineError::Storage(format!("loading signals: {e:#}")))?;
        Ok(Self::from_rows(site.clone(), rows))
    }

    pub fn from_rows(site: SiteContext, rows: Vec<SignalRow>) -> Self {
        let rows = rows.into_iter().filter(|r| site.matches(&r.site)).collect();
        Self { site, rows }
    }

    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Aggregate matching rows in `range`; default summary when nothing matches.
    pub fn summary(&self, key: &SignalKey, range: &DateRange) -> PerformanceSummary {
        aggregate(
            self.rows
                .iter()
                .filter(|r| range.contains(r.date) && key.matches(r)),
        )
    }
}

/// Sum clicks/impressions, average CTR/position, count distinct queries.
pub fn aggregate<'a, I>(rows: I) -> PerformanceSummary
where
    I: IntoIterator<Item = &'a SignalRow>,
{
    let mut n = 0u64;
    let mut clicks = 0u64;
    let mut impressions = 0u64;
    let mut ctr_sum = 0.0f64;
    let mut pos_sum = 0.0f64;
    let mut queries: HashSet<String> = HashSet::new();

    for r in rows {
        n += 1;
        clicks += r.clicks.max(0) as u64;
        impressions += r.impressions.max(0) as u64;
        ctr_sum += sanitize_ctr(r.ctr);
        pos_sum += sanitize_position(r.position);
        if let Some(q) = r.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            queries.insert(q.to_lowercase());
        }
    }

    if n == 0 {
        return PerformanceSummary::default();
    }

    PerformanceSummary {
        total_clicks: clicks,
        total_impressions: impressions,
        avg_ctr: ctr_sum / n as f64,
        avg_position: pos_sum / n as f64,
        query_count: queries.len() as u64,
    }
}

fn sanitize_ctr(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn sanitize_position(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        DEFAULT_POSITION
    }
}
