// src/config.rs
//! TOML configuration: site, audit/review parameters, cascade policy, homepage slots.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::lifecycle::{CategorizeParams, DEFAULT_WEAK_SIGNAL_IMPRESSIONS};
use crate::ranking::{default_cascade, CascadeStage, SmartPickParams};
use crate::site::ENV_SITE_URL;

// --- env defaults & names ---
pub const DEFAULT_LIFECYCLE_CONFIG_PATH: &str = "config/lifecycle.toml";
pub const ENV_LIFECYCLE_CONFIG_PATH: &str = "LIFECYCLE_CONFIG_PATH";

const DEFAULT_KEEP_PERCENTAGE: u8 = 70;
const DEFAULT_GRACE_PERIOD_DAYS: i64 = 60;
const DEFAULT_MIN_AGE_DAYS: i64 = 30;
const DEFAULT_WINDOW_DAYS: u32 = 90;
const DEFAULT_TOP_COUNT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub url: Option<String>,
}

/// Parameters of one lifecycle audit (`[audit]` for blog posts, `[reviews]` for reviews).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub keep_percentage: u8,
    pub grace_period_days: i64,
    /// Younger entities are not evaluated at all.
    pub min_age_days: i64,
    /// Signal window; 0 = all time.
    pub window_days: u32,
    pub weak_signal_impressions: u64,
    /// Rows shown per bucket in text output.
    pub top_count: usize,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            keep_percentage: DEFAULT_KEEP_PERCENTAGE,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            min_age_days: DEFAULT_MIN_AGE_DAYS,
            window_days: DEFAULT_WINDOW_DAYS,
            weak_signal_impressions: DEFAULT_WEAK_SIGNAL_IMPRESSIONS,
            top_count: DEFAULT_TOP_COUNT,
        }
    }
}

impl AuditSection {
    pub fn categorize_params(&self) -> CategorizeParams {
        CategorizeParams {
            keep_percentage: self.keep_percentage,
            grace_period_days: self.grace_period_days,
            weak_signal_impressions: self.weak_signal_impressions,
        }
    }

    fn sanitize(&mut self) {
        self.keep_percentage = self.keep_percentage.min(100);
        if self.grace_period_days < 0 {
            self.grace_period_days = DEFAULT_GRACE_PERIOD_DAYS;
        }
        if self.min_age_days < 0 {
            self.min_age_days = DEFAULT_MIN_AGE_DAYS;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub site: SiteSection,
    pub audit: AuditSection,
    pub reviews: AuditSection,
    pub cascade: Vec<CascadeStage>,
    pub picks: SmartPickParams,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            site: SiteSection::default(),
            audit: AuditSection::default(),
            reviews: AuditSection::default(),
            cascade: default_cascade(),
            picks: SmartPickParams::default(),
        }
    }
}

impl LifecycleConfig {
    /// Resolve the path from `LIFECYCLE_CONFIG_PATH` or the default location.
    /// An explicit env path must exist; a missing default file yields built-in defaults.
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_LIFECYCLE_CONFIG_PATH) {
            let path = PathBuf::from(p);
            if !path.exists() {
                return Err(anyhow!(
                    "{ENV_LIFECYCLE_CONFIG_PATH} points to non-existent path {}",
                    path.display()
                ));
            }
            return Self::load_from(&path);
        }
        Self::load_or_default(Path::new(DEFAULT_LIFECYCLE_CONFIG_PATH))
    }

    /// Like [`load_from`](Self::load_from) but a missing file is not an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(target: "config", path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading lifecycle config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&content)
            .with_context(|| format!("parsing lifecycle config {}", path.display()))?;
        info!(
            target: "config",
            path = %path.display(),
            stages = cfg.cascade.len(),
            "lifecycle config loaded"
        );
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: LifecycleConfig = toml::from_str(toml_str)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `SITE_URL` wins over `[site].url`.
    pub fn site_url(&self) -> Option<String> {
        std::env::var(ENV_SITE_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.site.url.clone())
    }

    fn sanitize(&mut self) {
        self.audit.sanitize();
        self.reviews.sanitize();

        // An empty policy would never pick anything.
        if self.cascade.is_empty() {
            self.cascade = default_cascade();
        }
        for stage in &mut self.cascade {
            stage.min_rating = stage
                .min_rating
                .filter(|r| r.is_finite())
                .map(|r| r.clamp(0.0, 5.0));
        }

        let defaults = SmartPickParams::default();
        if !self.picks.min_deal_rating.is_finite() {
            self.picks.min_deal_rating = defaults.min_deal_rating;
        }
        self.picks.min_deal_rating = self.picks.min_deal_rating.clamp(0.0, 5.0);
        if self.picks.recent_window_days < 0 {
            self.picks.recent_window_days = defaults.recent_window_days;
        }
    }
}
