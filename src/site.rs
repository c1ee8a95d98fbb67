//! Explicit site context: which site's signals are being evaluated.
//!
//! Resolved once at startup (CLI flag → `SITE_URL` → config file) and passed
//! down; nothing in the engine reads ambient process state for it.

use crate::error::{EngineError, EngineResult};

pub const ENV_SITE_URL: &str = "SITE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    url: String,
}

impl SiteContext {
    /// Build from a URL; empty or whitespace-only input is a missing configuration.
    pub fn new(url: impl Into<String>) -> EngineResult<Self> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(EngineError::MissingConfiguration("site url".into()));
        }
        Ok(Self {
            url: trimmed.to_string(),
        })
    }

    /// First non-empty candidate wins, in order.
    pub fn resolve<'a, I>(candidates: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .map(Self::new)
            .unwrap_or_else(|| Err(EngineError::MissingConfiguration("site url".into())))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a signal row's site field refers to this site.
    pub fn matches(&self, site: &str) -> bool {
        site.trim().trim_end_matches('/').eq_ignore_ascii_case(&self.url)
    }
}
