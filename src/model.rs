//! model.rs: read models supplied by storage (content items, products) and the
//! single persisted field the engine ever writes: the lifecycle flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Review,
    BlogPost,
}

/// Publication/indexing state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleFlag {
    /// Published and indexable.
    #[default]
    Indexed,
    /// Published, robots `noindex,nofollow`.
    NoIndex,
    /// Unpublished.
    Draft,
}

impl LifecycleFlag {
    /// Robots directive rendered for the page, `None` when not published.
    pub fn robots_directive(self) -> Option<&'static str> {
        match self {
            LifecycleFlag::Indexed => Some("index,follow"),
            LifecycleFlag::NoIndex => Some("noindex,nofollow"),
            LifecycleFlag::Draft => None,
        }
    }
}

impl fmt::Display for LifecycleFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleFlag::Indexed => "indexed",
            LifecycleFlag::NoIndex => "noindex",
            LifecycleFlag::Draft => "draft",
        };
        f.write_str(s)
    }
}

/// Product associated with a review or post (only what scoring needs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub price: f64,
}

/// A review or blog post as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Body, HTML allowed.
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Quality rating on a 0..=5 scale.
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub product: Option<ProductRef>,
    /// All required sections (pros, cons, verdict, ...) are populated.
    #[serde(default)]
    pub sections_complete: bool,
    #[serde(default)]
    pub flag: LifecycleFlag,
}

/// Marketplace product as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Product {
    /// Absolute currency savings against the original price, within `0..=original`.
    pub fn savings(&self) -> f64 {
        match self.original_price {
            Some(orig) if orig.is_finite() && self.price.is_finite() => {
                (orig.max(0.0) - self.price.max(0.0)).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Discount in percent of the original price, 0 without a usable original price.
    pub fn discount_percent(&self) -> f64 {
        match self.original_price {
            Some(orig) if orig.is_finite() && orig > 0.0 => self.savings() / orig * 100.0,
            _ => 0.0,
        }
    }

    pub fn is_discounted(&self) -> bool {
        self.savings() > 0.0
    }

    /// Rating clamped to 0..=5; missing rating counts as 0.
    pub fn rating_or_zero(&self) -> f32 {
        self.rating.map(clamp_rating).unwrap_or(0.0)
    }
}

/// Whole days between `created_at` and `now`, floored at 0.
pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

pub(crate) fn clamp_rating(r: f32) -> f32 {
    if r.is_finite() {
        r.clamp(0.0, 5.0)
    } else {
        0.0
    }
}
