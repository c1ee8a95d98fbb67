//! Fallback cascade: an ordered list of progressively relaxed product filters.
//!
//! The policy is data ([`CascadeStage`]), the runner is a single loop. Each
//! stage only adds products not picked by an earlier stage; the run stops at the
//! first stage where the union reaches `n`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::model::Product;
use crate::ranking::select_top_n;
use crate::scoring::{ProductFormula, ScoredProduct, Scorer};

/// One filter stage. `None` disables a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStage {
    pub name: String,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub min_rating_count: Option<u32>,
    #[serde(default = "default_respect_exclusions")]
    pub respect_exclusions: bool,
}

fn default_respect_exclusions() -> bool {
    true
}

impl CascadeStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_rating: None,
            min_rating_count: None,
            respect_exclusions: true,
        }
    }

    pub fn min_rating(mut self, r: f32) -> Self {
        self.min_rating = Some(r);
        self
    }

    pub fn min_rating_count(mut self, c: u32) -> Self {
        self.min_rating_count = Some(c);
        self
    }

    pub fn ignore_exclusions(mut self) -> Self {
        self.respect_exclusions = false;
        self
    }

    /// Whether `p` passes this stage. Unavailable products never pass.
    pub fn admits(&self, p: &Product, exclude: &HashSet<String>) -> bool {
        if !p.available {
            return false;
        }
        if self.respect_exclusions && exclude.contains(&p.id) {
            return false;
        }
        if let Some(min) = self.min_rating {
            match p.rating {
                Some(r) if r >= min => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_rating_count {
            if p.rating_count < min {
                return false;
            }
        }
        true
    }
}

/// Top-N policy: strict → drop rating count → drop exclusions → rating 3.5.
pub fn default_cascade() -> Vec<CascadeStage> {
    vec![
        CascadeStage::new("strict").min_rating(4.0).min_rating_count(3),
        CascadeStage::new("drop-rating-count").min_rating(4.0),
        CascadeStage::new("drop-exclusions")
            .min_rating(4.0)
            .ignore_exclusions(),
        CascadeStage::new("relaxed-rating")
            .min_rating(3.5)
            .ignore_exclusions(),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOutcome {
    pub wanted: usize,
    pub picks: Vec<ScoredProduct>,
    /// Names of the stages that were evaluated, in order.
    pub stages_run: Vec<String>,
    /// Stage at which `n` was reached, `None` if it never was.
    pub satisfied_by: Option<String>,
}

impl CascadeOutcome {
    pub fn is_satisfied(&self) -> bool {
        self.picks.len() >= self.wanted
    }

    /// Number of stages run beyond the first.
    pub fn relaxations(&self) -> usize {
        self.stages_run.len().saturating_sub(1)
    }
}

/// Run `stages` in order until `n` products are picked or stages run out.
/// Products are ranked by quality (rating, then rating count) within a stage.
pub fn run_cascade(
    products: &[Product],
    stages: &[CascadeStage],
    n: usize,
    exclude: &HashSet<String>,
    scorer: &Scorer,
) -> CascadeOutcome {
    let mut picks: Vec<ScoredProduct> = Vec::with_capacity(n);
    let mut picked: HashSet<String> = HashSet::new();
    let mut stages_run = Vec::new();

    if n == 0 {
        return CascadeOutcome {
            wanted: n,
            picks,
            stages_run,
            satisfied_by: None,
        };
    }

    for stage in stages {
        stages_run.push(stage.name.clone());

        let matching: Vec<ScoredProduct> = products
            .iter()
            .filter(|p| !picked.contains(&p.id) && stage.admits(p, exclude))
            .map(|p| scorer.score_product(p, ProductFormula::Quality))
            .collect();
        let added = select_top_n(&matching, n - picks.len(), &HashSet::new());

        debug!(
            target: "ranking",
            stage = %stage.name,
            matched = matching.len(),
            added = added.len(),
            "cascade stage"
        );

        for sp in added {
            picked.insert(sp.product.id.clone());
            picks.push(sp);
        }

        if picks.len() >= n {
            return CascadeOutcome {
                wanted: n,
                picks,
                stages_run,
                satisfied_by: Some(stage.name.clone()),
            };
        }
    }

    warn!(
        target: "ranking",
        wanted = n,
        found = picks.len(),
        stages = stages_run.len(),
        "cascade exhausted without enough candidates"
    );
    CascadeOutcome {
        wanted: n,
        picks,
        stages_run,
        satisfied_by: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn p(id: &str, rating: Option<f32>, count: u32) -> Product {
        Product {
            id: id.into(),
            title: id.into(),
            price: 50.0,
            original_price: None,
            rating,
            rating_count: count,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            available: true,
        }
    }

    fn scorer() -> Scorer {
        Scorer::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
    }

    fn ids(o: &CascadeOutcome) -> Vec<&str> {
        o.picks.iter().map(|s| s.product.id.as_str()).collect()
    }

    #[test]
    fn stops_at_first_satisfying_stage() {
        let products = vec![p("a", Some(4.8), 10), p("b", Some(4.2), 5), p("c", Some(4.9), 1)];
        let out = run_cascade(&products, &default_cascade(), 2, &HashSet::new(), &scorer());
        assert_eq!(ids(&out), vec!["a", "b"]);
        assert_eq!(out.stages_run, vec!["strict"]);
        assert_eq!(out.satisfied_by.as_deref(), Some("strict"));
        assert_eq!(out.relaxations(), 0);
    }

    #[test]
    fn relaxes_in_order_and_unions_results() {
        let products = vec![
            p("strict", Some(4.5), 10),
            p("few-votes", Some(4.9), 1),
            p("excluded", Some(4.7), 20),
            p("okay", Some(3.6), 2),
            p("bad", Some(3.0), 50),
        ];
        let exclude: HashSet<String> = ["excluded".to_string()].into();
        let out = run_cascade(&products, &default_cascade(), 4, &exclude, &scorer());
        // Earlier-stage picks keep their place; later stages append.
        assert_eq!(ids(&out), vec!["strict", "few-votes", "excluded", "okay"]);
        assert_eq!(out.satisfied_by.as_deref(), Some("relaxed-rating"));
        assert_eq!(out.relaxations(), 3);
    }

    #[test]
    fn exhausted_cascade_returns_partial_union() {
        let products = vec![p("a", Some(4.5), 10), p("b", None, 0)];
        let out = run_cascade(&products, &default_cascade(), 5, &HashSet::new(), &scorer());
        assert_eq!(ids(&out), vec!["a"]);
        assert!(!out.is_satisfied());
        assert_eq!(out.stages_run.len(), 4);
    }

    #[test]
    fn unavailable_products_never_pass() {
        let mut gone = p("gone", Some(5.0), 100);
        gone.available = false;
        assert!(!CascadeStage::new("any").admits(&gone, &HashSet::new()));
    }

    #[test]
    fn stages_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Root {
            cascade: Vec<CascadeStage>,
        }
        let root: Root = toml::from_str(
            r#"
[[cascade]]
name = "strict"
min_rating = 4.0
min_rating_count = 3

[[cascade]]
name = "anything"
respect_exclusions = false
"#,
        )
        .unwrap();
        assert_eq!(root.cascade[0], CascadeStage::new("strict").min_rating(4.0).min_rating_count(3));
        assert!(!root.cascade[1].respect_exclusions);
        assert_eq!(root.cascade[1].min_rating, None);
    }
}
