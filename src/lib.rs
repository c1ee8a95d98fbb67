// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod schedule;
pub mod scoring;
pub mod signals;
pub mod site;
pub mod store;
pub mod telemetry;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::config::LifecycleConfig;
pub use crate::error::{EngineError, EngineResult, Warning};
pub use crate::lifecycle::{categorize, Bucket, Categorization, CategorizeParams};
pub use crate::model::{ContentEntity, EntityKind, LifecycleFlag, Product};
pub use crate::pipeline::{run_audit, AuditParams, AuditReport, AuditTarget};
pub use crate::scoring::{FormulaVariant, ScoredEntity, Scorer};
pub use crate::signals::{PerformanceSummary, SignalRepository};
pub use crate::site::SiteContext;
pub use crate::store::{ContentStore, Dataset, JsonFileStore, MemoryStore};
