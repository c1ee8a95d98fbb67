// src/store/mod.rs
//! Storage seam. The engine reads content, products and signals, and writes
//! exactly one field back: the lifecycle flag.

pub mod json_file;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::model::{ContentEntity, EntityKind, LifecycleFlag, Product};
use crate::signals::SignalRow;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub trait ContentStore {
    /// Content items of one kind (reviews or blog posts).
    fn content(&self, kind: EntityKind) -> EngineResult<Vec<ContentEntity>>;

    fn products(&self) -> EngineResult<Vec<Product>>;

    fn flag(&self, id: &str) -> EngineResult<LifecycleFlag>;

    /// Persist a new flag. Setting the current value again must succeed.
    fn set_flag(&mut self, id: &str, flag: LifecycleFlag) -> EngineResult<()>;
}

/// Serializable snapshot of everything the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub content: Vec<ContentEntity>,
    #[serde(default)]
    pub signals: Vec<SignalRow>,
}

impl Dataset {
    pub(crate) fn content_of(&self, kind: EntityKind) -> Vec<ContentEntity> {
        self.content.iter().filter(|c| c.kind == kind).cloned().collect()
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut ContentEntity> {
        self.content.iter_mut().find(|c| c.id == id)
    }

    pub(crate) fn find(&self, id: &str) -> Option<&ContentEntity> {
        self.content.iter().find(|c| c.id == id)
    }
}
