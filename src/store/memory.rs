// src/store/memory.rs
//! In-memory store for fixtures and tests, with injectable write failures.

use std::collections::HashSet;

use crate::error::{EngineError, EngineResult};
use crate::model::{ContentEntity, EntityKind, LifecycleFlag, Product};
use crate::signals::{SignalRow, SignalSource};
use crate::site::SiteContext;
use crate::store::{ContentStore, Dataset};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
    fail_writes: HashSet<String>,
    /// Number of successful `set_flag` calls.
    pub writes: usize,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            fail_writes: HashSet::new(),
            writes: 0,
        }
    }

    /// Make every write to `id` fail.
    pub fn fail_writes_for(mut self, id: impl Into<String>) -> Self {
        self.fail_writes.insert(id.into());
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// `(id, flag)` for all content, in storage order.
    pub fn flags(&self) -> Vec<(String, LifecycleFlag)> {
        self.data
            .content
            .iter()
            .map(|c| (c.id.clone(), c.flag))
            .collect()
    }
}

impl ContentStore for MemoryStore {
    fn content(&self, kind: EntityKind) -> EngineResult<Vec<ContentEntity>> {
        Ok(self.data.content_of(kind))
    }

    fn products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.data.products.clone())
    }

    fn flag(&self, id: &str) -> EngineResult<LifecycleFlag> {
        self.data
            .find(id)
            .map(|c| c.flag)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    fn set_flag(&mut self, id: &str, flag: LifecycleFlag) -> EngineResult<()> {
        if self.fail_writes.contains(id) {
            return Err(EngineError::Storage(format!("write rejected for {id}")));
        }
        let entity = self
            .data
            .find_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        entity.flag = flag;
        self.writes += 1;
        Ok(())
    }
}

impl SignalSource for MemoryStore {
    fn load_signals(&self, site: &SiteContext) -> anyhow::Result<Vec<SignalRow>> {
        Ok(self
            .data
            .signals
            .iter()
            .filter(|r| site.matches(&r.site))
            .cloned()
            .collect())
    }
}
