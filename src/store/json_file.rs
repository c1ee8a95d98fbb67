// src/store/json_file.rs
//! JSON dataset on disk: `{ "products": [...], "content": [...], "signals": [...] }`.
//! Flag writes rewrite the file through a temp file + rename.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::model::{ContentEntity, EntityKind, LifecycleFlag, Product};
use crate::signals::{SignalRow, SignalSource};
use crate::site::SiteContext;
use crate::store::{ContentStore, Dataset};

pub const ENV_DATA_PATH: &str = "LIFECYCLE_DATA_PATH";
pub const DEFAULT_DATA_PATH: &str = "data/site.json";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Dataset,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading dataset from {}", path.display()))?;
        let data: Dataset = serde_json::from_str(&raw)
            .with_context(|| format!("parsing dataset {}", path.display()))?;
        tracing::debug!(
            target: "store",
            path = %path.display(),
            content = data.content.len(),
            products = data.products.len(),
            signals = data.signals.len(),
            "dataset loaded"
        );
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn persist(&self) -> Result<()> {
        let body = serde_json::to_vec_pretty(&self.data).context("serializing dataset")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl ContentStore for JsonFileStore {
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
        let entity = self
            .data
            .find_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let previous = entity.flag;
        if previous == flag {
            return Ok(());
        }
        entity.flag = flag;

        if let Err(e) = self.persist() {
            // Keep memory consistent with disk.
            if let Some(entity) = self.data.find_mut(id) {
                entity.flag = previous;
            }
            return Err(EngineError::Storage(format!("{e:#}")));
        }
        Ok(())
    }
}

impl SignalSource for JsonFileStore {
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
