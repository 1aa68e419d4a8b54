use std::time::Duration;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;

use verseq_etc::{BatchSize, StoreConfig};

use crate::{Result, VerseqError};

use super::Store;

#[derive(Default)]
struct Resource {
    config: Value,
    mappings: HashMap<String, Value>,
    versions: HashMap<(String, String), u64, ahash::RandomState>,
}

/// An in-process store which keeps one version counter per document.
#[derive(Default)]
pub struct MemoryStore {
    latency: Option<Duration>,
    resources: Mutex<HashMap<String, Resource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Delays every operation, which makes the store behave like a remote one.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency.replace(latency);
        self
    }

    /// The mapping of `kind` in `resource`, if any.
    pub fn mapping(&self, resource: &str, kind: &str) -> Option<Value> {
        let r = self.resources.lock();
        r.get(resource).and_then(|it| it.mappings.get(kind).cloned())
    }

    /// The configuration `resource` was created with.
    pub fn config(&self, resource: &str) -> Option<Value> {
        let r = self.resources.lock();
        r.get(resource).map(|it| it.config.clone())
    }

    /// The current version of a document, 0 if it was never written.
    pub fn version(&self, resource: &str, kind: &str, key: &str) -> u64 {
        let r = self.resources.lock();
        r.get(resource)
            .and_then(|it| {
                it.versions
                    .get(&(kind.to_string(), key.to_string()))
                    .copied()
            })
            .unwrap_or_default()
    }

    #[inline]
    async fn delay(&self) {
        if let Some(d) = self.latency {
            tokio::time::sleep(d).await;
        }
    }
}

impl TryFrom<&StoreConfig> for MemoryStore {
    type Error = VerseqError;

    fn try_from(value: &StoreConfig) -> Result<Self> {
        let mut store = MemoryStore::new();
        if let Some(v) = value.props.get("latency") {
            let d = v
                .as_str()
                .and_then(|s| duration_str::parse_std(s).ok())
                .ok_or_else(|| {
                    VerseqError::InvalidConfig(format!("invalid latency {:?}", v).into())
                })?;
            store = store.latency(d);
        }
        Ok(store)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn resource_exists(&self, resource: &str) -> anyhow::Result<bool> {
        self.delay().await;
        let r = self.resources.lock();
        Ok(r.contains_key(resource))
    }

    async fn create_resource(&self, resource: &str, config: &Value) -> anyhow::Result<()> {
        self.delay().await;
        let mut w = self.resources.lock();
        if w.contains_key(resource) {
            bail!("resource_already_exists_exception: {}", resource);
        }

        let mut mappings: HashMap<String, Value> = Default::default();
        if let Some(m) = config.get("mappings").and_then(|it| it.as_object()) {
            for (k, v) in m {
                mappings.insert(k.clone(), v.clone());
            }
        }

        w.insert(
            resource.to_string(),
            Resource {
                config: config.clone(),
                mappings,
                versions: Default::default(),
            },
        );

        Ok(())
    }

    async fn update_schema(
        &self,
        resource: &str,
        kind: &str,
        schema: &Value,
    ) -> anyhow::Result<()> {
        self.delay().await;
        let mut w = self.resources.lock();
        let res = w
            .get_mut(resource)
            .ok_or_else(|| anyhow!("index_not_found_exception: {}", resource))?;

        let mapping = schema
            .get(kind)
            .cloned()
            .ok_or_else(|| anyhow!("no mapping of '{}' found in schema", kind))?;

        if let Some(exist) = res.mappings.get(kind) {
            if exist != &mapping {
                bail!("illegal_argument_exception: conflicting mapping of '{}'", kind);
            }
            return Ok(());
        }

        res.mappings.insert(kind.to_string(), mapping);

        Ok(())
    }

    async fn bulk_version(
        &self,
        resource: &str,
        kind: &str,
        key: &str,
        count: u64,
    ) -> anyhow::Result<Vec<u64>> {
        if count > BatchSize::MAX {
            bail!(
                "illegal_argument_exception: bulk of {} writes exceeds {}",
                count,
                BatchSize::MAX
            );
        }

        self.delay().await;
        let mut w = self.resources.lock();
        let res = w
            .get_mut(resource)
            .ok_or_else(|| anyhow!("index_not_found_exception: {}", resource))?;

        let version = res
            .versions
            .entry((kind.to_string(), key.to_string()))
            .or_insert(0);

        let first = *version;
        let last = first
            .checked_add(count)
            .ok_or_else(|| anyhow!("version_conflict_engine_exception: {} overflows", key))?;
        *version = last;

        Ok((1..=count).map(|i| first + i).collect())
    }
}
