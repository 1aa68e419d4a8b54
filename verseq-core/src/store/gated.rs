use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::{MemoryStore, Store};

/// A store wrapper for tests: counts calls, fails or panics on demand and can hold calls open.
pub(crate) struct GatedStore {
    inner: MemoryStore,
    gate: Option<Arc<Semaphore>>,
    pub(crate) exists_calls: AtomicUsize,
    pub(crate) create_calls: AtomicUsize,
    pub(crate) schema_calls: AtomicUsize,
    pub(crate) bulk_calls: AtomicUsize,
    pub(crate) fail_exists: AtomicBool,
    pub(crate) fail_bulk: AtomicBool,
    pub(crate) panic_exists: AtomicBool,
    pub(crate) panic_bulk: AtomicBool,
}

impl GatedStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: None,
            exists_calls: Default::default(),
            create_calls: Default::default(),
            schema_calls: Default::default(),
            bulk_calls: Default::default(),
            fail_exists: Default::default(),
            fail_bulk: Default::default(),
            panic_exists: Default::default(),
            panic_bulk: Default::default(),
        }
    }

    /// Every call waits for one permit of the returned semaphore before going on.
    pub(crate) fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut store = Self::new();
        store.gate.replace(Clone::clone(&gate));
        (store, gate)
    }

    pub(crate) fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub(crate) fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    async fn pass(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn resource_exists(&self, resource: &str) -> anyhow::Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.pass().await;
        if self.panic_exists.load(Ordering::SeqCst) {
            panic!("store client crashed while checking '{}'", resource);
        }
        if self.fail_exists.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.resource_exists(resource).await
    }

    async fn create_resource(&self, resource: &str, config: &Value) -> anyhow::Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_resource(resource, config).await
    }

    async fn update_schema(
        &self,
        resource: &str,
        kind: &str,
        schema: &Value,
    ) -> anyhow::Result<()> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update_schema(resource, kind, schema).await
    }

    async fn bulk_version(
        &self,
        resource: &str,
        kind: &str,
        key: &str,
        count: u64,
    ) -> anyhow::Result<Vec<u64>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.pass().await;
        if self.panic_bulk.load(Ordering::SeqCst) {
            panic!("store client crashed while writing '{}'", key);
        }
        if self.fail_bulk.load(Ordering::SeqCst) {
            bail!("bulk request timed out");
        }
        self.inner.bulk_version(resource, kind, key, count).await
    }
}
