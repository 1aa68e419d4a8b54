use async_trait::async_trait;
use serde_json::{json, Value};

pub use memory::MemoryStore;
pub use registry::{load, register};

mod memory;
mod registry;

#[cfg(test)]
pub(crate) mod gated;

/// A versioned document store used as the source of sequence identifiers.
///
/// Every write to the same `(resource, kind, key)` document bumps its version by one,
/// and that version number is what gets handed out as an identifier.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn resource_exists(&self, resource: &str) -> anyhow::Result<bool>;

    async fn create_resource(&self, resource: &str, config: &Value) -> anyhow::Result<()>;

    /// Applies the schema of a sub resource, must succeed if the schema is already present.
    async fn update_schema(&self, resource: &str, kind: &str, schema: &Value)
        -> anyhow::Result<()>;

    /// Writes the document `key` for `count` times in one round trip, and returns the
    /// resulting versions in increasing order.
    async fn bulk_version(
        &self,
        resource: &str,
        kind: &str,
        key: &str,
        count: u64,
    ) -> anyhow::Result<Vec<u64>>;
}

/// The mapping of a sequence document: nothing is stored or indexed, only the version counts.
pub fn kind_mapping() -> Value {
    json!({
        "_source": { "enabled": false },
        "_all": { "enabled": false },
        "enabled": false,
    })
}

/// The body used to create a new resource holding sequences of `kind`.
pub fn resource_config(kind: &str) -> Value {
    let mut mappings = serde_json::Map::new();
    mappings.insert(kind.to_string(), kind_mapping());

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1,
        },
        "mappings": mappings,
    })
}

/// The body used to put the mapping of `kind` into an existing resource.
pub fn schema_update(kind: &str) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(kind.to_string(), kind_mapping());
    Value::Object(body)
}
