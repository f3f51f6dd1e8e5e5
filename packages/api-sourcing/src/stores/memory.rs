//! In-memory host implementation for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::traits::host::{BoxError, BuildCache, RecordStore, TypeRegistry};
use crate::types::record::EmittedRecord;

/// In-memory record store, build cache, and type registry in one value.
///
/// Useful for tests and development; data is lost on drop. Record ids are
/// deterministic v5 UUIDs over the seed, matching the host contract that
/// equal seeds always allocate equal ids.
pub struct MemoryStore {
    records: RwLock<HashMap<String, EmittedRecord>>,
    cache: RwLock<HashMap<String, Value>>,
    types: RwLock<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            types: RwLock::new(Vec::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
        self.cache.write().unwrap().clear();
        self.types.write().unwrap().clear();
    }

    /// Number of stored records. Records with equal ids replace each
    /// other, so re-ingesting identical data leaves the count unchanged.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// All stored records, in no particular order.
    pub fn records(&self) -> Vec<EmittedRecord> {
        self.records.read().unwrap().values().cloned().collect()
    }

    /// Records of one type.
    pub fn records_of_type(&self, record_type: &str) -> Vec<EmittedRecord> {
        self.records
            .read()
            .unwrap()
            .values()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect()
    }

    /// Registered type definitions, in registration order.
    pub fn type_definitions(&self) -> Vec<String> {
        self.types.read().unwrap().clone()
    }

    /// Raw cache entry, for test assertions.
    pub fn cache_entry(&self, key: &str) -> Option<Value> {
        self.cache.read().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn node_id(&self, seed: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
    }

    async fn create(&self, record: EmittedRecord) -> Result<(), BoxError> {
        self.records
            .write()
            .unwrap()
            .insert(record.id.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl BuildCache for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, BoxError> {
        Ok(self.cache.read().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), BoxError> {
        self.cache.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

impl TypeRegistry for MemoryStore {
    fn create_types(&self, definition: &str) -> Result<(), BoxError> {
        self.types.write().unwrap().push(definition.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_deterministic() {
        let store = MemoryStore::new();
        assert_eq!(store.node_id("externalRepoAbc"), store.node_id("externalRepoAbc"));
        assert_ne!(store.node_id("a"), store.node_id("b"));
    }

    #[test]
    fn equal_ids_replace() {
        let store = MemoryStore::new();
        let record = EmittedRecord {
            id: "x".to_string(),
            record_type: "ExternalRepo".to_string(),
            fields: Default::default(),
            content: "{}".to_string(),
            content_digest: "d".to_string(),
            media_type: EmittedRecord::MEDIA_TYPE.to_string(),
        };
        tokio_test::block_on(async {
            store.create(record.clone()).await.unwrap();
            store.create(record).await.unwrap();
        });
        assert_eq!(store.record_count(), 1);
    }
}
