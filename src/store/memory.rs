use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{new_document_id, Document, DocumentStore, Filter};

type Collection = BTreeMap<String, Value>;

/// Process-local store used for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, data: Value) -> anyhow::Result<String> {
        let id = new_document_id();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        debug!(%collection, %id, "document added");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
        let Value::Object(patch) = data else {
            anyhow::bail!("merge payload must be a JSON object");
        };
        let mut guard = self.collections.write().await;
        let entry = guard
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        match entry {
            Value::Object(existing) => existing.extend(patch),
            other => *other = Value::Object(patch),
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if let Some(c) = self.collections.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Document>> {
        let guard = self.collections.read().await;
        let Some(c) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        let docs = c
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();
        Ok(docs)
    }
}
