use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// A stored document: its id within the collection plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Equality on a top-level field of a document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// A missing field never matches.
    pub fn matches(&self, data: &Value) -> bool {
        data.get(self.field.as_str()) == Some(&self.value)
    }
}

/// Builds the path of a collection nested under a document,
/// e.g. `user_workouts/{uid}/favorites`.
pub fn nested(parent: &str, doc_id: &str, child: &str) -> String {
    format!("{}/{}/{}", parent, doc_id, child)
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Collection-scoped document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document under a fresh server-assigned id.
    async fn add(&self, collection: &str, data: Value) -> anyhow::Result<String>;
    /// Full overwrite, creating the document if absent.
    async fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()>;
    /// Shallow merge of top-level keys, creating the document if absent.
    async fn merge(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()>;
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>>;
    /// Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()>;
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Document>>;
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        self.query(collection, &[], None).await
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    /// Wraps a store and counts every call that reaches it.
    pub struct CountingStore {
        inner: Arc<dyn DocumentStore>,
        calls: AtomicUsize,
    }

    impl CountingStore {
        pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn add(&self, collection: &str, data: Value) -> anyhow::Result<String> {
            self.hit();
            self.inner.add(collection, data).await
        }
        async fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
            self.hit();
            self.inner.set(collection, id, data).await
        }
        async fn merge(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
            self.hit();
            self.inner.merge(collection, id, data).await
        }
        async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
            self.hit();
            self.inner.get(collection, id).await
        }
        async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
            self.hit();
            self.inner.delete(collection, id).await
        }
        async fn query(
            &self,
            collection: &str,
            filters: &[Filter],
            limit: Option<usize>,
        ) -> anyhow::Result<Vec<Document>> {
            self.hit();
            self.inner.query(collection, filters, limit).await
        }
    }

    /// Every call fails, standing in for an unreachable backend.
    pub struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn add(&self, _c: &str, _d: Value) -> anyhow::Result<String> {
            anyhow::bail!("store unavailable")
        }
        async fn set(&self, _c: &str, _i: &str, _d: Value) -> anyhow::Result<()> {
            anyhow::bail!("store unavailable")
        }
        async fn merge(&self, _c: &str, _i: &str, _d: Value) -> anyhow::Result<()> {
            anyhow::bail!("store unavailable")
        }
        async fn get(&self, _c: &str, _i: &str) -> anyhow::Result<Option<Document>> {
            anyhow::bail!("store unavailable")
        }
        async fn delete(&self, _c: &str, _i: &str) -> anyhow::Result<()> {
            anyhow::bail!("store unavailable")
        }
        async fn query(
            &self,
            _c: &str,
            _f: &[Filter],
            _l: Option<usize>,
        ) -> anyhow::Result<Vec<Document>> {
            anyhow::bail!("store unavailable")
        }
    }
}
