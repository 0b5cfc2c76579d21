use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use super::{new_document_id, Document, DocumentStore, Filter};

/// Documents live in a single JSONB table keyed by (collection, id).
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Value>,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            data: r.data.0,
        }
    }
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Emitted as `@>` containment so the GIN index on `data` applies.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    qb.push(" AND data @> jsonb_build_object(");
    qb.push_bind(filter.field.clone());
    qb.push("::text, ");
    qb.push_bind(Json(filter.value.clone()));
    qb.push(")");
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn add(&self, collection: &str, data: Value) -> anyhow::Result<String> {
        let id = new_document_id();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(data))
        .execute(&self.db)
        .await
        .context("documents add")?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&self.db)
        .await
        .context("documents set")?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
        if !data.is_object() {
            anyhow::bail!("merge payload must be a JSON object");
        }
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&self.db)
        .await
        .context("documents merge")?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("documents get")?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.db)
            .await
            .context("documents delete")?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        for f in filters {
            push_filter(&mut qb, f);
        }
        qb.push(" ORDER BY id");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }
        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.db)
            .await
            .context("documents query")?;
        Ok(rows.into_iter().map(Document::from).collect())
    }
}
