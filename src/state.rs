use crate::config::{AppConfig, StoreBackend};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL not set")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                let store = PgDocumentStore::new(db);
                if let Err(e) = store.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(store) as Arc<dyn DocumentStore>
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory document store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_store(Arc::new(MemoryStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with_store(store: Arc<dyn DocumentStore>) -> Self {
        let config = Arc::new(AppConfig {
            store_backend: StoreBackend::Memory,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            seed_on_start: false,
        });
        Self::from_parts(store, config)
    }
}
