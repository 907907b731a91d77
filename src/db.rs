// src/db.rs
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{MemoryStore, PgStore, Store, StoreResult};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Opens the configured store. PostgreSQL gets its migrations applied first;
/// without `DATABASE_URL` everything stays in process memory.
pub async fn connect_store(config: &Config) -> StoreResult<Arc<dyn Store>> {
    match &config.database_url {
        Some(database_url) => {
            info!("Connecting to PostgreSQL");
            let pool = create_pool(database_url, config.max_connections).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, polls are kept in memory and lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_without_database_url() {
        let store = connect_store(&Config::default()).await.unwrap();
        store.health_check().await.unwrap();
        assert!(store.list_polls().await.unwrap().is_empty());
    }
}
