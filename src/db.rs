//! Repository construction for the configured storage backend.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::error::RepositoryError;
use crate::repository::{InMemoryRepository, PgRepository, SharedRepository};

/// Connect (and migrate) the backend named in `config`.
pub async fn connect(config: &AppConfig) -> Result<SharedRepository, RepositoryError> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory repository");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await?;
            info!("Connected to application database");

            let repository = PgRepository::new(pool);
            repository.migrate().await?;
            info!("Application migrations complete");

            Ok(Arc::new(repository))
        }
    }
}
