use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::GeneralConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::post::{Post, PostWithAuthor};
pub use repositories::user::User;

/// Failure of a persistence operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(DbErr),

    /// Unique or foreign-key constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("migration failed: {0}")]
    Migration(DbErr),
}

impl From<DbErr> for StorageError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(
                SqlErr::UniqueConstraintViolation(msg)
                | SqlErr::ForeignKeyConstraintViolation(msg),
            ) => Self::Constraint(msg),
            _ => Self::Unavailable(err),
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    /// Open the pool sized by the `[general]` config section.
    pub async fn from_config(general: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &general.database_url,
            general.max_db_connections,
            general.min_db_connections,
        )
        .await
    }

    /// Open the pool. Does not touch the schema; see [`Store::migrate`].
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .with_context(|| format!("Failed to connect to database: {db_url}"))?;

        info!(
            "Database connected (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Apply pending migrations. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        use sea_orm_migration::MigratorTrait;

        migrator::Migrator::up(&self.conn, None)
            .await
            .map_err(StorageError::Migration)?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<(), StorageError> {
        self.conn.close().await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    pub async fn list_posts_with_authors(&self) -> Result<Vec<PostWithAuthor>, StorageError> {
        self.post_repo().list_with_authors().await
    }

    pub async fn create_post(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        created_at: NaiveDate,
    ) -> Result<Post, StorageError> {
        self.post_repo()
            .create(user_id, title, content, created_at)
            .await
    }

    pub async fn count_posts(&self) -> Result<u64, StorageError> {
        self.post_repo().count().await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.user_repo().find_by_username(username).await
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn create_user(&self, username: &str, email: &str) -> Result<User, StorageError> {
        self.user_repo().create(username, email).await
    }

    pub async fn count_users(&self) -> Result<u64, StorageError> {
        self.user_repo().count().await
    }
}

/// Fresh, migrated store backed by a throwaway file.
#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("postboard-unit-{}.db", uuid::Uuid::new_v4()));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");
    store.migrate().await.expect("failed to migrate test database");
    store
}
