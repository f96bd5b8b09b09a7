// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`OpportunityStore`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use leadhound_config::model::StorageConfig;
use leadhound_core::{
    AdapterType, HealthStatus, LeadhoundError, Opportunity, OpportunityStore, PluginAdapter,
    StoredOpportunity,
};

use crate::database::Database;
use crate::models::{KeywordStats, ServerStats};
use crate::queries;

/// SQLite-backed opportunity store.
///
/// The database is opened lazily by [`SqliteStore::initialize`]; every other
/// call fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, LeadhoundError> {
        self.db
            .get()
            .ok_or_else(|| LeadhoundError::storage("storage not initialized -- call initialize() first"))
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), LeadhoundError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| LeadhoundError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL so the database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), LeadhoundError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    pub async fn set_manual_status(
        &self,
        permalink: &str,
        status: &str,
    ) -> Result<bool, LeadhoundError> {
        queries::opportunities::set_manual_status(self.db()?, permalink, status).await
    }

    pub async fn get_by_permalink(
        &self,
        permalink: &str,
    ) -> Result<Option<StoredOpportunity>, LeadhoundError> {
        queries::opportunities::get_by_permalink(self.db()?, permalink).await
    }

    pub async fn server_stats(&self) -> Result<Vec<ServerStats>, LeadhoundError> {
        queries::stats::server_stats(self.db()?).await
    }

    pub async fn keyword_stats(&self) -> Result<Vec<KeywordStats>, LeadhoundError> {
        queries::stats::keyword_stats(self.db()?).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl OpportunityStore for SqliteStore {
    async fn latest_seen_timestamp(
        &self,
        channel_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LeadhoundError> {
        queries::opportunities::latest_timestamp_for_channel(self.db()?, channel_id).await
    }

    async fn existing_permalinks(
        &self,
        permalinks: &HashSet<String>,
    ) -> Result<HashSet<String>, LeadhoundError> {
        queries::opportunities::existing_permalinks(self.db()?, permalinks).await
    }

    async fn save(&self, opportunity: &Opportunity) -> Result<Option<i64>, LeadhoundError> {
        queries::opportunities::insert_opportunity(self.db()?, opportunity).await
    }

    async fn save_batch(&self, opportunities: &[Opportunity]) -> Result<usize, LeadhoundError> {
        queries::opportunities::insert_opportunities(self.db()?, opportunities).await
    }

    async fn list_opportunities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<StoredOpportunity>, LeadhoundError> {
        queries::opportunities::list_opportunities(self.db()?, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn reports_identity() {
        let store = SqliteStore::new(make_config("unused.db"));
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let store = SqliteStore::new(make_config("unused.db"));
        assert!(store.list_opportunities(None).await.is_err());
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.checkpoint().await.unwrap();
    }
}
