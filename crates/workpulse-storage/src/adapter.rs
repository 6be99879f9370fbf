// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`SubscriberStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use workpulse_config::StorageConfig;
use workpulse_core::{HealthStatus, Platform, Subscriber, SubscriberStore, WorkEntry, WorkpulseError};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed record store. Delegates to the typed query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config` and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, WorkpulseError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn health_check(&self) -> Result<HealthStatus, WorkpulseError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), WorkpulseError> {
        self.db.close().await
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn get_subscriber(&self, id: &str) -> Result<Option<Subscriber>, WorkpulseError> {
        queries::subscribers::get_subscriber(&self.db, id).await
    }

    async fn upsert_subscriber(&self, subscriber: &Subscriber) -> Result<(), WorkpulseError> {
        queries::subscribers::upsert_subscriber(&self.db, subscriber).await
    }

    async fn set_platform_chat_id(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<(), WorkpulseError> {
        queries::subscribers::set_platform_chat_id(&self.db, id, platform, chat_id).await
    }

    async fn disable_platform(&self, id: &str, platform: Platform) -> Result<(), WorkpulseError> {
        queries::subscribers::disable_platform(&self.db, id, platform).await
    }

    async fn enable_platform(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<Subscriber, WorkpulseError> {
        queries::subscribers::enable_platform(&self.db, id, platform, chat_id, Utc::now()).await
    }

    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, WorkpulseError> {
        queries::subscribers::list_active_subscribers(&self.db).await
    }

    async fn store_work_entry(&self, entry: &WorkEntry) -> Result<(), WorkpulseError> {
        queries::entries::store_work_entry(&self.db, entry).await
    }

    async fn list_entries_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<WorkEntry>, WorkpulseError> {
        queries::entries::list_entries_by_owner(&self.db, owner_id).await
    }

    async fn latest_entry_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<WorkEntry>, WorkpulseError> {
        queries::entries::latest_entry_for_owner(&self.db, owner_id).await
    }

    async fn update_last_sent(
        &self,
        id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WorkpulseError> {
        queries::subscribers::update_last_sent(&self.db, id, timestamp).await
    }
}
