// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary SQLite store with seeding helpers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use workpulse_config::StorageConfig;
use workpulse_core::{Platform, Subscriber, SubscriberStore, WorkEntry, WorkpulseError};
use workpulse_storage::SqliteStore;

/// A migrated store in a temp directory, removed on drop.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub async fn new() -> Result<Self, WorkpulseError> {
        let temp_dir = tempfile::TempDir::new().map_err(WorkpulseError::storage)?;
        let config = StorageConfig {
            database_path: temp_dir
                .path()
                .join("workpulse-test.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        })
    }

    /// The store behind the trait object the services take.
    pub fn store(&self) -> Arc<dyn SubscriberStore> {
        self.store.clone()
    }

    /// Subscribe `id` on `platform` with `chat_id` as destination.
    pub async fn subscribe(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<Subscriber, WorkpulseError> {
        self.store.enable_platform(id, platform, chat_id).await
    }

    /// Store a work entry for `owner_id` created at `created_at`.
    pub async fn add_entry_at(
        &self,
        owner_id: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<WorkEntry, WorkpulseError> {
        let entry = WorkEntry {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            content: content.to_string(),
            created_at,
        };
        self.store.store_work_entry(&entry).await?;
        Ok(entry)
    }

    pub async fn add_entry(&self, owner_id: &str, content: &str) -> Result<WorkEntry, WorkpulseError> {
        self.add_entry_at(owner_id, content, Utc::now()).await
    }
}
