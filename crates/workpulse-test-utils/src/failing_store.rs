// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SubscriberStore`] doubles that fail on demand.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use workpulse_core::{Platform, Subscriber, SubscriberStore, WorkEntry, WorkpulseError};

#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

fn unavailable<T>() -> Result<T, WorkpulseError> {
    Err(WorkpulseError::storage(std::io::Error::other(
        "store unavailable",
    )))
}

#[async_trait]
impl SubscriberStore for FailingStore {
    async fn get_subscriber(&self, _id: &str) -> Result<Option<Subscriber>, WorkpulseError> {
        unavailable()
    }

    async fn upsert_subscriber(&self, _subscriber: &Subscriber) -> Result<(), WorkpulseError> {
        unavailable()
    }

    async fn set_platform_chat_id(
        &self,
        _id: &str,
        _platform: Platform,
        _chat_id: &str,
    ) -> Result<(), WorkpulseError> {
        unavailable()
    }

    async fn disable_platform(&self, _id: &str, _platform: Platform) -> Result<(), WorkpulseError> {
        unavailable()
    }

    async fn enable_platform(
        &self,
        _id: &str,
        _platform: Platform,
        _chat_id: &str,
    ) -> Result<Subscriber, WorkpulseError> {
        unavailable()
    }

    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, WorkpulseError> {
        unavailable()
    }

    async fn store_work_entry(&self, _entry: &WorkEntry) -> Result<(), WorkpulseError> {
        unavailable()
    }

    async fn list_entries_by_owner(
        &self,
        _owner_id: &str,
    ) -> Result<Vec<WorkEntry>, WorkpulseError> {
        unavailable()
    }

    async fn latest_entry_for_owner(
        &self,
        _owner_id: &str,
    ) -> Result<Option<WorkEntry>, WorkpulseError> {
        unavailable()
    }

    async fn update_last_sent(
        &self,
        _id: &str,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), WorkpulseError> {
        unavailable()
    }
}

/// Delegates to a real store but fails `update_last_sent` for one subscriber.
pub struct StampFailingStore {
    inner: Arc<dyn SubscriberStore>,
    fail_for: String,
}

impl StampFailingStore {
    pub fn new(inner: Arc<dyn SubscriberStore>, fail_for: impl Into<String>) -> Self {
        Self {
            inner,
            fail_for: fail_for.into(),
        }
    }
}

#[async_trait]
impl SubscriberStore for StampFailingStore {
    async fn get_subscriber(&self, id: &str) -> Result<Option<Subscriber>, WorkpulseError> {
        self.inner.get_subscriber(id).await
    }

    async fn upsert_subscriber(&self, subscriber: &Subscriber) -> Result<(), WorkpulseError> {
        self.inner.upsert_subscriber(subscriber).await
    }

    async fn set_platform_chat_id(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<(), WorkpulseError> {
        self.inner.set_platform_chat_id(id, platform, chat_id).await
    }

    async fn disable_platform(&self, id: &str, platform: Platform) -> Result<(), WorkpulseError> {
        self.inner.disable_platform(id, platform).await
    }

    async fn enable_platform(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<Subscriber, WorkpulseError> {
        self.inner.enable_platform(id, platform, chat_id).await
    }

    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, WorkpulseError> {
        self.inner.list_active_subscribers().await
    }

    async fn store_work_entry(&self, entry: &WorkEntry) -> Result<(), WorkpulseError> {
        self.inner.store_work_entry(entry).await
    }

    async fn list_entries_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<WorkEntry>, WorkpulseError> {
        self.inner.list_entries_by_owner(owner_id).await
    }

    async fn latest_entry_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<WorkEntry>, WorkpulseError> {
        self.inner.latest_entry_for_owner(owner_id).await
    }

    async fn update_last_sent(
        &self,
        id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WorkpulseError> {
        if id == self.fail_for {
            return unavailable();
        }
        self.inner.update_last_sent(id, timestamp).await
    }
}
