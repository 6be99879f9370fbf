// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for subscribers and work entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::WorkpulseError;
use crate::types::{Platform, Subscriber, WorkEntry};

/// Persistent store with an active-subscriber index and a per-owner entry index.
///
/// Every subscriber write keeps the active index consistent: a subscriber is
/// indexed iff its `enabled` set is non-empty. Read-merge-write operations are
/// atomic; operations on an absent subscriber are no-ops unless noted.
#[async_trait]
pub trait SubscriberStore: Send + Sync + 'static {
    async fn get_subscriber(&self, id: &str) -> Result<Option<Subscriber>, WorkpulseError>;

    /// Write the subscriber and its index entry in one transaction. Idempotent.
    async fn upsert_subscriber(&self, subscriber: &Subscriber) -> Result<(), WorkpulseError>;

    async fn set_platform_chat_id(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<(), WorkpulseError>;

    /// Remove `platform` from the enabled set, dropping the index entry if it empties.
    async fn disable_platform(&self, id: &str, platform: Platform) -> Result<(), WorkpulseError>;

    /// Create the subscriber if needed, record the destination and enable the
    /// platform. Returns the stored subscriber.
    async fn enable_platform(
        &self,
        id: &str,
        platform: Platform,
        chat_id: &str,
    ) -> Result<Subscriber, WorkpulseError>;

    /// Subscribers with at least one enabled platform, read via the index.
    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, WorkpulseError>;

    /// Write the entry and its per-owner index entry in one transaction.
    async fn store_work_entry(&self, entry: &WorkEntry) -> Result<(), WorkpulseError>;

    /// All entries for an owner, oldest first.
    async fn list_entries_by_owner(&self, owner_id: &str)
    -> Result<Vec<WorkEntry>, WorkpulseError>;

    /// The newest entry for an owner, if any.
    async fn latest_entry_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<WorkEntry>, WorkpulseError>;

    async fn update_last_sent(
        &self,
        id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), WorkpulseError>;
}
