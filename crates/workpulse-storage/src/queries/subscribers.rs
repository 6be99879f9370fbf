// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber persistence and the active-subscriber index.
//!
//! [`write_subscriber`] is the only code that touches the `subscribers` and
//! `active_subscribers` tables. Every public write funnels through it inside a
//! transaction, so the index always mirrors `enabled` being non-empty.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use workpulse_core::{Platform, Subscriber, WorkpulseError};

use super::{format_ts, parse_ts};
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "s.id, s.platforms, s.enabled, s.subscribed_at, s.last_sent_at, s.timezone";

fn json_err(column: usize, e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn row_to_subscriber(row: &Row<'_>) -> rusqlite::Result<Subscriber> {
    let platforms: String = row.get(1)?;
    let enabled: String = row.get(2)?;
    let subscribed_at: String = row.get(3)?;
    let last_sent_at: Option<String> = row.get(4)?;

    Ok(Subscriber {
        id: row.get(0)?,
        platforms: serde_json::from_str::<BTreeMap<Platform, String>>(&platforms)
            .map_err(|e| json_err(1, e))?,
        enabled: serde_json::from_str::<BTreeSet<Platform>>(&enabled)
            .map_err(|e| json_err(2, e))?,
        subscribed_at: parse_ts(&subscribed_at, 3)?,
        last_sent_at: last_sent_at.as_deref().map(|ts| parse_ts(ts, 4)).transpose()?,
        timezone: row.get(5)?,
    })
}

fn read_subscriber(conn: &Connection, id: &str) -> rusqlite::Result<Option<Subscriber>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM subscribers s WHERE s.id = ?1"),
        params![id],
        row_to_subscriber,
    )
    .optional()
}

/// Write the primary row and reconcile its index entry.
///
/// Callers must run this inside a transaction they commit.
fn write_subscriber(conn: &Connection, subscriber: &Subscriber) -> rusqlite::Result<()> {
    let platforms = serde_json::to_string(&subscriber.platforms)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let enabled = serde_json::to_string(&subscriber.enabled)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO subscribers (id, platforms, enabled, subscribed_at, last_sent_at, timezone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             platforms = excluded.platforms,
             enabled = excluded.enabled,
             subscribed_at = excluded.subscribed_at,
             last_sent_at = excluded.last_sent_at,
             timezone = excluded.timezone",
        params![
            subscriber.id,
            platforms,
            enabled,
            format_ts(&subscriber.subscribed_at),
            subscriber.last_sent_at.as_ref().map(format_ts),
            subscriber.timezone,
        ],
    )?;

    if subscriber.is_active() {
        conn.execute(
            "INSERT OR IGNORE INTO active_subscribers (subscriber_id) VALUES (?1)",
            params![subscriber.id],
        )?;
    } else {
        conn.execute(
            "DELETE FROM active_subscribers WHERE subscriber_id = ?1",
            params![subscriber.id],
        )?;
    }
    Ok(())
}

/// Read, mutate and write back one subscriber in a single transaction.
/// Returns `None` without writing if the subscriber does not exist.
async fn modify<F>(db: &Database, id: &str, mutate: F) -> Result<Option<Subscriber>, WorkpulseError>
where
    F: FnOnce(&mut Subscriber) + Send + 'static,
{
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Subscriber>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(mut subscriber) = read_subscriber(&tx, &id)? else {
                return Ok(None);
            };
            mutate(&mut subscriber);
            write_subscriber(&tx, &subscriber)?;
            tx.commit()?;
            Ok(Some(subscriber))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_subscriber(db: &Database, id: &str) -> Result<Option<Subscriber>, WorkpulseError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| read_subscriber(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Write the subscriber and its index entry atomically.
pub async fn upsert_subscriber(db: &Database, subscriber: &Subscriber) -> Result<(), WorkpulseError> {
    let subscriber = subscriber.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            write_subscriber(&tx, &subscriber)?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_platform_chat_id(
    db: &Database,
    id: &str,
    platform: Platform,
    chat_id: &str,
) -> Result<(), WorkpulseError> {
    let chat_id = chat_id.to_string();
    modify(db, id, move |s| {
        s.platforms.insert(platform, chat_id);
    })
    .await
    .map(|_| ())
}

pub async fn disable_platform(
    db: &Database,
    id: &str,
    platform: Platform,
) -> Result<(), WorkpulseError> {
    modify(db, id, move |s| {
        s.disable(platform);
    })
    .await
    .map(|_| ())
}

/// Create-or-merge: record the destination and enable the platform.
pub async fn enable_platform(
    db: &Database,
    id: &str,
    platform: Platform,
    chat_id: &str,
    now: DateTime<Utc>,
) -> Result<Subscriber, WorkpulseError> {
    let id = id.to_string();
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Subscriber, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut subscriber =
                read_subscriber(&tx, &id)?.unwrap_or_else(|| Subscriber::new(id.clone(), now));
            subscriber.enable(platform, chat_id);
            write_subscriber(&tx, &subscriber)?;
            tx.commit()?;
            Ok(subscriber)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_last_sent(
    db: &Database,
    id: &str,
    timestamp: DateTime<Utc>,
) -> Result<(), WorkpulseError> {
    modify(db, id, move |s| {
        s.last_sent_at = Some(timestamp);
    })
    .await
    .map(|_| ())
}

/// Subscribers reachable through the active index, oldest subscription first.
pub async fn list_active_subscribers(db: &Database) -> Result<Vec<Subscriber>, WorkpulseError> {
    db.connection()
        .call(|conn| -> Result<Vec<Subscriber>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM active_subscribers a
                 JOIN subscribers s ON s.id = a.subscriber_id
                 ORDER BY s.subscribed_at ASC, s.id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_subscriber)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    fn subscriber(id: &str, enabled: &[(Platform, &str)]) -> Subscriber {
        let mut s = Subscriber::new(id, ts(8));
        for (platform, chat) in enabled {
            s.enable(*platform, *chat);
        }
        s
    }

    async fn active_ids(db: &Database) -> Vec<String> {
        list_active_subscribers(db)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let (db, _dir) = setup_db().await;
        let mut s = subscriber("U1", &[(Platform::Slack, "C1"), (Platform::Telegram, "42")]);
        s.last_sent_at = Some(ts(17));
        s.timezone = Some("Europe/Berlin".into());

        upsert_subscriber(&db, &s).await.unwrap();
        assert_eq!(get_subscriber(&db, "U1").await.unwrap(), Some(s));
        assert_eq!(get_subscriber(&db, "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn index_tracks_enabled_set_on_every_upsert() {
        let (db, _dir) = setup_db().await;
        let mut s = subscriber("U1", &[(Platform::Slack, "C1")]);
        upsert_subscriber(&db, &s).await.unwrap();
        assert_eq!(active_ids(&db).await, vec!["U1"]);

        s.disable(Platform::Slack);
        upsert_subscriber(&db, &s).await.unwrap();
        assert!(active_ids(&db).await.is_empty());
        assert!(get_subscriber(&db, "U1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let s = subscriber("U1", &[(Platform::Telegram, "42")]);
        upsert_subscriber(&db, &s).await.unwrap();
        upsert_subscriber(&db, &s).await.unwrap();

        assert_eq!(active_ids(&db).await, vec!["U1"]);
        assert_eq!(get_subscriber(&db, "U1").await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn disabling_sole_platform_leaves_index_and_reenable_restores() {
        let (db, _dir) = setup_db().await;
        upsert_subscriber(&db, &subscriber("U1", &[(Platform::Telegram, "42")]))
            .await
            .unwrap();

        disable_platform(&db, "U1", Platform::Telegram).await.unwrap();
        assert!(active_ids(&db).await.is_empty());

        let s = enable_platform(&db, "U1", Platform::Telegram, "42", ts(9))
            .await
            .unwrap();
        assert_eq!(s.subscribed_at, ts(8), "existing subscriber keeps its subscription date");
        assert_eq!(active_ids(&db).await, vec!["U1"]);
    }

    #[tokio::test]
    async fn disabling_one_of_two_platforms_keeps_subscriber_active() {
        let (db, _dir) = setup_db().await;
        upsert_subscriber(
            &db,
            &subscriber("U1", &[(Platform::Slack, "C1"), (Platform::Telegram, "42")]),
        )
        .await
        .unwrap();

        disable_platform(&db, "U1", Platform::Telegram).await.unwrap();
        let stored = get_subscriber(&db, "U1").await.unwrap().unwrap();
        assert!(stored.is_enabled(Platform::Slack));
        assert!(!stored.is_enabled(Platform::Telegram));
        assert_eq!(stored.destination(Platform::Telegram), Some("42"));
        assert_eq!(active_ids(&db).await, vec!["U1"]);
    }

    #[tokio::test]
    async fn enable_platform_creates_missing_subscriber() {
        let (db, _dir) = setup_db().await;
        let s = enable_platform(&db, "U9", Platform::Slack, "D9", ts(10))
            .await
            .unwrap();
        assert_eq!(s.subscribed_at, ts(10));
        assert_eq!(s.destination(Platform::Slack), Some("D9"));
        assert_eq!(get_subscriber(&db, "U9").await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn operations_on_absent_subscriber_are_noops() {
        let (db, _dir) = setup_db().await;
        set_platform_chat_id(&db, "ghost", Platform::Slack, "C1")
            .await
            .unwrap();
        disable_platform(&db, "ghost", Platform::Slack).await.unwrap();
        update_last_sent(&db, "ghost", ts(17)).await.unwrap();
        assert_eq!(get_subscriber(&db, "ghost").await.unwrap(), None);
        assert!(active_ids(&db).await.is_empty());
    }

    #[tokio::test]
    async fn set_chat_id_does_not_enable() {
        let (db, _dir) = setup_db().await;
        upsert_subscriber(&db, &subscriber("U1", &[(Platform::Slack, "C1")]))
            .await
            .unwrap();
        set_platform_chat_id(&db, "U1", Platform::Telegram, "77")
            .await
            .unwrap();

        let stored = get_subscriber(&db, "U1").await.unwrap().unwrap();
        assert_eq!(stored.destination(Platform::Telegram), Some("77"));
        assert!(!stored.is_enabled(Platform::Telegram));
    }

    #[tokio::test]
    async fn update_last_sent_preserves_other_fields() {
        let (db, _dir) = setup_db().await;
        let s = subscriber("U1", &[(Platform::Slack, "C1")]);
        upsert_subscriber(&db, &s).await.unwrap();
        update_last_sent(&db, "U1", ts(17)).await.unwrap();

        let stored = get_subscriber(&db, "U1").await.unwrap().unwrap();
        assert_eq!(stored.last_sent_at, Some(ts(17)));
        assert_eq!(stored.enabled, s.enabled);
        assert_eq!(stored.platforms, s.platforms);
    }

    #[tokio::test]
    async fn concurrent_merges_do_not_lose_updates() {
        let (db, _dir) = setup_db().await;
        upsert_subscriber(
            &db,
            &subscriber("U1", &[(Platform::Slack, "C1"), (Platform::Telegram, "42")]),
        )
        .await
        .unwrap();

        let (a, b) = futures::join!(
            disable_platform(&db, "U1", Platform::Slack),
            update_last_sent(&db, "U1", ts(17)),
        );
        a.unwrap();
        b.unwrap();

        let stored = get_subscriber(&db, "U1").await.unwrap().unwrap();
        assert!(!stored.is_enabled(Platform::Slack));
        assert_eq!(stored.last_sent_at, Some(ts(17)));
    }
}
