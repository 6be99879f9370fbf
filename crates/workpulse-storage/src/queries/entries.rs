// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work entry persistence and the per-owner entry index.

use rusqlite::{OptionalExtension, Row, params};
use workpulse_core::{WorkEntry, WorkpulseError};

use super::{format_ts, parse_ts};
use crate::database::{Database, map_tr_err};

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<WorkEntry> {
    let created_at: String = row.get(3)?;
    Ok(WorkEntry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_ts(&created_at, 3)?,
    })
}

/// Insert the entry and its per-owner index row in one transaction.
pub async fn store_work_entry(db: &Database, entry: &WorkEntry) -> Result<(), WorkpulseError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            let created_at = format_ts(&entry.created_at);
            tx.execute(
                "INSERT INTO work_entries (id, owner_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry.id, entry.owner_id, entry.content, created_at],
            )?;
            tx.execute(
                "INSERT INTO owner_entries (owner_id, entry_id, created_at, seq)
                 VALUES (?1, ?2, ?3,
                     (SELECT COALESCE(MAX(seq), 0) + 1 FROM owner_entries WHERE owner_id = ?1))",
                params![entry.owner_id, entry.id, created_at],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// All entries for `owner_id`, oldest first. Ties keep insertion order.
pub async fn list_entries_by_owner(
    db: &Database,
    owner_id: &str,
) -> Result<Vec<WorkEntry>, WorkpulseError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<WorkEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT w.id, w.owner_id, w.content, w.created_at
                 FROM owner_entries o
                 JOIN work_entries w ON w.id = o.entry_id
                 WHERE o.owner_id = ?1
                 ORDER BY o.created_at ASC, o.seq ASC",
            )?;
            let rows = stmt.query_map(params![owner_id], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent entry for `owner_id`.
pub async fn latest_entry_for_owner(
    db: &Database,
    owner_id: &str,
) -> Result<Option<WorkEntry>, WorkpulseError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<WorkEntry>, rusqlite::Error> {
            conn.query_row(
                "SELECT w.id, w.owner_id, w.content, w.created_at
                 FROM owner_entries o
                 JOIN work_entries w ON w.id = o.entry_id
                 WHERE o.owner_id = ?1
                 ORDER BY o.created_at DESC, o.seq DESC
                 LIMIT 1",
                params![owner_id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn entry(id: &str, owner: &str, at: DateTime<Utc>) -> WorkEntry {
        WorkEntry {
            id: id.to_string(),
            owner_id: owner.to_string(),
            content: format!("update {id}"),
            created_at: at,
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn entries_are_listed_oldest_first() {
        let (db, _dir) = setup_db().await;
        store_work_entry(&db, &entry("b", "U1", at(5))).await.unwrap();
        store_work_entry(&db, &entry("a", "U1", at(1))).await.unwrap();
        store_work_entry(&db, &entry("c", "U1", at(9))).await.unwrap();

        let ids: Vec<_> = list_entries_by_owner(&db, "U1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_insertion_order() {
        let (db, _dir) = setup_db().await;
        for id in ["first", "second", "third"] {
            store_work_entry(&db, &entry(id, "U1", at(0))).await.unwrap();
        }
        let ids: Vec<_> = list_entries_by_owner(&db, "U1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["first", "second", "third"]);

        let latest = latest_entry_for_owner(&db, "U1").await.unwrap().unwrap();
        assert_eq!(latest.id, "third");
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let (db, _dir) = setup_db().await;
        store_work_entry(&db, &entry("a", "U1", at(1))).await.unwrap();
        store_work_entry(&db, &entry("b", "U2", at(2))).await.unwrap();

        assert_eq!(list_entries_by_owner(&db, "U1").await.unwrap().len(), 1);
        assert_eq!(
            latest_entry_for_owner(&db, "U2").await.unwrap().unwrap().id,
            "b"
        );
        assert!(latest_entry_for_owner(&db, "U3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_fails_without_partial_write() {
        let (db, _dir) = setup_db().await;
        store_work_entry(&db, &entry("a", "U1", at(1))).await.unwrap();
        let err = store_work_entry(&db, &entry("a", "U2", at(2))).await;
        assert!(matches!(err, Err(WorkpulseError::Storage { .. })));
        assert!(list_entries_by_owner(&db, "U2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stored_entry_round_trips() {
        let (db, _dir) = setup_db().await;
        let e = entry("a", "U1", at(7));
        store_work_entry(&db, &e).await.unwrap();
        assert_eq!(latest_entry_for_owner(&db, "U1").await.unwrap(), Some(e));
    }
}
