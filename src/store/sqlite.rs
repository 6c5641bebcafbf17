//! SQLite storage backend
//!
//! Each leaderboard owns its own connection, so writes to one leaderboard
//! never wait on another's lock (file-level contention is handled by WAL and
//! the busy timeout). Score and name are written in one transaction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{ScoreStore, StoreError, StoreResult};
use crate::types::{EntryId, Rank};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
    leaderboard_id: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, leaderboard_id: &str) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::with_connection(conn, leaderboard_id)
    }

    pub fn in_memory(leaderboard_id: &str) -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, leaderboard_id)
    }

    fn with_connection(conn: Connection, leaderboard_id: &str) -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            leaderboard_id: leaderboard_id.to_string(),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> StoreResult<()> {
        let conn = self.conn.lock();

        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
                [],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )?;

        if !applied {
            conn.execute_batch(include_str!("../../migrations/sqlite/001_schema.sql"))?;
            info!("Applied sqlite migration 001_schema");
        }

        Ok(())
    }
}

fn to_sql_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn next_entry_id(&self) -> StoreResult<EntryId> {
        let conn = self.conn.lock();
        let next: i64 = conn.query_row(
            "INSERT INTO counters (leaderboard_id, next_id) VALUES (?1, 1)
             ON CONFLICT (leaderboard_id) DO UPDATE SET next_id = next_id + 1
             RETURNING next_id",
            params![self.leaderboard_id],
            |row| row.get(0),
        )?;
        u64::try_from(next)
            .map(EntryId)
            .map_err(|_| StoreError::unavailable(format!("corrupt counter value {}", next)))
    }

    async fn commit_entry(&self, entry_id: EntryId, name: &str, score: i64) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO scores (leaderboard_id, entry_id, score) VALUES (?1, ?2, ?3)",
            params![self.leaderboard_id, to_sql_i64(entry_id.get()), score],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO names (leaderboard_id, entry_id, name, submitted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.leaderboard_id,
                to_sql_i64(entry_id.get()),
                name,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;
        debug!(leaderboard_id = %self.leaderboard_id, %entry_id, "Committed entry");
        Ok(())
    }

    async fn rank_of(&self, entry_id: EntryId) -> StoreResult<Option<Rank>> {
        let conn = self.conn.lock();
        let id = to_sql_i64(entry_id.get());

        let score: Option<i64> = conn
            .query_row(
                "SELECT score FROM scores WHERE leaderboard_id = ?1 AND entry_id = ?2",
                params![self.leaderboard_id, id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(score) = score else {
            return Ok(None);
        };

        let ahead: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scores
             WHERE leaderboard_id = ?1 AND (score > ?2 OR (score = ?2 AND entry_id < ?3))",
            params![self.leaderboard_id, score, id],
            |row| row.get(0),
        )?;

        Ok(Some(ahead.max(0) as Rank))
    }

    async fn range_by_rank(&self, from: Rank, to: Rank) -> StoreResult<Vec<(EntryId, i64)>> {
        if from > to {
            return Ok(Vec::new());
        }
        let limit = to_sql_i64((to - from).saturating_add(1));
        let offset = to_sql_i64(from);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT entry_id, score FROM scores WHERE leaderboard_id = ?1
             ORDER BY score DESC, entry_id ASC LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt
            .query_map(params![self.leaderboard_id, limit, offset], |row| {
                Ok((EntryId(row.get::<_, i64>(0)? as u64), row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    async fn name_of(&self, entry_id: EntryId) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        let name = conn
            .query_row(
                "SELECT name FROM names WHERE leaderboard_id = ?1 AND entry_id = ?2",
                params![self.leaderboard_id, to_sql_i64(entry_id.get())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    async fn count(&self) -> StoreResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scores WHERE leaderboard_id = ?1",
            params![self.leaderboard_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn submit(store: &SqliteStore, name: &str, score: i64) -> EntryId {
        let id = store.next_entry_id().await.unwrap();
        store.commit_entry(id, name, score).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let store = SqliteStore::in_memory("board").unwrap();
        assert_eq!(store.next_entry_id().await.unwrap(), EntryId(1));
        assert_eq!(store.next_entry_id().await.unwrap(), EntryId(2));
    }

    #[tokio::test]
    async fn test_rank_and_range() {
        let store = SqliteStore::in_memory("board").unwrap();
        let a = submit(&store, "Mr. A", 5).await;
        let b = submit(&store, "Mr. B", 20).await;
        let c = submit(&store, "Mr. C", 15).await;

        assert_eq!(store.rank_of(b).await.unwrap(), Some(0));
        assert_eq!(store.rank_of(c).await.unwrap(), Some(1));
        assert_eq!(store.rank_of(a).await.unwrap(), Some(2));
        assert_eq!(store.rank_of(EntryId(42)).await.unwrap(), None);

        assert_eq!(store.range_by_rank(0, 1).await.unwrap(), vec![(b, 20), (c, 15)]);
        assert_eq!(store.range_by_rank(2, 50).await.unwrap(), vec![(a, 5)]);
        assert!(store.range_by_rank(3, 50).await.unwrap().is_empty());
        assert!(store.range_by_rank(1, 0).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ties_break_by_numeric_id() {
        let store = SqliteStore::in_memory("board").unwrap();
        for i in 0..12 {
            submit(&store, &format!("p{}", i), 7).await;
        }
        let ids: Vec<u64> = store
            .range_by_rank(8, 11)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.get())
            .collect();
        assert_eq!(ids, vec![9, 10, 11, 12]);
        assert_eq!(store.rank_of(EntryId(10)).await.unwrap(), Some(9));
    }

    #[tokio::test]
    async fn test_names_are_write_once() {
        let store = SqliteStore::in_memory("board").unwrap();
        let id = submit(&store, "Ellen", 5).await;
        store.commit_entry(id, "Mallory", 5).await.unwrap();

        assert_eq!(store.name_of(id).await.unwrap().as_deref(), Some("Ellen"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "leaderboard-sqlite-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        {
            let store = SqliteStore::open(&path, "board").unwrap();
            submit(&store, "Ray", 12).await;
            let other = SqliteStore::open(&path, "other").unwrap();
            submit(&other, "Ellen", 3).await;
        }

        let store = SqliteStore::open(&path, "board").unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.name_of(EntryId(1)).await.unwrap().as_deref(), Some("Ray"));
        // Counter continues where it left off
        assert_eq!(store.next_entry_id().await.unwrap(), EntryId(2));

        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
