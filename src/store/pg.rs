//! PostgreSQL storage backend
//!
//! All leaderboards share one connection pool. Each leaderboard has its own
//! counter row, so id allocation on one leaderboard never contends with
//! another. Score and name are written in one transaction.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use super::{ScoreStore, StoreError, StoreResult};
use crate::types::{EntryId, Rank};

/// Database pool configuration
const DB_POOL_MAX_SIZE: usize = 20;
const DB_QUERY_TIMEOUT_SECS: u64 = 30;

/// Connection pool shared by every leaderboard's [`PgStore`]
#[derive(Clone)]
pub struct PgPool {
    pool: Pool,
}

/// Pool settings. `statement_timeout` travels in the startup options so
/// every pooled connection carries it, not just the first one.
fn pool_config(database_url: &str) -> Config {
    let mut config = Config::new();
    config.url = Some(database_url.to_string());
    config.options = Some(format!("-c statement_timeout={}s", DB_QUERY_TIMEOUT_SECS));

    config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    config.pool = Some(PoolConfig {
        max_size: DB_POOL_MAX_SIZE,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(DB_QUERY_TIMEOUT_SECS)),
            create: Some(Duration::from_secs(10)),
            recycle: Some(Duration::from_secs(30)),
        },
        ..Default::default()
    });

    config
}

impl PgPool {
    /// Connect to DATABASE_URL and apply migrations
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = pool_config(database_url).create_pool(Some(Runtime::Tokio1), NoTls)?;

        // Test connection
        let client = pool.get().await?;
        let timeout: String = client.query_one("SHOW statement_timeout", &[]).await?.get(0);

        info!(
            "Connected to PostgreSQL (pool_size: {}, statement_timeout: {})",
            DB_POOL_MAX_SIZE, timeout
        );
        drop(client);

        let pg = Self { pool };
        pg.run_migrations().await?;
        Ok(pg)
    }

    async fn run_migrations(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;

        let exists: bool = client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name = 'schema_migrations')",
                &[],
            )
            .await?
            .get(0);

        if !exists {
            client
                .batch_execute(include_str!("../../migrations/postgres/001_schema.sql"))
                .await?;
            info!("Applied migration 001_schema");
        }

        Ok(())
    }
}

pub struct PgStore {
    pool: Pool,
    leaderboard_id: String,
}

impl PgStore {
    pub async fn open(pool: PgPool, leaderboard_id: &str) -> StoreResult<Self> {
        let client = pool.pool.get().await?;
        client
            .execute(
                "INSERT INTO counters (leaderboard_id, next_id) VALUES ($1, 0)
                 ON CONFLICT (leaderboard_id) DO NOTHING",
                &[&leaderboard_id],
            )
            .await?;

        Ok(Self {
            pool: pool.pool,
            leaderboard_id: leaderboard_id.to_string(),
        })
    }
}

fn to_sql_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ScoreStore for PgStore {
    async fn next_entry_id(&self) -> StoreResult<EntryId> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "UPDATE counters SET next_id = next_id + 1 WHERE leaderboard_id = $1 RETURNING next_id",
                &[&self.leaderboard_id],
            )
            .await?
            .ok_or_else(|| {
                StoreError::unavailable(format!("no counter for {}", self.leaderboard_id))
            })?;

        let next: i64 = row.get(0);
        u64::try_from(next)
            .map(EntryId)
            .map_err(|_| StoreError::unavailable(format!("corrupt counter value {}", next)))
    }

    async fn commit_entry(&self, entry_id: EntryId, name: &str, score: i64) -> StoreResult<()> {
        let mut client = self.pool.get().await?;
        let id = to_sql_i64(entry_id.get());

        let tx = client.transaction().await?;
        tx.execute(
            "INSERT INTO scores (leaderboard_id, entry_id, score) VALUES ($1, $2, $3)
             ON CONFLICT (leaderboard_id, entry_id) DO UPDATE SET score = EXCLUDED.score",
            &[&self.leaderboard_id, &id, &score],
        )
        .await?;
        tx.execute(
            "INSERT INTO names (leaderboard_id, entry_id, name) VALUES ($1, $2, $3)
             ON CONFLICT (leaderboard_id, entry_id) DO NOTHING",
            &[&self.leaderboard_id, &id, &name],
        )
        .await?;
        tx.commit().await?;

        debug!(leaderboard_id = %self.leaderboard_id, %entry_id, "Committed entry");
        Ok(())
    }

    async fn rank_of(&self, entry_id: EntryId) -> StoreResult<Option<Rank>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT (
                    SELECT COUNT(*) FROM scores o
                    WHERE o.leaderboard_id = s.leaderboard_id
                      AND (o.score > s.score OR (o.score = s.score AND o.entry_id < s.entry_id))
                 )
                 FROM scores s WHERE s.leaderboard_id = $1 AND s.entry_id = $2",
                &[&self.leaderboard_id, &to_sql_i64(entry_id.get())],
            )
            .await?;

        Ok(row.map(|r| r.get::<_, i64>(0).max(0) as Rank))
    }

    async fn range_by_rank(&self, from: Rank, to: Rank) -> StoreResult<Vec<(EntryId, i64)>> {
        if from > to {
            return Ok(Vec::new());
        }
        let limit = to_sql_i64((to - from).saturating_add(1));
        let offset = to_sql_i64(from);

        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT entry_id, score FROM scores WHERE leaderboard_id = $1
                 ORDER BY score DESC, entry_id ASC LIMIT $2 OFFSET $3",
                &[&self.leaderboard_id, &limit, &offset],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| (EntryId(r.get::<_, i64>(0) as u64), r.get(1)))
            .collect())
    }

    async fn name_of(&self, entry_id: EntryId) -> StoreResult<Option<String>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT name FROM names WHERE leaderboard_id = $1 AND entry_id = $2",
                &[&self.leaderboard_id, &to_sql_i64(entry_id.get())],
            )
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn count(&self) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let count: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM scores WHERE leaderboard_id = $1",
                &[&self.leaderboard_id],
            )
            .await?
            .get(0);
        Ok(count.max(0) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
