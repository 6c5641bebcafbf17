//! Ranked score storage
//!
//! A [`ScoreStore`] is the backing state of one leaderboard: an identity
//! counter, a score set ordered by (score descending, entry id ascending) and
//! a name registry. Backends must make [`ScoreStore::commit_entry`] atomic:
//! no reader may see an entry's score without its name.
//!
//! | Backend | Type | Notes |
//! |---------|------|-------|
//! | memory | [`MemoryStore`] | default, lost on restart |
//! | sqlite | [`SqliteStore`] | one connection per leaderboard |
//! | postgres | [`PgStore`] | shared pool, one counter row per leaderboard |

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{EntryId, Rank};

mod memory;
mod pg;
mod ranking;
mod sqlite;

pub use memory::MemoryStore;
pub use pg::{PgPool, PgStore};
pub use sqlite::SqliteStore;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend-level failures. The leaderboard maps these onto its own taxonomy
/// depending on which step failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn query(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::query(e.to_string(), e)
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.is_closed() {
            Self::Unavailable {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        } else {
            Self::query(e.to_string(), e)
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        Self::Unavailable {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

/// Storage for a single leaderboard.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Next identity; strictly increasing, never handed out twice
    async fn next_entry_id(&self) -> StoreResult<EntryId>;

    /// Record score and name for `entry_id` as one atomic unit
    async fn commit_entry(&self, entry_id: EntryId, name: &str, score: i64) -> StoreResult<()>;

    /// Descending rank of `entry_id`, `None` if it was never committed
    async fn rank_of(&self, entry_id: EntryId) -> StoreResult<Option<Rank>>;

    /// Entries ranked `from..=to`, best first. Truncated at the last entry.
    async fn range_by_rank(&self, from: Rank, to: Rank) -> StoreResult<Vec<(EntryId, i64)>>;

    async fn name_of(&self, entry_id: EntryId) -> StoreResult<Option<String>>;

    async fn count(&self) -> StoreResult<u64>;

    fn backend_name(&self) -> &'static str;
}

/// Opens one store per leaderboard for the configured backend
pub enum StoreFactory {
    Memory,
    Sqlite { path: Option<String> },
    Postgres(PgPool),
}

impl StoreFactory {
    pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        Ok(match config.backend {
            StorageBackend::Memory => Self::Memory,
            StorageBackend::Sqlite => Self::Sqlite {
                path: config.path.clone(),
            },
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL not set"))?;
                Self::Postgres(PgPool::connect(url).await?)
            }
        })
    }

    pub async fn open(&self, leaderboard_id: &str) -> anyhow::Result<Arc<dyn ScoreStore>> {
        Ok(match self {
            Self::Memory => Arc::new(MemoryStore::new()),
            Self::Sqlite { path: Some(path) } => Arc::new(SqliteStore::open(path, leaderboard_id)?),
            Self::Sqlite { path: None } => Arc::new(SqliteStore::in_memory(leaderboard_id)?),
            Self::Postgres(pool) => Arc::new(PgStore::open(pool.clone(), leaderboard_id).await?),
        })
    }
}
