//! Leaderboard aggregate
//!
//! A [`Leaderboard`] owns the store of one competition and exposes the four
//! operations the API needs: submit a score, look up an entry's rank, read
//! a window of ranks and count entries.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::error::{LeaderboardError, Result};
use crate::store::{ScoreStore, StoreFactory};
use crate::types::{EntryId, Rank, RankingEntry};

pub struct Leaderboard {
    id: String,
    store: Arc<dyn ScoreStore>,
}

impl Leaderboard {
    pub fn new(id: impl Into<String>, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Record a new entry and return its id.
    ///
    /// Every call allocates a fresh id, even for a name already on the board.
    /// If recording fails after allocation the id stays consumed.
    pub async fn add_score(&self, name: &str, score: i64) -> Result<EntryId> {
        let entry_id = self.store.next_entry_id().await.map_err(|e| {
            error!(leaderboard_id = %self.id, "Failed to allocate entry id: {}", e);
            LeaderboardError::StoreUnavailable(e.to_string())
        })?;

        self.store
            .commit_entry(entry_id, name, score)
            .await
            .map_err(|e| {
                error!(
                    leaderboard_id = %self.id,
                    %entry_id,
                    "Failed to record entry: {}",
                    e
                );
                LeaderboardError::WriteFailed(e.to_string())
            })?;

        info!(leaderboard_id = %self.id, %entry_id, score, "Recorded score");
        Ok(entry_id)
    }

    pub async fn get_rank(&self, entry_id: EntryId) -> Result<Rank> {
        self.store
            .rank_of(entry_id)
            .await
            .map_err(|e| self.unavailable(e))?
            .ok_or(LeaderboardError::EntryNotFound(entry_id))
    }

    /// Entries ranked `from_rank..=to_rank` with their names, best first.
    ///
    /// Returns an empty list when `from_rank > to_rank` or the window starts
    /// past the last entry.
    pub async fn get_scores_for_rank_range(
        &self,
        from_rank: Rank,
        to_rank: Rank,
    ) -> Result<Vec<RankingEntry>> {
        if from_rank > to_rank {
            return Ok(Vec::new());
        }

        let window = self
            .store
            .range_by_rank(from_rank, to_rank)
            .await
            .map_err(|e| self.unavailable(e))?;

        let store = &self.store;
        let names = try_join_all(window.iter().map(|(entry_id, _)| async move {
            store
                .name_of(*entry_id)
                .await
                .map_err(|e| self.unavailable(e))?
                .ok_or_else(|| {
                    error!(leaderboard_id = %self.id, %entry_id, "Ranked entry has no name");
                    LeaderboardError::InconsistentState(format!(
                        "entry {} in {} has no name",
                        entry_id, self.id
                    ))
                })
        }))
        .await?;

        let rankings: Vec<RankingEntry> = window
            .into_iter()
            .zip(names)
            .zip(from_rank..)
            .map(|(((_, score), name), rank)| RankingEntry { name, rank, score })
            .collect();

        debug!(
            leaderboard_id = %self.id,
            from_rank,
            to_rank,
            returned = rankings.len(),
            "Read rank range"
        );
        Ok(rankings)
    }

    pub async fn get_score_count(&self) -> Result<u64> {
        self.store.count().await.map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, e: crate::store::StoreError) -> LeaderboardError {
        error!(leaderboard_id = %self.id, "Store read failed: {}", e);
        LeaderboardError::StoreUnavailable(e.to_string())
    }
}

/// The fixed set of leaderboards served by this process
pub struct Leaderboards {
    boards: HashMap<String, Arc<Leaderboard>>,
}

impl Leaderboards {
    /// Open one store per id
    pub async fn open(ids: &[String], factory: &StoreFactory) -> anyhow::Result<Self> {
        let mut boards = HashMap::with_capacity(ids.len());
        for id in ids {
            let store = factory.open(id).await?;
            info!(leaderboard_id = %id, backend = store.backend_name(), "Opened leaderboard");
            boards.insert(id.clone(), Arc::new(Leaderboard::new(id.clone(), store)));
        }
        Ok(Self { boards })
    }

    pub fn get(&self, id: &str) -> Option<Arc<Leaderboard>> {
        self.boards.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }
}
