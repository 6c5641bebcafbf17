//! In-memory storage backend
//!
//! - **Thread-safe**: one [`parking_lot::RwLock`] guards the score index and
//!   the name registry together, so a committed entry is visible with both
//!   its score and its name or not at all
//! - **Lock-free ids**: the counter lives outside the lock
//!
//! Data is lost when the process exits.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::ranking::{IdAllocator, NameRegistry, RankIndex};
use super::{ScoreStore, StoreError, StoreResult};
use crate::types::{EntryId, Rank};

#[derive(Debug, Default)]
struct State {
    index: RankIndex,
    names: NameRegistry,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: IdAllocator,
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn next_entry_id(&self) -> StoreResult<EntryId> {
        self.ids
            .next()
            .ok_or_else(|| StoreError::unavailable("entry id space exhausted"))
    }

    async fn commit_entry(&self, entry_id: EntryId, name: &str, score: i64) -> StoreResult<()> {
        let mut state = self.state.write();
        state.names.set(entry_id, name);
        state.index.upsert(entry_id, score);
        Ok(())
    }

    async fn rank_of(&self, entry_id: EntryId) -> StoreResult<Option<Rank>> {
        Ok(self.state.read().index.rank_of(entry_id))
    }

    async fn range_by_rank(&self, from: Rank, to: Rank) -> StoreResult<Vec<(EntryId, i64)>> {
        Ok(self.state.read().index.range(from, to))
    }

    async fn name_of(&self, entry_id: EntryId) -> StoreResult<Option<String>> {
        Ok(self.state.read().names.get(entry_id).map(str::to_string))
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.state.read().index.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
