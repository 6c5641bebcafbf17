//! In-process building blocks for a leaderboard: identity counter, ordered
//! score index and name registry.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{EntryId, Rank};

/// Hands out strictly increasing entry ids, starting at the configured base.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::with_base(1)
    }

    pub fn with_base(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base.max(1)),
        }
    }

    /// `None` once the id space is exhausted
    pub fn next(&self) -> Option<EntryId> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .ok()
            .map(EntryId)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores ordered best-first: score descending, then entry id ascending.
///
/// `rank_of` and `range` walk the ordered set up to the requested rank, so
/// both cost O(rank) under the caller's lock. Boards far larger than a few
/// hundred thousand entries want an order-statistic tree here instead.
#[derive(Debug, Default)]
pub struct RankIndex {
    ordered: BTreeSet<(Reverse<i64>, EntryId)>,
    scores: HashMap<EntryId, i64>,
}

impl RankIndex {
    /// Insert or move `entry_id` to `score`
    pub fn upsert(&mut self, entry_id: EntryId, score: i64) {
        if let Some(old) = self.scores.insert(entry_id, score) {
            if old == score {
                return;
            }
            self.ordered.remove(&(Reverse(old), entry_id));
        }
        self.ordered.insert((Reverse(score), entry_id));
    }

    pub fn score_of(&self, entry_id: EntryId) -> Option<i64> {
        self.scores.get(&entry_id).copied()
    }

    /// Number of entries ranked strictly ahead of `entry_id`
    pub fn rank_of(&self, entry_id: EntryId) -> Option<Rank> {
        let score = self.score_of(entry_id)?;
        Some(self.ordered.range(..(Reverse(score), entry_id)).count() as Rank)
    }

    /// Entries ranked `from..=to`; empty when `from > to` or past the end
    pub fn range(&self, from: Rank, to: Rank) -> Vec<(EntryId, i64)> {
        if from > to {
            return Vec::new();
        }
        let skip = usize::try_from(from).unwrap_or(usize::MAX);
        let take = usize::try_from((to - from).saturating_add(1)).unwrap_or(usize::MAX);
        self.ordered
            .iter()
            .skip(skip)
            .take(take)
            .map(|(Reverse(score), id)| (*id, *score))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }
}

/// Write-once display names
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: HashMap<EntryId, String>,
}

impl NameRegistry {
    /// Returns false, leaving the stored name untouched, if `entry_id` already has one
    pub fn set(&mut self, entry_id: EntryId, name: &str) -> bool {
        if self.names.contains_key(&entry_id) {
            return false;
        }
        self.names.insert(entry_id, name.to_string());
        true
    }

    pub fn get(&self, entry_id: EntryId) -> Option<&str> {
        self.names.get(&entry_id).map(String::as_str)
    }
}
