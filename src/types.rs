use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one submitted entry within a leaderboard.
///
/// Allocated from 1 upward and never reused. Among entries with equal
/// scores, the lower id ranks better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based position in descending score order
pub type Rank = u64;

/// One row of a ranking response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub rank: Rank,
    pub score: i64,
}

/// Body of a successful read
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingsResponse {
    pub rankings: Vec<RankingEntry>,
}

/// Body of a successful submission that asked for its neighborhood
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub rankings: Vec<RankingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}
