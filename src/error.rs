//! Error taxonomy shared by the leaderboard core and the HTTP layer

use thiserror::Error;

use crate::types::EntryId;

pub type Result<T> = std::result::Result<T, LeaderboardError>;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Invalid leaderboard id.")]
    UnknownLeaderboard(String),

    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// Submission token did not match
    #[error("Invalid hash.")]
    Authorization,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Score or name could not be recorded after an id was allocated
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A ranked entry has no name, left behind by an earlier partial write
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),
}

impl LeaderboardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Errors the caller caused; everything else is a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownLeaderboard(_)
                | Self::EntryNotFound(_)
                | Self::Validation(_)
                | Self::Authorization
        )
    }
}
