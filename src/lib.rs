//! Leaderboard Server - ranked score submissions for game clients
//!
//! Each configured leaderboard accepts score submissions for named entrants,
//! assigns every submission a fresh, increasing entry id and ranks entries
//! by score.
//!
//! # How it works
//!
//! 1. A client computes a hash of (leaderboard id, name, score) with the
//!    shared secret and POSTs it along with the score
//! 2. The server checks the hash, then allocates an entry id and records
//!    score and name in one atomic step
//! 3. Clients read ranking windows ("top N from rank R"), or ask for the
//!    neighborhood of their own submission in the POST response
//!
//! # Ranking rules
//!
//! - Higher score ranks first; ranks are zero-based
//! - Equal scores rank by entry id, so the earlier submission wins
//! - Resubmitting under the same name creates a second entry

pub mod auth;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use auth::{compute_token, SubmissionAuthenticator, TokenDigest};
pub use config::Config;
pub use error::LeaderboardError;
pub use leaderboard::{Leaderboard, Leaderboards};
pub use service::{LeaderboardService, RankingsQuery, SubmitQuery};
pub use store::{MemoryStore, PgStore, ScoreStore, SqliteStore, StoreError, StoreFactory};
pub use types::{EntryId, Rank, RankingEntry, RankingsResponse, SubmitResponse};
