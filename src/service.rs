//! Request handling shared by every transport
//!
//! [`LeaderboardService`] turns raw query parameters into calls on a
//! [`Leaderboard`]: it resolves the leaderboard id, applies defaults and
//! pagination clamps, and verifies submission tokens before anything is
//! written.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::SubmissionAuthenticator;
use crate::config::{Config, PaginationConfig};
use crate::error::{LeaderboardError, Result};
use crate::leaderboard::{Leaderboard, Leaderboards};
use crate::store::StoreFactory;
use crate::types::{Rank, RankingsResponse, SubmitResponse};

/// Query string of a ranking read. Values stay raw so that malformed numbers
/// fall back to defaults instead of failing the request.
#[derive(Debug, Default, Clone)]
pub struct RankingsQuery {
    pub start: Option<String>,
    pub count: Option<String>,
}

impl RankingsQuery {
    /// Build from decoded query pairs; the first occurrence of a key wins
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "start" => &mut query.start,
                "count" => &mut query.count,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Query string of a score submission
#[derive(Debug, Default, Clone)]
pub struct SubmitQuery {
    pub name: Option<String>,
    pub score: Option<String>,
    pub hash: Option<String>,
    pub offset: Option<String>,
    pub count: Option<String>,
}

impl SubmitQuery {
    /// Build from decoded query pairs; the first occurrence of a key wins
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut query.name,
                "score" => &mut query.score,
                "hash" => &mut query.hash,
                "offset" => &mut query.offset,
                "count" => &mut query.count,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

pub struct LeaderboardService {
    leaderboards: Leaderboards,
    auth: SubmissionAuthenticator,
    pagination: PaginationConfig,
}

impl LeaderboardService {
    pub fn new(config: &Config, leaderboards: Leaderboards) -> Self {
        Self {
            leaderboards,
            auth: SubmissionAuthenticator::new(config.auth.secret.clone(), config.auth.digest),
            pagination: config.pagination,
        }
    }

    /// Open every configured leaderboard on the configured backend
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let factory = StoreFactory::from_config(&config.storage).await?;
        let leaderboards = Leaderboards::open(&config.leaderboards.ids, &factory).await?;
        Ok(Self::new(config, leaderboards))
    }

    pub fn leaderboards(&self) -> &Leaderboards {
        &self.leaderboards
    }

    pub fn authenticator(&self) -> &SubmissionAuthenticator {
        &self.auth
    }

    /// Resolve a configured leaderboard, `UnknownLeaderboard` otherwise
    pub fn leaderboard(&self, id: &str) -> Result<Arc<Leaderboard>> {
        self.leaderboards
            .get(id)
            .ok_or_else(|| LeaderboardError::UnknownLeaderboard(id.to_string()))
    }

    /// Read `count` entries starting at rank `start`.
    ///
    /// `Ok(None)` means the request asked for nothing (`count` of 0) and the
    /// leaderboard was not consulted.
    pub async fn get_rankings(
        &self,
        leaderboard_id: &str,
        query: &RankingsQuery,
    ) -> Result<Option<RankingsResponse>> {
        let leaderboard = self.leaderboard(leaderboard_id)?;

        let start = parse_or(query.start.as_deref(), 0).max(0);
        let count = self.clamp_count(parse_or(
            query.count.as_deref(),
            i64::from(self.pagination.default_count),
        ));

        let Some((from_rank, to_rank)) = rank_window(start, count) else {
            return Ok(None);
        };

        debug!(leaderboard_id, from_rank, to_rank, "Reading rankings");
        let rankings = leaderboard
            .get_scores_for_rank_range(from_rank, to_rank)
            .await?;

        Ok(Some(RankingsResponse { rankings }))
    }

    /// Verify and record a submission.
    ///
    /// With a non-zero `count`, also returns the `count` entries starting
    /// `offset` ranks from the new entry, plus the total entry count.
    pub async fn submit_score(
        &self,
        leaderboard_id: &str,
        query: &SubmitQuery,
    ) -> Result<Option<SubmitResponse>> {
        let leaderboard = self.leaderboard(leaderboard_id)?;

        let (Some(name), Some(score), Some(hash)) = (
            query.name.as_deref(),
            query.score.as_deref(),
            query.hash.as_deref(),
        ) else {
            return Err(LeaderboardError::validation(
                "name, score, and/or hash not specified.",
            ));
        };

        let score: i64 = score
            .trim()
            .parse()
            .map_err(|_| LeaderboardError::validation("Invalid score (must be a number)."))?;

        if !self.auth.verify(leaderboard_id, name, score, hash) {
            warn!(leaderboard_id, "Rejected submission with invalid hash");
            return Err(LeaderboardError::Authorization);
        }

        let offset = parse_or(query.offset.as_deref(), 0);
        let count = self.clamp_count(parse_or(query.count.as_deref(), 0));

        let entry_id = leaderboard.add_score(name, score).await?;

        if count == 0 {
            return Ok(None);
        }

        let rank = leaderboard
            .get_rank(entry_id)
            .await
            .map_err(|e| match e {
                LeaderboardError::EntryNotFound(id) => LeaderboardError::InconsistentState(
                    format!("entry {} missing right after it was recorded", id),
                ),
                other => other,
            })?;

        let from = i64::try_from(rank).unwrap_or(i64::MAX).saturating_add(offset);
        let rankings = match rank_window(from, count) {
            Some((from_rank, to_rank)) => {
                leaderboard
                    .get_scores_for_rank_range(from_rank, to_rank)
                    .await?
            }
            None => Vec::new(),
        };

        let total_count = leaderboard.get_score_count().await?;

        Ok(Some(SubmitResponse {
            rankings,
            total_count: Some(total_count),
        }))
    }

    fn clamp_count(&self, count: i64) -> u64 {
        count.clamp(0, i64::from(self.pagination.max_count)) as u64
    }
}

/// Parse an integer parameter, using `default` when absent or malformed.
/// A present but blank value reads as 0.
fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    match raw.map(str::trim) {
        None => default,
        Some("") => 0,
        Some(s) => s.parse().unwrap_or(default),
    }
}

/// Inclusive window of `count` ranks beginning at `from`.
///
/// A negative `from` is raised to 0 while the end stays put; `None` when the
/// window is empty.
fn rank_window(from: i64, count: u64) -> Option<(Rank, Rank)> {
    if count == 0 {
        return None;
    }
    let span = i64::try_from(count - 1).unwrap_or(i64::MAX);
    let to = from.saturating_add(span);
    if to < 0 {
        return None;
    }
    Some((from.max(0) as Rank, to as Rank))
}
