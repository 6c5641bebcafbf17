//! Leaderboard API client
//!
//! Talks to the versioned API under /api/v0/...

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use leaderboard_server::{RankingEntry, RankingsResponse, SubmitResponse};
use reqwest::{Client, Response};
use serde::Deserialize;

const API_PREFIX: &str = "/api/v0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// A score submission, token included
#[derive(Debug)]
pub struct Submission<'a> {
    pub leaderboard_id: &'a str,
    pub name: &'a str,
    pub score: i64,
    pub hash: String,
    pub offset: i64,
    pub count: u32,
}

pub struct LeaderboardClient {
    client: Client,
    base_url: String,
}

impl LeaderboardClient {
    /// Create a new client pointing to a leaderboard server
    pub fn new(server_url: &str) -> Self {
        // Build HTTP client with timeout, falling back to default client if builder fails
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    fn leaderboard_url(&self, leaderboard_id: &str) -> String {
        format!("{}{}/leaderboards/{}", self.base_url, API_PREFIX, leaderboard_id)
    }

    /// Read `count` rankings starting at rank `start`
    pub async fn get_rankings(
        &self,
        leaderboard_id: &str,
        start: u64,
        count: u32,
    ) -> Result<Vec<RankingEntry>> {
        let resp = self
            .client
            .get(self.leaderboard_url(leaderboard_id))
            .query(&[("start", start.to_string()), ("count", count.to_string())])
            .send()
            .await?;

        let body = read_body(resp, "Failed to fetch rankings").await?;
        if body.is_empty() {
            return Ok(vec![]);
        }
        let data: RankingsResponse = serde_json::from_str(&body)?;
        Ok(data.rankings)
    }

    /// Post a score; `None` when no neighborhood was requested
    pub async fn submit(&self, submission: &Submission<'_>) -> Result<Option<SubmitResponse>> {
        let resp = self
            .client
            .post(self.leaderboard_url(submission.leaderboard_id))
            .query(&[
                ("name", submission.name.to_string()),
                ("score", submission.score.to_string()),
                ("hash", submission.hash.clone()),
                ("offset", submission.offset.to_string()),
                ("count", submission.count.to_string()),
            ])
            .send()
            .await?;

        let body = read_body(resp, "Submission failed").await?;
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Supported API versions
    pub async fn get_versions(&self) -> Result<BTreeMap<String, String>> {
        let resp = self
            .client
            .get(format!("{}/api/versions", self.base_url))
            .send()
            .await?;

        let body = read_body(resp, "Failed to fetch API versions").await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Body text of a successful response, or the server's error message
async fn read_body(resp: Response, context: &str) -> Result<String> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    if status.is_success() {
        return Ok(text);
    }

    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(anyhow!("{} ({}): {}", context, status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = LeaderboardClient::new("http://127.0.0.1:8091");
        assert_eq!(client.base_url, "http://127.0.0.1:8091");
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = LeaderboardClient::new("http://127.0.0.1:8091/");
        assert_eq!(client.base_url, "http://127.0.0.1:8091");
    }

    #[test]
    fn test_leaderboard_url() {
        let client = LeaderboardClient::new("http://127.0.0.1:8091");
        assert_eq!(
            client.leaderboard_url("beat_drift_webtrial_flare"),
            "http://127.0.0.1:8091/api/v0/leaderboards/beat_drift_webtrial_flare"
        );
    }
}
