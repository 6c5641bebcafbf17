//! Submit command - post a score and show where it landed

use crate::client::{LeaderboardClient, Submission};
use crate::style::*;
use anyhow::Result;
use leaderboard_server::SubmissionAuthenticator;

pub async fn run(
    url: &str,
    auth: &SubmissionAuthenticator,
    leaderboard_id: &str,
    name: &str,
    score: i64,
    offset: i64,
    count: u32,
) -> Result<()> {
    let client = LeaderboardClient::new(url);

    let submission = Submission {
        leaderboard_id,
        name,
        score,
        hash: auth.compute_token(leaderboard_id, name, score),
        offset,
        count,
    };

    let response = client.submit(&submission).await?;
    print_success(&format!("Submitted {} for {}", score, name));

    let Some(response) = response else {
        return Ok(());
    };

    // Equal entries rank by age, so the newest match is this submission
    if let Some(mine) = response
        .rankings
        .iter()
        .rev()
        .find(|e| e.name == name && e.score == score)
    {
        let total = response
            .total_count
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "Your most recent rank: {} out of {}",
            style_bold(&format!("#{}", mine.rank + 1)),
            total
        );
    }

    if !response.rankings.is_empty() {
        println!();
        crate::commands::top::print_table(&response.rankings);
        println!();
    }

    Ok(())
}
