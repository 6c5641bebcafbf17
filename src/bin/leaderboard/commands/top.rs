//! Top command - print a window of the rankings

use crate::style::*;
use anyhow::Result;
use leaderboard_server::RankingEntry;

pub async fn run(url: &str, leaderboard_id: &str, start: u64, count: u32) -> Result<()> {
    print_header(&format!("Leaderboard: {}", leaderboard_id));

    let client = crate::client::LeaderboardClient::new(url);
    let entries = client.get_rankings(leaderboard_id, start, count).await?;

    if entries.is_empty() {
        print_info("No scores in this range yet.");
        return Ok(());
    }

    println!();
    print_table(&entries);
    println!();

    Ok(())
}

/// Ranks are shown one-based
pub fn print_table(entries: &[RankingEntry]) {
    println!("{:>5}  {:<19}  {:>12}", "Rank", "Name", "Score");
    println!("{}", "─".repeat(40));

    for entry in entries {
        let rank = format!("#{}", entry.rank + 1);
        let rank_styled = if entry.rank == 0 {
            style_yellow(&rank)
        } else if entry.rank < 3 {
            style_cyan(&rank)
        } else {
            rank
        };

        println!(
            "{:>5}  {:<19}  {:>12}",
            rank_styled,
            trim_name(&entry.name),
            entry.score
        );
    }
}
