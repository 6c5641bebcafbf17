//! Token command - print the hash a client must send with a submission

use anyhow::Result;
use leaderboard_server::SubmissionAuthenticator;

pub fn run(
    auth: &SubmissionAuthenticator,
    leaderboard_id: &str,
    name: &str,
    score: i64,
) -> Result<()> {
    println!("{}", auth.compute_token(leaderboard_id, name, score));
    Ok(())
}
