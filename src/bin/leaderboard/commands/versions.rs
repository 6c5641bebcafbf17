//! Versions command - list API versions the server supports

use crate::style::*;
use anyhow::Result;

pub async fn run(url: &str) -> Result<()> {
    print_header("API Versions");

    let client = crate::client::LeaderboardClient::new(url);
    let versions = client.get_versions().await?;

    println!();
    for (version, prefix) in &versions {
        println!("  {:<6} {}", style_cyan(version), style_dim(prefix));
    }

    Ok(())
}
