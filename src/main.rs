//! Leaderboard Server
//!
//! Serves the configured leaderboards over HTTP

use leaderboard_server::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Leaderboard Server");

    let config_path =
        std::env::var("LEADERBOARD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if std::path::Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
    } else {
        info!("{} not found, using embedded defaults", config_path);
    }
    let config = Config::load_from(&config_path)?;

    leaderboard_server::server::serve(config).await
}
