//! Server command - run the leaderboard server in this process

use anyhow::Result;
use leaderboard_server::Config;
use tracing_subscriber::EnvFilter;

pub async fn run(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    // A no-op if --verbose already installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    leaderboard_server::server::serve(config).await
}
