//! Leaderboard CLI
//!
//! Command-line client for the Leaderboard Server.

mod client;
mod commands;
mod style;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leaderboard_server::{Config, SubmissionAuthenticator};
use style::*;

#[derive(Parser)]
#[command(name = "leaderboard")]
#[command(version)]
#[command(about = "Leaderboard Server - query rankings and submit scores", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Leaderboard server URL
    #[arg(
        short,
        long,
        env = "LEADERBOARD_URL",
        default_value = "http://127.0.0.1:8091",
        global = true
    )]
    url: String,

    /// Config file holding the shared secret and digest
    #[arg(short, long, env = "LEADERBOARD_CONFIG", default_value = "config.toml", global = true)]
    config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a window of the rankings
    #[command(visible_alias = "t")]
    Top {
        /// Leaderboard id
        leaderboard_id: String,

        /// First rank to show (zero-based)
        #[arg(short, long, default_value = "0")]
        start: u64,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: u32,
    },

    /// Submit a score
    #[command(visible_alias = "s")]
    Submit {
        /// Leaderboard id
        leaderboard_id: String,

        /// Entrant name
        name: String,

        /// Score
        #[arg(allow_hyphen_values = true)]
        score: i64,

        /// Ranks before (negative) or after your entry to start the echoed window
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,

        /// Number of neighboring entries to echo back (0 for none)
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Print the hash a client must send with a submission
    Token {
        /// Leaderboard id
        leaderboard_id: String,

        /// Entrant name
        name: String,

        /// Score
        #[arg(allow_hyphen_values = true)]
        score: i64,
    },

    /// List API versions supported by the server
    #[command(visible_alias = "v")]
    Versions,

    /// Run the leaderboard server
    Server {
        /// Host to bind
        #[arg(long, env = "LEADERBOARD_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "LEADERBOARD_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let result = match cli.command {
        Commands::Top {
            leaderboard_id,
            start,
            count,
        } => commands::top::run(&cli.url, &leaderboard_id, start, count).await,
        Commands::Submit {
            leaderboard_id,
            name,
            score,
            offset,
            count,
        } => match authenticator(&cli.config) {
            Ok(auth) => {
                commands::submit::run(&cli.url, &auth, &leaderboard_id, &name, score, offset, count)
                    .await
            }
            Err(e) => Err(e),
        },
        Commands::Token {
            leaderboard_id,
            name,
            score,
        } => authenticator(&cli.config)
            .and_then(|auth| commands::token::run(&auth, &leaderboard_id, &name, score)),
        Commands::Versions => commands::versions::run(&cli.url).await,
        Commands::Server { host, port } => match Config::load_from(&cli.config) {
            Ok(config) => commands::server::run(config, host, port).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Token calculator from the config file (LEADERBOARD_SECRET overrides)
fn authenticator(config_path: &str) -> Result<SubmissionAuthenticator> {
    let config = Config::load_from(config_path).context("Failed to load config")?;
    if config.auth.secret.is_empty() {
        bail!("No shared secret configured (set auth.secret or LEADERBOARD_SECRET)");
    }
    Ok(SubmissionAuthenticator::new(
        config.auth.secret,
        config.auth.digest,
    ))
}
