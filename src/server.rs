//! Leaderboard HTTP server
//!
//! Routes:
//! - `GET  /api/versions` - supported API versions and their prefixes
//! - `GET  /api/v0/leaderboards/:leaderboard_id` - read rankings
//! - `POST /api/v0/leaderboards/:leaderboard_id` - submit a score
//! - `GET  /health`

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::LeaderboardError;
use crate::service::{LeaderboardService, RankingsQuery, SubmitQuery};

/// Supported API versions and the prefix each is mounted under
pub const API_VERSIONS: &[(&str, &str)] = &[("v0", "/api/v0")];

pub struct AppState {
    pub service: Arc<LeaderboardService>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(service: Arc<LeaderboardService>) -> Self {
        Self {
            service,
            started_at: std::time::Instant::now(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let v0 = Router::new().route(
        "/leaderboards/:leaderboard_id",
        get(get_rankings_handler).post(post_ranking_handler),
    );

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/versions", get(versions_handler))
        .nest("/api/v0", v0)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for LeaderboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            LeaderboardError::UnknownLeaderboard(_) | LeaderboardError::EntryNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LeaderboardError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaderboardError::Authorization => StatusCode::FORBIDDEN,
            LeaderboardError::StoreUnavailable(_)
            | LeaderboardError::WriteFailed(_)
            | LeaderboardError::InconsistentState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if !self.is_client_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let leaderboards = state.service.leaderboards();
    let backend = leaderboards
        .ids()
        .next()
        .and_then(|id| leaderboards.get(id))
        .map(|lb| lb.backend_name())
        .unwrap_or("none");

    Json(json!({
        "healthy": !leaderboards.is_empty(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "leaderboards": leaderboards.len(),
        "backend": backend,
    }))
}

async fn versions_handler() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(API_VERSIONS.iter().copied().collect())
}

type QueryPairs = Vec<(String, String)>;

/// Decoded query pairs. A query string that cannot be decoded is a
/// validation error, reported only once the leaderboard id is known good.
fn query_pairs(
    service: &LeaderboardService,
    leaderboard_id: &str,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<QueryPairs, LeaderboardError> {
    match query {
        Ok(Query(pairs)) => Ok(pairs),
        Err(rejection) => {
            service.leaderboard(leaderboard_id)?;
            Err(LeaderboardError::validation(rejection.body_text()))
        }
    }
}

async fn get_rankings_handler(
    State(state): State<Arc<AppState>>,
    Path(leaderboard_id): Path<String>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Response, LeaderboardError> {
    let query = RankingsQuery::from_pairs(query_pairs(&state.service, &leaderboard_id, query)?);
    match state.service.get_rankings(&leaderboard_id, &query).await? {
        Some(body) => Ok(Json(body).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}

async fn post_ranking_handler(
    State(state): State<Arc<AppState>>,
    Path(leaderboard_id): Path<String>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Response, LeaderboardError> {
    let query = SubmitQuery::from_pairs(query_pairs(&state.service, &leaderboard_id, query)?);
    match state.service.submit_score(&leaderboard_id, &query).await? {
        Some(body) => Ok(Json(body).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}

/// Validate `config`, open every leaderboard and serve until Ctrl-C
pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let service = Arc::new(LeaderboardService::from_config(&config).await?);
    info!(
        "Serving {} leaderboards ({:?} storage, {:?} hashes)",
        service.leaderboards().len(),
        config.storage.backend,
        config.auth.digest
    );

    run_server(&config.server.host, config.server.port, service).await
}

/// Run the server until Ctrl-C
pub async fn run_server(
    host: &str,
    port: u16,
    service: Arc<LeaderboardService>,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(service));

    let app = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting leaderboard server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Leaderboard server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down leaderboard server...");
}
