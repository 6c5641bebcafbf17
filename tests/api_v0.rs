//! End-to-end tests for the v0 HTTP API, driven through the router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use leaderboard_server::server::{create_router, AppState};
use leaderboard_server::{compute_token, Config, LeaderboardService, TokenDigest};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "naQIL5vyl8c5gem4xPTz";
const LEADERBOARD_ID: &str = "test_leaderboard_0";

async fn app() -> Router {
    let mut config = Config::default();
    config.auth.secret = SECRET.to_string();
    config.auth.digest = TokenDigest::Md5;
    config.leaderboards.ids = vec![LEADERBOARD_ID.to_string()];
    config.validate().unwrap();

    let service = Arc::new(LeaderboardService::from_config(&config).await.unwrap());
    create_router(Arc::new(AppState::new(service)))
}

fn get_uri(leaderboard_id: &str, start: Option<i64>, count: Option<i64>) -> String {
    let mut params = Vec::new();
    if let Some(start) = start {
        params.push(format!("start={}", start));
    }
    if let Some(count) = count {
        params.push(format!("count={}", count));
    }
    let mut uri = format!("/api/v0/leaderboards/{}", leaderboard_id);
    if !params.is_empty() {
        uri.push('?');
        uri.push_str(&params.join("&"));
    }
    uri
}

fn post_uri(
    leaderboard_id: &str,
    name: &str,
    score: i64,
    offset: Option<i64>,
    count: Option<i64>,
) -> String {
    let hash = compute_token(SECRET, TokenDigest::Md5, leaderboard_id, name, score);
    let mut uri = format!(
        "/api/v0/leaderboards/{}?name={}&score={}&hash={}",
        leaderboard_id,
        urlencoding::encode(name),
        score,
        hash
    );
    if let Some(offset) = offset {
        uri.push_str(&format!("&offset={}", offset));
    }
    if let Some(count) = count {
        uri.push_str(&format!("&count={}", count));
    }
    uri
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Method::POST, uri).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Method::GET, uri).await
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

async fn seed_twenty(app: &Router) {
    for i in 0..20 {
        let name = format!("Mr. {}", i);
        let (status, body) = post(app, &post_uri(LEADERBOARD_ID, &name, 20 - i, None, None)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn queries_top_scores() {
    let app = app().await;
    seed_twenty(&app).await;

    let (status, body) = get(&app, &get_uri(LEADERBOARD_ID, None, None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let rankings = json(&body)["rankings"].as_array().unwrap().clone();
    assert_eq!(rankings.len(), 10);
    for (i, entry) in rankings.iter().enumerate() {
        assert_eq!(entry["name"], format!("Mr. {}", i));
        assert_eq!(entry["rank"], i as u64);
        assert_eq!(entry["score"], 20 - i as i64);
    }
}

#[tokio::test]
async fn queries_top_x_scores() {
    let app = app().await;
    seed_twenty(&app).await;

    let (status, body) = get(&app, &get_uri(LEADERBOARD_ID, Some(0), Some(3))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let rankings = json(&body)["rankings"].as_array().unwrap().clone();
    assert_eq!(rankings.len(), 3);
    for (i, entry) in rankings.iter().enumerate() {
        assert_eq!(entry["name"], format!("Mr. {}", i));
        assert_eq!(entry["rank"], i as u64);
        assert_eq!(entry["score"], 20 - i as i64);
    }
}

#[tokio::test]
async fn count_is_clamped_to_max() {
    let app = app().await;
    seed_twenty(&app).await;
    post(&app, &post_uri(LEADERBOARD_ID, "Mr. 20", 0, None, None)).await;

    let (_, body) = get(&app, &get_uri(LEADERBOARD_ID, Some(0), Some(50))).await;
    assert_eq!(json(&body)["rankings"].as_array().unwrap().len(), 20);

    let (status, body) = get(&app, &get_uri(LEADERBOARD_ID, Some(18), Some(10))).await;
    assert_eq!(status, StatusCode::OK);
    let rankings = json(&body)["rankings"].as_array().unwrap().clone();
    assert_eq!(rankings.len(), 3);
    assert_eq!(rankings[2]["name"], "Mr. 20");
}

#[tokio::test]
async fn zero_count_read_is_empty_success() {
    let app = app().await;
    let (status, body) = get(&app, &get_uri(LEADERBOARD_ID, None, Some(0))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn start_past_end_is_empty_list() {
    let app = app().await;
    post(&app, &post_uri(LEADERBOARD_ID, "Ray", 12, None, None)).await;

    let (status, body) = get(&app, &get_uri(LEADERBOARD_ID, Some(5), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["rankings"], Value::Array(vec![]));
}

#[tokio::test]
async fn posts_a_new_score() {
    let app = app().await;
    let (status, body) = post(&app, &post_uri(LEADERBOARD_ID, "Ray", 12, None, None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body.is_empty());
}

#[tokio::test]
async fn posts_and_gets_the_posted_score() {
    let app = app().await;
    let uri = post_uri(LEADERBOARD_ID, "Ellen", 5, Some(0), Some(1));
    let (status, body) = post(&app, &uri).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let body = json(&body);
    let rankings = body["rankings"].as_array().unwrap();
    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0]["name"], "Ellen");
    assert_eq!(rankings[0]["score"], 5);
    assert_eq!(rankings[0]["rank"], 0);
    assert_eq!(body["totalCount"], 1);
}

#[tokio::test]
async fn posts_and_gets_nearby_scores() {
    let app = app().await;
    post(&app, &post_uri(LEADERBOARD_ID, "Mr. A", 5, None, None)).await;
    post(&app, &post_uri(LEADERBOARD_ID, "Mr. B", 20, None, None)).await;
    let uri = post_uri(LEADERBOARD_ID, "Mr. C", 15, Some(-1), Some(2));
    let (status, body) = post(&app, &uri).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // 0) Mr. B  1) Mr. C  2) Mr. A
    let body = json(&body);
    let rankings = body["rankings"].as_array().unwrap();
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0]["name"], "Mr. B");
    assert_eq!(rankings[0]["score"], 20);
    assert_eq!(rankings[0]["rank"], 0);
    assert_eq!(rankings[1]["name"], "Mr. C");
    assert_eq!(rankings[1]["score"], 15);
    assert_eq!(rankings[1]["rank"], 1);
    assert_eq!(body["totalCount"], 3);
}

#[tokio::test]
async fn rejects_a_forged_hash_without_writing() {
    let app = app().await;
    let forged =
        post_uri(LEADERBOARD_ID, "Mallory", 1, None, None).replace("score=1&", "score=999&");

    let (status, body) = post(&app, &forged).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["message"], "Invalid hash.");

    let (_, body) = get(&app, &get_uri(LEADERBOARD_ID, None, None)).await;
    assert_eq!(json(&body)["rankings"], Value::Array(vec![]));
}

#[tokio::test]
async fn rejects_missing_fields() {
    let app = app().await;
    let (status, body) = post(
        &app,
        &format!("/api/v0/leaderboards/{}?name=Ray&score=12", LEADERBOARD_ID),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "name, score, and/or hash not specified.");
}

#[tokio::test]
async fn rejects_non_numeric_score() {
    let app = app().await;
    let (status, body) = post(
        &app,
        &format!(
            "/api/v0/leaderboards/{}?name=Ray&score=lots&hash=abc",
            LEADERBOARD_ID
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "Invalid score (must be a number).");
}

#[tokio::test]
async fn unknown_leaderboard_is_not_found() {
    let app = app().await;

    let (status, body) = get(&app, &get_uri("no_such_board", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Invalid leaderboard id.");

    let (status, _) = post(&app, &post_uri("no_such_board", "Ray", 12, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lists_api_versions() {
    let app = app().await;
    let (status, body) = get(&app, "/api/versions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["v0"], "/api/v0");
}

#[tokio::test]
async fn reports_health() {
    let app = app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["leaderboards"], 1);
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn repeated_parameters_use_the_first_value() {
    let app = app().await;
    let hash = compute_token(SECRET, TokenDigest::Md5, LEADERBOARD_ID, "a", 1);
    let uri = format!(
        "/api/v0/leaderboards/{}?name=a&name=z&score=1&hash={}&count=1",
        LEADERBOARD_ID, hash
    );

    let (status, body) = post(&app, &uri).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(json(&body)["rankings"][0]["name"], "a");
}

#[tokio::test]
async fn repeated_parameters_on_unknown_leaderboard_are_not_found() {
    let app = app().await;
    let (status, body) = post(
        &app,
        "/api/v0/leaderboards/nope?name=a&name=z&score=1&hash=x",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Invalid leaderboard id.");
}

#[tokio::test]
async fn blank_count_reads_nothing() {
    let app = app().await;
    post(&app, &post_uri(LEADERBOARD_ID, "Ray", 12, None, None)).await;

    let uri = format!("/api/v0/leaderboards/{}?count=", LEADERBOARD_ID);
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn names_round_trip_through_percent_encoding() {
    let app = app().await;
    let name = "Zoë & Ray?";
    let (status, body) = post(&app, &post_uri(LEADERBOARD_ID, name, 7, Some(0), Some(1))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(json(&body)["rankings"][0]["name"], name);
}
