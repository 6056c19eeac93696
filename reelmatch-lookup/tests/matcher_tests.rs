//! Matcher against a mock review service and an on-disk catalog

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use reelmatch_common::config::{LookupConfig, MatchMode};
use reelmatch_common::db::{init_database_pool, insert_title, StoredTitleRecord};
use reelmatch_lookup::{LookupError, Matcher, ReviewClient, TokenBucket, YearQuery};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct MockState {
    status: StatusCode,
    body: String,
    queries: Mutex<Vec<String>>,
}

async fn search(State(state): State<Arc<MockState>>, RawQuery(query): RawQuery) -> (StatusCode, String) {
    state.queries.lock().unwrap().push(query.unwrap_or_default());
    (state.status, state.body.clone())
}

/// Serve `body` with `status` for every search; returns the search URL
async fn spawn_mock(status: StatusCode, body: String) -> (String, Arc<MockState>) {
    let state = Arc::new(MockState {
        status,
        body,
        queries: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/api/movies.json", get(search))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/movies.json", addr), state)
}

fn die_hard_body() -> String {
    json!({
        "total": 2,
        "movies": [
            {
                "id": "11",
                "title": "DIE HARD",
                "release_dates": {"theater": "1988-07-20"},
                "critics_consensus": "Its many imitators have never equaled it.",
                "ratings": {
                    "critics_rating": "Certified Fresh",
                    "critics_score": 93,
                    "audience_rating": "Upright",
                    "audience_score": 94
                },
                "links": {"alternate": "http://reviews.test/m/die_hard"}
            },
            {
                "id": "12",
                "title": "Die Hard 2",
                "release_dates": {"theater": "1990-07-04"}
            }
        ]
    })
    .to_string()
}

async fn catalog(dir: &TempDir) -> SqlitePool {
    init_database_pool(&dir.path().join("catalog.db"), 2)
        .await
        .unwrap()
}

fn matcher(search_url: String, pool: SqlitePool, mode: MatchMode) -> Matcher<ReviewClient> {
    let config = LookupConfig {
        search_url,
        mode,
        ..LookupConfig::default()
    };
    let client = ReviewClient::new(&config, Some("secret".to_string())).unwrap();
    let limiter = Arc::new(TokenBucket::new(config.rate_per_second, config.burst));
    Matcher::new(client, limiter, pool, config.mode)
}

#[tokio::test]
async fn test_exact_match_returns_first_candidate() {
    let dir = TempDir::new().unwrap();
    let (url, state) = spawn_mock(StatusCode::OK, die_hard_body()).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Exact);

    let found = matcher.match_title("Die Hard", YearQuery::Year(1988)).await.unwrap();
    assert_eq!(found.id, "11");
    assert_eq!(found.ratings.critics_score, 93);
    assert_eq!(found.links["alternate"], "http://reviews.test/m/die_hard");

    let queries = state.queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["apikey=secret&limit=10&q=Die+Hard".to_string()]);
}

#[tokio::test]
async fn test_candidates_without_theater_date_are_not_found() {
    let dir = TempDir::new().unwrap();
    let body = json!({
        "total": 1,
        "movies": [{"id": "11", "title": "Die Hard", "release_dates": {"dvd": "1999-01-01"}}]
    })
    .to_string();
    let (url, _state) = spawn_mock(StatusCode::OK, body).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Loose);

    let err = matcher
        .match_title("Die Hard", YearQuery::Year(1988))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_match_catalog_id() {
    let dir = TempDir::new().unwrap();
    let pool = catalog(&dir).await;
    insert_title(
        &pool,
        &StoredTitleRecord {
            id: 60000042,
            year: 1988,
            title: "Die Hard".to_string(),
            updated: 1_300_000_000,
            rating: 4.3,
            play_url: "http://play/60000042".to_string(),
            synopsis: String::new(),
            box_art: String::new(),
        },
    )
    .await
    .unwrap();

    let (url, _state) = spawn_mock(StatusCode::OK, die_hard_body()).await;
    let matcher = matcher(url, pool, MatchMode::Loose);

    let found = matcher.match_catalog_id(60000042).await.unwrap();
    assert_eq!(found.id, "11");
}

#[tokio::test]
async fn test_unknown_catalog_id_is_not_found_without_request() {
    let dir = TempDir::new().unwrap();
    let (url, state) = spawn_mock(StatusCode::OK, die_hard_body()).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Loose);

    let err = matcher.match_catalog_id(404).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(state.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_title_is_not_found_without_request() {
    let dir = TempDir::new().unwrap();
    let (url, state) = spawn_mock(StatusCode::OK, die_hard_body()).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Loose);

    let err = matcher.match_title(" ?! ", YearQuery::Any).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(state.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_status_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let (url, _state) =
        spawn_mock(StatusCode::FORBIDDEN, "Account Inactive".to_string()).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Loose);

    let err = matcher
        .match_title("Die Hard", YearQuery::Year(1988))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    match err {
        LookupError::Status { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "Account Inactive");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_failure() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = spawn_mock(StatusCode::OK, "<html>".to_string()).await;
    let matcher = matcher(url, catalog(&dir).await, MatchMode::Loose);

    let err = matcher
        .match_title("Die Hard", YearQuery::Year(1988))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Decode(_)));
}

#[tokio::test]
async fn test_unreadable_catalog_is_not_found_without_request() {
    let dir = TempDir::new().unwrap();
    let pool = catalog(&dir).await;
    sqlx::query("DROP TABLE titles").execute(&pool).await.unwrap();

    let (url, state) = spawn_mock(StatusCode::OK, die_hard_body()).await;
    let matcher = matcher(url, pool, MatchMode::Loose);

    let err = matcher.match_catalog_id(1).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
    assert!(state.queries.lock().unwrap().is_empty());
}
