mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::serve;
use common::*;
use nazr_search::api::routes;
use nazr_search::AppState;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

async fn spawn_app(state: Arc<AppState>) -> String {
    let app = routes::router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(&addr).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        serve(listener, app.into_make_service()).await.unwrap();
    });

    // Wait for server to start
    sleep(Duration::from_millis(100)).await;
    format!("http://127.0.0.1:{}", port)
}

async fn seeded_app() -> (tempfile::TempDir, String) {
    let (tmp, db_path, conn) = setup_test_db();
    seed(&conn);
    drop(conn);
    let state = create_test_app_state(&tmp, db_path);
    let base = spawn_app(state).await;
    (tmp, base)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_tmp, base) = seeded_app().await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "SQLite");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_photos_paging_headers() {
    let (_tmp, base) = seeded_app().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/v1/photos", base))
        .query(&[("year", "2019"), ("type", "image"), ("count", "1"), ("offset", "1")])
        .header("X-Session-Role", "admin")
        .header("X-Session-User", "us9lxuqxpogaaba1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-count"], "1");
    assert_eq!(resp.headers()["x-limit"], "1");
    assert_eq!(resp.headers()["x-offset"], "1");
    let rows: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["photo_year"], 2019);
}

#[tokio::test]
async fn test_query_parameter() {
    let (_tmp, base) = seeded_app().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/v1/photos", base))
        .query(&[("q", "label:cat"), ("primary", "true"), ("order", "oldest")])
        .header("X-Session-Role", "admin")
        .header("X-Session-User", "us9lxuqxpogaaba1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let rows: Vec<serde_json::Value> = resp.json().await.unwrap();
    let uids: Vec<&str> = rows.iter().map(|r| r["photo_uid"].as_str().unwrap()).collect();
    assert_eq!(uids, vec![BERLIN, PARIS]);
}

#[tokio::test]
async fn test_error_statuses() {
    let (_tmp, base) = seeded_app().await;
    let client = reqwest::Client::new();
    let get = |params: Vec<(&'static str, &'static str)>, role: &'static str| {
        client
            .get(format!("{}/api/v1/photos", base))
            .query(&params)
            .header("X-Session-Role", role)
            .header("X-Session-User", "us9lxuqxpogaaba1")
            .send()
    };

    let resp = get(vec![("order", "sideways")], "admin").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("sideways"));

    let resp = get(vec![("colour", "red")], "admin").await.unwrap();
    assert_eq!(resp.status(), 400);

    let resp = get(vec![], "visitor").await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = get(vec![("scope", "at9lxuqxpogaaba9")], "admin").await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client.get(format!("{}/api/v1/photos", base)).send().await.unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_viewer_and_geojson() {
    let (_tmp, base) = seeded_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/v1/photos/view", base))
        .query(&[("uid", BERLIN), ("primary", "true")])
        .header("X-Session-Role", "user")
        .header("X-Session-User", "us9lxuqxpogaaba1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let rows: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(rows.len(), 1);

    let resp = client
        .get(format!("{}/api/v1/geo/geojson", base))
        .query(&[("country", "de")])
        .header("X-Session-Role", "user")
        .header("X-Session-User", "us9lxuqxpogaaba1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(body["features"].as_array().unwrap().len(), 2);
}
