use axum::http::Method;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::handlers;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(vec![Method::GET, Method::OPTIONS])
        .allow_headers(vec![axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .expose_headers(vec![
            axum::http::HeaderName::from_static("x-count"),
            axum::http::HeaderName::from_static("x-limit"),
            axum::http::HeaderName::from_static("x-offset"),
        ]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/photos", get(handlers::photos))
        .route("/api/v1/photos/view", get(handlers::photos_view))
        .route("/api/v1/geo", get(handlers::geo))
        .route("/api/v1/geo/geojson", get(handlers::geojson))
        .layer(cors)
        .with_state(state)
}
