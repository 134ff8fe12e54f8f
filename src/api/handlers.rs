use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{debug, warn};

use crate::db::query::Library;
use crate::error::{Result, SearchError};
use crate::search::{viewer, Engine, Role, S2Index, SearchFilter, Session};
use crate::AppState;

type Params = Query<Vec<(String, String)>>;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": "SQLite",
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "label_cache": {
            "hits": state.label_cache.stats().hits,
            "misses": state.label_cache.stats().misses,
        }
    });
    (StatusCode::OK, Json(body))
}

/// Session issued by the auth proxy in front of the service. Public
/// installs search unrestricted.
fn session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    if state.config.public {
        return None;
    }
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).unwrap_or("");
    let shares = get("x-session-shares")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let session = Session::new(Role::parse(get("x-session-role")), get("x-session-user"))
        .with_shares(shares)
        .with_base_path(get("x-session-base-path"));
    Some(session)
}

/// Runs `search` against a pooled connection on the blocking pool, bounded by
/// the configured query timeout.
async fn run<T, F>(state: &Arc<AppState>, search: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Engine<'_>) -> Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking({
        let state = state.clone();
        move || {
            let conn = state.pool.get().map_err(|e| anyhow::anyhow!("Pool error: {}", e))?;
            let lib = Library::new(&conn).with_label_cache(&state.label_cache);
            let engine = Engine::new(&lib, &state.rules, &S2Index);
            search(&engine)
        }
    });
    match tokio::time::timeout(state.config.query_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SearchError::Storage(anyhow::anyhow!("Task error: {}", e))),
        Err(_) => {
            warn!("search exceeded {:?}", state.config.query_timeout);
            Err(SearchError::Timeout)
        }
    }
}

fn header(name: &'static str, value: impl ToString) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"));
    (HeaderName::from_static(name), value)
}

pub async fn photos(State(state): State<Arc<AppState>>, headers: HeaderMap, Query(params): Params) -> Result<impl IntoResponse> {
    let filter = SearchFilter::from_pairs(params)?;
    let session = session(&state, &headers);
    let (limit, offset) = (filter.limit(), filter.offset());
    let (rows, count) = run(&state, move |engine| engine.search(&filter, session.as_ref())).await?;
    debug!(count, returned = rows.len(), "photos");
    let headers = [header("x-count", count), header("x-limit", limit), header("x-offset", offset)];
    Ok((StatusCode::OK, headers, Json(rows)))
}

pub async fn photos_view(State(state): State<Arc<AppState>>, headers: HeaderMap, Query(params): Params) -> Result<impl IntoResponse> {
    let filter = SearchFilter::from_pairs(params)?;
    let session = session(&state, &headers);
    let cfg = state.config.viewer();
    let rows = run(&state, move |engine| engine.search_viewer(&filter, session.as_ref(), &cfg)).await?;
    Ok(Json(rows))
}

pub async fn geo(State(state): State<Arc<AppState>>, headers: HeaderMap, Query(params): Params) -> Result<impl IntoResponse> {
    let filter = SearchFilter::from_pairs(params)?;
    let session = session(&state, &headers);
    let limit = filter.limit();
    let rows = run(&state, move |engine| engine.search_geo(&filter, session.as_ref())).await?;
    Ok((StatusCode::OK, [header("x-count", rows.len()), header("x-limit", limit)], Json(rows)))
}

pub async fn geojson(State(state): State<Arc<AppState>>, headers: HeaderMap, Query(params): Params) -> Result<impl IntoResponse> {
    let filter = SearchFilter::from_pairs(params)?;
    let session = session(&state, &headers);
    let rows = run(&state, move |engine| engine.search_geo(&filter, session.as_ref())).await?;
    Ok(Json(viewer::geojson(&rows)))
}
