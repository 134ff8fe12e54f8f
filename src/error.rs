use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

/// Terminal failures of a search call. None of them are retried.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("permission denied")]
    Forbidden,
    #[error("invalid id {0:?}")]
    InvalidId(String),
    #[error("invalid album filter: {0}")]
    BadFilter(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("unknown sort order {0:?}")]
    BadSortOrder(String),
    #[error("query timed out")]
    Timeout,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::BadRequest(_) | SearchError::BadFilter(_) | SearchError::BadSortOrder(_) => StatusCode::BAD_REQUEST,
            SearchError::Forbidden => StatusCode::FORBIDDEN,
            SearchError::InvalidId(_) | SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            SearchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(e: rusqlite::Error) -> Self {
        SearchError::Storage(e.into())
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("search failed: {:#}", self);
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SearchError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(SearchError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(SearchError::InvalidId("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(SearchError::BadFilter("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(SearchError::NotFound("photo".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(SearchError::BadSortOrder("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(SearchError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(SearchError::Storage(anyhow::anyhow!("boom")).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(SearchError::BadSortOrder("foo".into()).to_string(), "unknown sort order \"foo\"");
        assert_eq!(SearchError::NotFound("photo".into()).to_string(), "photo not found");
    }
}
