use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::search::txt;
use crate::search::viewer::ViewerConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub data: PathBuf,
    pub port: u16,
    pub db_pool_size: u32,
    pub content_uri: String,
    pub api_uri: String,
    pub preview_token: String,
    pub download_token: String,
    /// Serve every request with admin rights, for single user installs.
    pub public: bool,
    pub query_timeout: Duration,
    pub label_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let data = env::var("NAZR_DATA").unwrap_or_else(|_| "/nazr-data".to_string());
        let port = env::var("NAZR_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(9161);
        let db_pool_size = env::var("NAZR_DB_POOL_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        let content_uri = env::var("NAZR_CONTENT_URI").unwrap_or_else(|_| "/api/v1".to_string());
        let api_uri = env::var("NAZR_API_URI").unwrap_or_else(|_| "/api/v1".to_string());
        let preview_token = env::var("NAZR_PREVIEW_TOKEN").unwrap_or_else(|_| "public".to_string());
        let download_token = env::var("NAZR_DOWNLOAD_TOKEN").unwrap_or_else(|_| "public".to_string());
        let public = env::var("NAZR_PUBLIC").map(|v| txt::is_yes(&v)).unwrap_or(false);
        let timeout_ms = env::var("NAZR_QUERY_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000);
        let cache_secs = env::var("NAZR_LABEL_CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(900);
        Self {
            data: PathBuf::from(data),
            port,
            db_pool_size,
            content_uri: content_uri.trim_end_matches('/').to_string(),
            api_uri: api_uri.trim_end_matches('/').to_string(),
            preview_token,
            download_token,
            public,
            query_timeout: Duration::from_millis(timeout_ms),
            label_cache_ttl: Duration::from_secs(cache_secs),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data.join("db").join("nazr.db")
    }

    pub fn viewer(&self) -> ViewerConfig {
        ViewerConfig {
            content_uri: self.content_uri.clone(),
            api_uri: self.api_uri.clone(),
            preview_token: self.preview_token.clone(),
            download_token: self.download_token.clone(),
        }
    }
}
