pub mod api;
pub mod db;
pub mod error;
pub mod search;
pub mod utils;

use std::time::Instant;

use db::cache::LabelCache;
use db::DbPool;
use search::Rules;
use utils::config::Config;

/// Shared state of the HTTP service.
pub struct AppState {
    pub started_at: Instant,
    pub config: Config,
    pub pool: DbPool,
    pub rules: Rules,
    pub label_cache: LabelCache,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool) -> Self {
        let label_cache = LabelCache::new(config.label_cache_ttl);
        Self { started_at: Instant::now(), config, pool, rules: Rules::default(), label_cache }
    }

    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }
}
