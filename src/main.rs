use std::net::SocketAddr;
use std::sync::Arc;

use nazr_search::db;
use nazr_search::utils::config::Config;
use nazr_search::utils::logging;
use nazr_search::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cfg = Config::from_env();
    let db_path = cfg.db_path();
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let pool = db::create_pool(&db_path, cfg.db_pool_size)?;
    info!(db = %db_path.display(), pool = cfg.db_pool_size, "database ready");

    let port = cfg.port;
    let state = Arc::new(AppState::new(cfg, pool));
    let app = nazr_search::api::routes::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}
