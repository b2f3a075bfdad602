use actix_web::HttpServer;
use anyhow::Context;
use tracing::info;

use blogicum_server::infrastructure::config::AppConfig;
use blogicum_server::infrastructure::database::{create_pool, run_migrations};
use blogicum_server::infrastructure::logging::init_logging;
use blogicum_server::{AppState, Repositories, build_app};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    tokio::fs::create_dir_all(&config.media_root)
        .await
        .context("failed to create media root")?;

    let state = AppState::new(Repositories::postgres(pool), &config)
        .context("failed to load templates")?;

    info!(host = %config.host, port = config.port, "HTTP server starting");

    HttpServer::new(move || build_app(state.clone()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
