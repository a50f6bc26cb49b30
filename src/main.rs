//! Point d'entrée principal de l'application.
//! Charge la configuration, ouvre la base de données et l'enforcer,
//! puis démarre le serveur web avec Axum.

use anyhow::{Context, Result};
use dotenv::dotenv;
use log::info;

use health_desk::authorization::Enforcer;
use health_desk::backend::router::get_router;
use health_desk::backend::state::AppState;
use health_desk::config::Config;
use health_desk::consts::APP_VERSION;
use health_desk::db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    info!("{} v{APP_VERSION}", config.app_name);

    let db = Database::open(&config.database_url)
        .await
        .context("Failed to open the database")?;
    let enforcer = Enforcer::load(&config.casbin_model, &config.casbin_policy)
        .await
        .context("Failed to load the access control policy")?;

    let addr = config.socket_addr();
    let app = get_router(AppState::new(config, db, enforcer));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to open web server listener on {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
