use somnium::{analysis::GeminiAnalyzer, load_data, router, AppState, ServerConfig};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = ServerConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    if let Some(active) = &data.active_session {
        info!(id = %active.id, started = %active.start_time, "resuming running sleep session");
    }
    if config.gemini.api_key.is_none() {
        warn!("no GEMINI_API_KEY set, analyses will return the fallback result");
    }

    let analyzer = GeminiAnalyzer::new(config.gemini.clone())?;
    let state = AppState::new(config.data_path.clone(), data, Arc::new(analyzer));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
