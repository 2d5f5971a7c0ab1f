use lifeplanner::{
    report::GeminiReportClient, session::SessionStore, AppState, Config, FileStore, PlannerService,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if config.report.api_key.is_none() {
        warn!("no Gemini API key configured, daily reports will use the fallback");
    }

    let service = PlannerService::new(Arc::new(FileStore::new(config.data_path.clone())));
    let sessions = SessionStore::new(Arc::new(FileStore::new(config.session_path.clone())));
    let reports = GeminiReportClient::new(config.report.clone())?;

    let existing = service.load().await;
    info!(
        data_path = %config.data_path.display(),
        users = existing.users.len(),
        "database loaded"
    );

    let state = AppState::new(service, sessions, Arc::new(reports));
    let app = lifeplanner::router(state);

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
