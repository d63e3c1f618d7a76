use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::pipeline::AnalysisPipeline;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Builds the pipeline from `config` and serves the HTTP API until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let pipeline = AnalysisPipeline::from_config(&config)?;

    info!("repomentor server starting");
    info!("Acquisition strategy: {}", pipeline.strategy());
    info!("LLM provider: {} ({})", pipeline.provider(), config.llm.model());

    let app = create_router(AppState::new(pipeline));
    let listener = TcpListener::bind(&config.server.bind_address).await.map_err(|e| {
        AnalyzerError::Config(format!("Failed to bind {}: {}", config.server.bind_address, e))
    })?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
