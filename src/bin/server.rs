use repomentor::{logging, server, Config};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    logging::init(&level)?;

    let config = Config::load(None)?;
    if let Err(e) = server::run(config).await {
        error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
