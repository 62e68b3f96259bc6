//! # Live Classroom Server
//!
//! Application entry point. Initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Storage (PostgreSQL or in-memory)
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use live_classroom::config::Settings;
use live_classroom::presentation::http::handlers::health;
use live_classroom::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first: they carry the log format
    let settings = Settings::load()?;
    live_classroom::telemetry::init_tracing(&settings.log_format);
    health::init_server_start();

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
