use std::sync::Arc;

use taxi_dispatch::{AppConfig, AppState, startup::build_router, telemetry::init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.log_level, config.log_json);

    let address = format!("0.0.0.0:{}", config.port);
    let app_state = AppState::new(config).await?;
    let app = build_router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Taxi dispatch listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
