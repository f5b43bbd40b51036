use std::sync::Arc;

use anyhow::Context;
use nettsted::api::{AppState, create_router};
use nettsted::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(&config).context("Failed to build CMS client")?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(
        "listening on {}, content from {}",
        config.bind_addr,
        config.directus_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
