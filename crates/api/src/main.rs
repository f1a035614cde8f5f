use std::sync::Arc;

use anyhow::Context;

use stockwatch_api::app;
use stockwatch_infra::{AppConfig, LogFormat};
use stockwatch_observability::LogOutput;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    stockwatch_observability::init_with(match config.log_format {
        LogFormat::Json => LogOutput::Json,
        LogFormat::Pretty => LogOutput::Pretty,
    });

    let services = Arc::new(app::services::build_services(&config).await?);
    let router = app::build_app(services);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
