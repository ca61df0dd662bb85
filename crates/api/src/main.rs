use anyhow::Context;

use loomworks_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    loomworks_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let app = loomworks_api::app::build_app_from_config(&config)
        .await
        .context("failed to initialise storage")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        env = ?config.app_env,
        persistent = config.database_url.is_some(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
