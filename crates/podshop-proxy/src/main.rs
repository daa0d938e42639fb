mod api;
mod gateway;
mod middleware;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    gateway::GatewayClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = podshop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let secret_key = config.gateway_secret_key.as_deref().ok_or_else(|| {
        anyhow::anyhow!("PODSHOP_GATEWAY_SECRET_KEY is required to run the payment proxy")
    })?;
    let gateway = GatewayClient::new(
        &config.gateway_base_url,
        secret_key,
        config.request_timeout_secs,
    )?;
    let app = build_app(AppState { gateway });

    let listener = tokio::net::TcpListener::bind(config.proxy_bind_addr).await?;
    tracing::info!(
        addr = %config.proxy_bind_addr,
        env = %config.env,
        gateway = %config.gateway_base_url,
        "payment proxy listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
