use dotenvy::dotenv;
use storefront::logging::init_tracing;
use storefront::metrics::{init_metrics, metrics_app};
use storefront::router::init_router;
use storefront::state::init_app_state;
use storefront_config::ServerConfig;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    match init_metrics() {
        Ok(Some(handle)) => {
            let metrics_addr = std::env::var("METRICS_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:9090".to_string());
            let listener = tokio::net::TcpListener::bind(&metrics_addr).await?;
            info!(addr = %metrics_addr, "Metrics endpoint listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics not exported"),
        Err(e) => warn!(error = %e, "Failed to install metrics recorder"),
    }

    let state = init_app_state().await?;
    let app = init_router(state);

    let server = ServerConfig::from_env();
    let addr = server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Server running");
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
