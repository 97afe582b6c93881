//! Feedback board backend entry point.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use server::{build_app, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting feedback backend...");

    let config = Config::from_env();

    // Initialize Prometheus metrics
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;

    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        config.metrics_port
    );

    let (_state, router) = build_app(&config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Backend listening on http://0.0.0.0:{}", config.port);
    info!("Available endpoints:");
    info!("  POST  /auth/login                        - Login or register");
    info!("  GET   /auth/profile                      - Token-derived profile");
    info!("  GET   /auth/validate                     - Validate a token");
    info!("  POST  /feedback                          - Submit feedback");
    info!("  GET   /feedback                          - List feedback");
    info!("  GET   /feedback/my-feedback              - Own submissions");
    info!("  GET   /feedback/{{id}}                     - Single entry");
    info!("  PATCH /feedback/{{id}}/mark-inappropriate  - Flag an entry");
    info!("  DELETE /feedback/{{id}}                    - Remove an entry");
    info!("  GET   /ws                                - Realtime channel");
    info!("  GET   /health                            - Health check");

    // Run HTTP server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Feedback backend stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
