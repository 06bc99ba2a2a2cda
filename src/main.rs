//! Tongue advisor service binary.
//!
//! Loads configuration from the environment, builds the REST router, and
//! serves it until interrupted. All behaviour lives in the workspace crates;
//! this binary only wires them together.

use advisor_core::Config;
use api_rest::{router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the tongue advisor REST service.
///
/// # Environment Variables
/// - `OPENAI_API_KEY`: completion provider API key (required)
/// - `OPENAI_BASE_URL`: provider endpoint base
/// - `ADVISOR_MODEL`: completion model name
/// - `PORT`: listen port (default: 5000)
/// - `ALLOWED_ORIGINS`: comma-separated CORS origin list
/// - `ADVISOR_DATA_DIR`: session slot directory
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration is missing or invalid,
/// - the listen address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("advisor_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("advisor_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env()?;
    let state = AppState::new(&cfg)?;
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr = cfg.listen_addr();
    tracing::info!("-- Starting tongue advisor REST API on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
