//! Restream status server.

use clap::Parser;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use restream::{
    config::Config, create_app_with_config, liveness::spawn_liveness_sweep, logging,
    state::AppState,
};

/// Restream - live stream status broadcaster
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "RESTREAM_PORT")]
    port: Option<u16>,

    /// Base URL of the media server HTTP API (e.g. http://127.0.0.1:1985)
    #[arg(long, env = "RESTREAM_MEDIA_SERVER_URL")]
    media_server_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(args.port, args.media_server_url)?;

    // Must run before the runtime starts any threads
    let _log_guard = logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    info!("Starting restream status server...");
    run(config)
}

#[tokio::main]
async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        "Media server API at {} (timeout {:?})",
        config.media_server_url, config.media_server_timeout
    );

    let state = AppState::from_config(&config);

    let cancel = CancellationToken::new();
    let sweep = spawn_liveness_sweep(
        state.registry().clone(),
        config.ping_interval,
        cancel.clone(),
    );

    let app = create_app_with_config(state, config.cors_allowed_origins.clone());

    // Bind to 0.0.0.0 to be accessible from all interfaces (Docker, network, etc.)
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    cancel.cancel();
    sweep.await?;

    info!("Server shutting down");
    Ok(())
}
