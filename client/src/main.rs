//! Command-line watcher for the restream status feed.

use clap::Parser;
use restream_client::{ClientEvent, ConnectionState, StatusSocket, StatusView};
use restream_types::DEFAULT_PORT;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Restream watch - print live stream status changes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Status socket URL
    #[arg(long, env = "RESTREAM_WS_URL", default_value_t = format!("ws://127.0.0.1:{}/api/ws", DEFAULT_PORT))]
    url: String,

    /// Only report this stream key
    #[arg(long)]
    stream_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let mut view = match args.stream_key {
        Some(key) => StatusView::only(key),
        None => StatusView::new(),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let socket = StatusSocket::spawn(args.url, tx);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutting down");
                break;
            }
            event = rx.recv() => match event {
                Some(ClientEvent::ConnectionStateChanged(state)) => {
                    if state == ConnectionState::GivenUp {
                        warn!("{}: giving up, restart to try again", state.description());
                    } else {
                        info!("{}", state.description());
                    }
                }
                Some(ClientEvent::Frame(frame)) => {
                    for change in view.apply(frame) {
                        let state = if change.is_live { "LIVE" } else { "offline" };
                        match change.previous {
                            Some((was_live, was_viewers)) => info!(
                                "{} {} ({} viewers, was {} with {})",
                                change.stream_key,
                                state,
                                change.viewers,
                                if was_live { "live" } else { "offline" },
                                was_viewers
                            ),
                            None => info!("{} {} ({} viewers)", change.stream_key, state, change.viewers),
                        }
                    }
                }
                None => break,
            }
        }
    }

    socket.disable().await;
    Ok(())
}
