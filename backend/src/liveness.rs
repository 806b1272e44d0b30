//! Periodic liveness sweep over open sockets.

use crate::registry::ConnectionRegistry;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Spawn the task that sweeps `registry` every `every` until `cancel` fires.
///
/// Each sweep pings connections that answered the previous ping and drops
/// connections that did not.
pub fn spawn_liveness_sweep(
    registry: ConnectionRegistry,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting liveness sweep every {:?}", every);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Liveness sweep cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let report = registry.sweep();
                    trace!(
                        "Liveness sweep pinged {} and removed {} connection(s)",
                        report.pinged,
                        report.removed.len()
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::RecordingSink;
    use crate::registry::{Liveness, Outbound};
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_dropped_after_two_sweeps() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::default();
        let id = registry.add(sink.clone());
        let cancel = CancellationToken::new();
        let handle = spawn_liveness_sweep(registry.clone(), Duration::from_secs(30), cancel.clone());

        sleep(Duration::from_secs(31)).await;
        assert_eq!(registry.liveness(&id), Some(Liveness::Awaiting));

        sleep(Duration::from_secs(30)).await;
        assert!(!registry.contains(&id));
        assert_eq!(sink.messages(), vec![Outbound::Ping, Outbound::Close]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_responsive_connection_kept() {
        let registry = ConnectionRegistry::new();
        let id = registry.add(RecordingSink::default());
        let cancel = CancellationToken::new();
        let handle = spawn_liveness_sweep(registry.clone(), Duration::from_secs(30), cancel.clone());

        // Answer each ping one second after the sweep that sent it
        sleep(Duration::from_secs(1)).await;
        for _ in 0..5 {
            sleep(Duration::from_secs(30)).await;
            assert_eq!(registry.liveness(&id), Some(Liveness::Awaiting));
            registry.mark_alive(&id);
        }
        assert!(registry.contains(&id));

        cancel.cancel();
        handle.await.unwrap();
    }
}
