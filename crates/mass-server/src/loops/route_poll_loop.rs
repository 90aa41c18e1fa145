//! Keep the route cache warm from the fleet-data provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::backoff::Backoff;
use crate::state::AppState;

const MAX_BACKOFF_SECS: u64 = 15 * 60;

/// Start the route poll loop.
pub async fn run_route_poll_loop(
    state: Arc<AppState>,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut backoff = Backoff::new(poll_interval, Duration::from_secs(MAX_BACKOFF_SECS));

    tracing::info!(
        "Polling route source '{}' every {}s",
        state.source_name(),
        poll_interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Route poll loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if !backoff.ready() {
                    continue;
                }

                if state.refresh_route().await {
                    if backoff.failures() > 0 {
                        tracing::info!("Route source recovered after {} failed polls", backoff.failures());
                    }
                    backoff.reset();
                } else {
                    let delay = backoff.fail();
                    tracing::warn!(
                        "Route poll failed ({} in a row), next attempt in {:?}",
                        backoff.failures(),
                        delay
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sources::RouteSource;
    use async_trait::async_trait;
    use mass_core::{parse_rtz, RouteDocument, StaticCatalogue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RouteSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self) -> Option<RouteDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            parse_rtz(r#"<route version="1.1"/>"#).ok()
        }
    }

    #[tokio::test]
    async fn poll_fills_cache_and_stops_on_shutdown() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let state = Arc::new(AppState::with_parts(
            Config::from_lookup(|_| None),
            source.clone(),
            Arc::new(StaticCatalogue::default()),
        ));
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(run_route_poll_loop(
            state.clone(),
            Duration::from_millis(10),
            rx,
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(source.calls.load(Ordering::SeqCst) >= 1);
        assert!(state.cache().has_route());
        assert_eq!(state.cache().origin().as_deref(), Some("counting"));
    }
}
