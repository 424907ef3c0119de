//! Periodic expiry of stale oracle requests

use crate::coordinator::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Run [`Coordinator::sweep_expired`] every `period` until `shutdown` flips
pub fn spawn_expiry_sweeper(
    coordinator: Arc<Coordinator>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match coordinator.sweep_expired().await {
                        Ok(expired) if !expired.is_empty() => {
                            info!(count = expired.len(), "Expired stale oracle requests");
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Expiry sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{AccessConfig, CoordinatorConfig};
    use crate::store::InMemoryStore;
    use gaia_types::{ActorId, OwnerId};

    #[tokio::test]
    async fn test_sweeper_expires_and_stops() {
        let config = CoordinatorConfig {
            access: AccessConfig {
                administrators: vec!["ops".into()],
                ..AccessConfig::default()
            },
            ..CoordinatorConfig::default()
        };
        let clock = Arc::new(ManualClock::starting_now());
        let coordinator = Arc::new(
            Coordinator::new(config, Arc::new(InMemoryStore::new())).with_clock(clock.clone()),
        );
        let ops = ActorId::new("ops");
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops, &owner, 1.0).await.unwrap();
        let id = coordinator.request_rebalance(&ops, &owner, 2.0).await.unwrap();
        clock.advance(chrono::Duration::hours(2));

        let (tx, rx) = watch::channel(false);
        let handle = spawn_expiry_sweeper(coordinator.clone(), Duration::from_millis(10), rx);

        // First tick fires immediately
        for _ in 0..50 {
            if !coordinator.oracle_request(id).await.unwrap().is_pending() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!coordinator.oracle_request(id).await.unwrap().is_pending());

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
