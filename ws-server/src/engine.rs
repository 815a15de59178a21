//! Periodic reconciliation of mixer state against connected subscribers
//!
//! Every tick the engine acquires a fresh snapshot, compares it with the one
//! it last broadcast and, only if they differ, pushes it to every subscriber.
//! Ticks with no subscribers do nothing at all, so `pactl` is not invoked
//! while nobody is listening.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pulse_state::{Snapshot, SnapshotSource};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::protocol::Response;
use crate::registry::SubscriberRegistry;

/// Result of one engine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No subscribers, nothing acquired
    Idle,
    /// Snapshot equal to the last broadcast one
    Unchanged,
    /// Snapshot changed and was sent
    Broadcast {
        /// Subscribers that received it
        delivered: usize,
        /// Subscribers removed because the send failed
        dropped: usize,
    },
}

/// Broadcasts snapshot changes to the registry on a fixed period
pub struct SyncEngine {
    source: Arc<dyn SnapshotSource>,
    registry: SubscriberRegistry,
    interval: Duration,
    /// Last broadcast snapshot; held for the whole tick
    last: Mutex<Option<Snapshot>>,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        registry: SubscriberRegistry,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The snapshot most recently broadcast, if any
    pub async fn last_broadcast(&self) -> Option<Snapshot> {
        self.last.lock().await.clone()
    }

    /// Run one acquire, compare, broadcast cycle
    pub async fn tick(&self) -> TickOutcome {
        if self.registry.is_empty() {
            return TickOutcome::Idle;
        }

        let mut last = self.last.lock().await;
        let snapshot = self.source.snapshot().await;

        if last.as_ref() == Some(&snapshot) {
            return TickOutcome::Unchanged;
        }

        let text = match Response::status(snapshot.clone()).to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "failed to encode snapshot");
                return TickOutcome::Unchanged;
            }
        };

        let subscribers = self.registry.subscribers();
        let results = join_all(subscribers.iter().map(|subscriber| {
            let text = text.clone();
            async move { (subscriber, subscriber.send_text(text).await) }
        }))
        .await;

        let mut delivered = 0;
        let mut dropped = 0;
        for (subscriber, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    // The connection task may already be cleaning up.
                    if self.registry.remove(&subscriber.id()).is_some() {
                        warn!(id = %subscriber.id(), error = %e, "dropping subscriber after failed send");
                        subscriber.close().await;
                        dropped += 1;
                    }
                }
            }
        }

        *last = Some(snapshot);
        debug!(delivered, dropped, "broadcast snapshot");
        TickOutcome::Broadcast { delivered, dropped }
    }

    /// Start the tick loop on the runtime
    pub fn spawn(self: Arc<Self>) -> EngineHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let engine = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?engine.interval, "sync engine started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let outcome = engine.tick().await;
                        trace!(?outcome, "tick");
                    }
                }
            }

            info!("sync engine stopped");
        });

        EngineHandle {
            engine: self,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

/// Handle to a running [`SyncEngine`] loop
pub struct EngineHandle {
    engine: Arc<SyncEngine>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Stop the loop and wait for the task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
