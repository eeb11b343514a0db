//! Drop-triggered promotion worker.
//!
//! Listens on the [`crate::infra::sink::TokioEventSink`] channel and calls
//! [`WaitlistQueue::promote`] once for every `EnrollmentDropped` event. The
//! promote call may block on the offering lock, so it runs on the blocking pool.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::core::events::DomainEvent;
use crate::core::{EnrollmentStore, EventSink, WaitlistQueue};

/// Counters returned when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromotionStats {
    /// Drop events handled.
    pub drops_seen: u64,
    /// Students promoted.
    pub promoted: u64,
    /// Promote calls that failed.
    pub failures: u64,
}

/// Handle to a running promotion worker.
pub struct PromotionWorker {
    handle: JoinHandle<PromotionStats>,
    shutdown: watch::Sender<bool>,
}

impl PromotionWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The waitlist usually publishes into the same channel the worker reads,
    /// which keeps the channel open; stop the worker with [`Self::shutdown`].
    pub fn spawn<S, K>(waitlist: WaitlistQueue<S, K>, events: UnboundedReceiver<DomainEvent>) -> Self
    where
        S: EnrollmentStore + 'static,
        K: EventSink + ?Sized + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(waitlist, events, shutdown_rx));
        Self { handle, shutdown }
    }

    /// Signal shutdown and wait for the worker to exit.
    pub async fn shutdown(self) -> Result<PromotionStats, JoinError> {
        let _ = self.shutdown.send(true);
        self.handle.await
    }
}

async fn run<S, K>(
    waitlist: WaitlistQueue<S, K>,
    mut events: UnboundedReceiver<DomainEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> PromotionStats
where
    S: EnrollmentStore + 'static,
    K: EventSink + ?Sized + 'static,
{
    let mut stats = PromotionStats::default();
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("promotion worker shutting down");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("event channel closed, promotion worker exiting");
                    break;
                };
                let DomainEvent::EnrollmentDropped { offering, .. } = event else {
                    continue;
                };
                stats.drops_seen += 1;
                let queue = waitlist.clone();
                match tokio::task::spawn_blocking(move || queue.promote(offering)).await {
                    Ok(Ok(Some(student))) => {
                        stats.promoted += 1;
                        tracing::debug!(%offering, %student, "seat refilled from waitlist");
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => {
                        stats.failures += 1;
                        tracing::warn!(%offering, error = %e, "promotion failed");
                    }
                    Err(e) => {
                        stats.failures += 1;
                        tracing::error!(%offering, error = %e, "promotion task panicked");
                    }
                }
            }
        }
    }
    stats
}
