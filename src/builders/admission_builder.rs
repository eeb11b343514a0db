//! Builders wiring the admission components from configuration.

use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::Receiver;

use crate::config::AdmissionConfig;
use crate::core::{
    AdmissionError, AppResult, AutoEnrollmentBatcher, BatchReport, CourseOffering, DomainEvent,
    EnrollmentLedger, EnrollmentStore, EventSink, InMemoryEventSink, RosterProvider, WaitlistQueue,
};
use crate::infra::sink::ChannelEventSink;
use crate::infra::store::InMemoryStore;
#[cfg(feature = "tokio-runtime")]
use crate::{infra::sink::TokioEventSink, runtime::PromotionWorker};
#[cfg(feature = "tokio-runtime")]
use tokio::sync::mpsc::UnboundedReceiver;

/// Ledger, waitlist and batcher sharing one store and one sink.
pub struct AdmissionService<S, K: ?Sized, R: ?Sized> {
    /// Enrollment ledger.
    pub ledger: EnrollmentLedger<S, K>,
    /// Waitlist over the same store.
    pub waitlist: WaitlistQueue<S, K>,
    /// Roster auto-enrollment.
    pub batcher: AutoEnrollmentBatcher<S, K, R>,
}

impl<S, K, R> AdmissionService<S, K, R>
where
    S: EnrollmentStore,
    K: EventSink + ?Sized,
    R: RosterProvider + ?Sized,
{
    /// Wire the components over a shared store, sink and roster.
    pub fn new(store: Arc<S>, sink: Arc<K>, roster: Arc<R>) -> Self {
        let ledger = EnrollmentLedger::new(store, sink);
        Self {
            waitlist: WaitlistQueue::new(ledger.clone()),
            batcher: AutoEnrollmentBatcher::new(ledger.clone(), roster),
            ledger,
        }
    }

    /// Register an offering, then run its auto-enrollment strategy once.
    pub async fn create_offering(
        &self,
        offering: CourseOffering,
    ) -> Result<BatchReport, AdmissionError>
    where
        S: 'static,
        K: 'static,
    {
        self.ledger.register_offering(offering.clone())?;
        self.batcher.on_offering_created(&offering).await
    }
}

/// Who reads the event channel of a service built with
/// [`AdmissionBuilder::build_with_promotion`].
#[cfg(feature = "tokio-runtime")]
pub enum Promotion {
    /// The promotion worker owns the receiver.
    Running(PromotionWorker),
    /// Promotion is off; the caller owns the receiver.
    Disabled(UnboundedReceiver<DomainEvent>),
}

/// Builds an [`AdmissionService`] from validated configuration.
pub struct AdmissionBuilder {
    config: AdmissionConfig,
}

impl AdmissionBuilder {
    /// Create a builder for the provided configuration.
    pub const fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    /// Builder configured from `ADMISSION_*` environment variables.
    pub fn from_env() -> AppResult<Self> {
        let config = AdmissionConfig::from_env()
            .map_err(anyhow::Error::msg)
            .context("loading admission config from environment")?;
        Ok(Self::new(config))
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// In-memory sink sized from configuration.
    pub fn in_memory_sink(&self) -> Arc<InMemoryEventSink> {
        Arc::new(InMemoryEventSink::new(self.config.event_buffer_capacity))
    }

    /// Bounded channel sink sized from configuration.
    pub fn channel_sink(&self) -> (Arc<ChannelEventSink>, Receiver<DomainEvent>) {
        let (sink, rx) = ChannelEventSink::bounded(self.config.event_buffer_capacity);
        (Arc::new(sink), rx)
    }

    /// Build over an in-memory store using the configured lock timeout.
    pub fn build_in_memory<K, R>(
        self,
        sink: Arc<K>,
        roster: Arc<R>,
    ) -> Result<AdmissionService<InMemoryStore, K, R>, AdmissionError>
    where
        K: EventSink + ?Sized,
        R: RosterProvider + ?Sized,
    {
        self.validate()?;
        let store = Arc::new(InMemoryStore::with_lock_timeout(self.config.lock_timeout()));
        tracing::info!(lock_timeout_ms = self.config.lock_timeout_ms, "admission service built");
        Ok(AdmissionService::new(store, sink, roster))
    }

    /// Build over a caller-supplied store.
    ///
    /// The store keeps the lock timeout it was created with; `lock_timeout_ms`
    /// only applies to stores this builder creates.
    pub fn build_with_store<S, K, R>(
        self,
        store: Arc<S>,
        sink: Arc<K>,
        roster: Arc<R>,
    ) -> Result<AdmissionService<S, K, R>, AdmissionError>
    where
        S: EnrollmentStore,
        K: EventSink + ?Sized,
        R: RosterProvider + ?Sized,
    {
        self.validate()?;
        Ok(AdmissionService::new(store, sink, roster))
    }

    /// Build over an in-memory store with a tokio event channel.
    ///
    /// When `promotion.enabled` is set a [`PromotionWorker`] consumes the
    /// channel; otherwise the receiver is handed back so events still have a
    /// reader. Must be called from within a tokio runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn build_with_promotion<R>(
        self,
        roster: Arc<R>,
    ) -> Result<(AdmissionService<InMemoryStore, TokioEventSink, R>, Promotion), AdmissionError>
    where
        R: RosterProvider + ?Sized,
    {
        let (sink, events) = TokioEventSink::unbounded();
        let enabled = self.config.promotion.enabled;
        let svc = self.build_in_memory(Arc::new(sink), roster)?;
        tracing::info!(promotion = enabled, "promotion worker configured");
        let promotion = if enabled {
            Promotion::Running(PromotionWorker::spawn(svc.waitlist.clone(), events))
        } else {
            Promotion::Disabled(events)
        };
        Ok((svc, promotion))
    }

    fn validate(&self) -> Result<(), AdmissionError> {
        self.config
            .validate()
            .map_err(|e| AdmissionError::Backend(format!("config invalid: {e}")))
    }
}
