//! Per-phone facade and the process-level engine
//!
//! Each phone owns its own call tracker and service-state aggregator; the
//! engine is the explicit registry that owns the phones and the shared
//! store. There is no ambient global lookup - whoever manages phones holds
//! the engine and passes references down.

use std::sync::Arc;

use tracing::warn;

use crate::call_tracker::CallSessionTracker;
use crate::clock::Clock;
use crate::collector::{Collector, PulledAtoms};
use crate::config::{MetricsConfig, PhoneConfig};
use crate::events::TelephonyEvent;
use crate::service_state::ServiceStateAggregator;
use crate::store::AtomStore;

/// All trackers for one phone/slot
pub struct PhoneMetrics {
    calls: CallSessionTracker,
    service: ServiceStateAggregator,
}

impl PhoneMetrics {
    pub fn new(phone: PhoneConfig, clock: Arc<dyn Clock>, store: Arc<AtomStore>) -> Self {
        Self {
            calls: CallSessionTracker::new(phone, clock.clone(), store.clone()),
            service: ServiceStateAggregator::new(phone, clock, store),
        }
    }

    /// Apply one inbound event, in the order received for this phone
    pub fn handle(&mut self, event: TelephonyEvent) {
        match event {
            TelephonyEvent::ServiceStateChanged(snapshot) => {
                self.service.on_service_state_changed(&snapshot);
            }
            call_event => self.calls.handle(call_event),
        }
    }

    /// Force-emit the open service-state accumulator (pull boundary)
    pub fn conclude_service_state(&mut self) {
        self.service.conclude();
    }

    /// Number of currently live calls on this phone
    pub fn live_call_count(&self) -> usize {
        self.calls.live_call_count()
    }
}

/// Owns every phone's trackers plus the shared store and collector
pub struct MetricsEngine {
    phones: Vec<PhoneMetrics>,
    store: Arc<AtomStore>,
    collector: Collector,
}

impl MetricsEngine {
    /// Build an engine from configuration, opening (or creating) the store
    pub fn new(config: &MetricsConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(AtomStore::with_limits(
            config.store_path.clone(),
            clock.clone(),
            config.store_limits(),
        ));
        Self::with_store(config, clock, store)
    }

    /// Build an engine over an existing store (shared with tests/tooling)
    pub fn with_store(config: &MetricsConfig, clock: Arc<dyn Clock>, store: Arc<AtomStore>) -> Self {
        let phones = config
            .phones
            .iter()
            .map(|phone| PhoneMetrics::new(*phone, clock.clone(), store.clone()))
            .collect();
        let collector = Collector::new(store.clone(), config.min_pull_interval_millis);
        Self {
            phones,
            store,
            collector,
        }
    }

    /// Dispatch one event to the phone it belongs to
    ///
    /// Events for a phone index the engine does not manage are logged and
    /// dropped; a misrouted event must never crash the pipeline.
    pub fn handle(&mut self, phone_index: usize, event: TelephonyEvent) {
        match self.phones.get_mut(phone_index) {
            Some(phone) => phone.handle(event),
            None => warn!(phone_index, "event for unmanaged phone dropped"),
        }
    }

    /// Scheduled collection: conclude every phone's service-state
    /// accumulator, then pull each atom collection through the rate limiter
    pub fn collect(&mut self) -> PulledAtoms {
        for phone in &mut self.phones {
            phone.conclude_service_state();
        }
        self.collector.pull_all()
    }

    /// The shared atom store
    pub fn store(&self) -> &Arc<AtomStore> {
        &self.store
    }

    /// Number of phones under management
    pub fn phone_count(&self) -> usize {
        self.phones.len()
    }
}
