//! Per-phone service-state duration tracking
//!
//! A sibling of the call tracker keyed by the network registration tuple
//! instead of call identity. One accumulator is open per phone; it closes
//! and emits whenever any field of the tuple changes, and a data-RAT change
//! additionally emits a switch record. Re-observing the same tuple only
//! extends the running duration.

use std::sync::Arc;

use tracing::debug;

use crate::atoms::{CellularDataServiceSwitch, CellularServiceState};
use crate::clock::Clock;
use crate::config::PhoneConfig;
use crate::events::ServiceStateSnapshot;
use crate::store::AtomStore;
use crate::types::{CarrierId, Rat, RegState, RoamingType};

/// The field-tuple an accumulator is keyed by
///
/// `suppressed` marks airplane mode with no WiFi-calling override - the one
/// state whose duration is never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StateKey {
    voice_rat: Rat,
    data_rat: Rat,
    voice_roaming: RoamingType,
    data_roaming: RoamingType,
    is_endc: bool,
    carrier_id: CarrierId,
    suppressed: bool,
}

impl StateKey {
    fn from_snapshot(snap: &ServiceStateSnapshot) -> Self {
        let suppressed = snap.voice_reg == RegState::PowerOff
            && snap.data_reg == RegState::PowerOff
            && !snap.wifi_calling_active;
        // An IMS-over-WiFi registration overrides the reported data RAT.
        let data_rat = if snap.wifi_calling_active {
            Rat::Iwlan
        } else {
            snap.data_rat
        };
        Self {
            voice_rat: snap.voice_rat,
            data_rat,
            voice_roaming: snap.voice_roaming,
            data_roaming: snap.data_roaming,
            is_endc: snap.is_endc,
            carrier_id: snap.carrier_id,
            suppressed,
        }
    }
}

#[derive(Debug)]
struct Accumulator {
    key: StateKey,
    since_millis: u64,
}

/// Accumulates time per service-state tuple for one phone
pub struct ServiceStateAggregator {
    phone: PhoneConfig,
    clock: Arc<dyn Clock>,
    store: Arc<AtomStore>,
    current: Option<Accumulator>,
}

impl ServiceStateAggregator {
    pub fn new(phone: PhoneConfig, clock: Arc<dyn Clock>, store: Arc<AtomStore>) -> Self {
        Self {
            phone,
            clock,
            store,
            current: None,
        }
    }

    /// Apply a service-state update
    ///
    /// A no-op update (identical tuple) just lets the open accumulator keep
    /// extending. A real change emits the closing accumulator (unless
    /// suppressed), emits a switch record when the data RAT specifically
    /// changed, and starts a fresh accumulator at `now`.
    pub fn on_service_state_changed(&mut self, snapshot: &ServiceStateSnapshot) {
        let key = StateKey::from_snapshot(snapshot);
        let now = self.clock.now_millis();

        if let Some(current) = &self.current {
            if current.key == key {
                return;
            }
            self.emit_current(now);
            self.emit_switch_if_data_rat_changed(&key);
        }
        debug!(
            slot = self.phone.sim_slot_index,
            voice_rat = ?key.voice_rat,
            data_rat = ?key.data_rat,
            suppressed = key.suppressed,
            "service state changed"
        );
        self.current = Some(Accumulator {
            key,
            since_millis: now,
        });
    }

    /// Force-emit the open accumulator at a pull boundary
    ///
    /// The accumulator survives with its timer re-armed at `now`, so the
    /// emitted spans stay contiguous and never overlap. A conclude never
    /// produces a switch record; only an actual data-RAT change does.
    pub fn conclude(&mut self) {
        let now = self.clock.now_millis();
        self.emit_current(now);
        if let Some(current) = &mut self.current {
            current.since_millis = now;
        }
    }

    fn emit_current(&self, now_millis: u64) {
        let Some(current) = &self.current else {
            return;
        };
        if current.key.suppressed {
            return;
        }
        let key = &current.key;
        self.store.add_service_state(CellularServiceState {
            voice_rat: key.voice_rat,
            data_rat: key.data_rat,
            voice_roaming: key.voice_roaming,
            data_roaming: key.data_roaming,
            is_endc: key.is_endc,
            sim_slot_index: self.phone.sim_slot_index,
            is_multi_sim: self.phone.is_multi_sim,
            carrier_id: key.carrier_id,
            total_time_millis: now_millis.saturating_sub(current.since_millis),
        });
    }

    /// A switch record only exists for a genuine data-RAT change between two
    /// non-suppressed tuples
    fn emit_switch_if_data_rat_changed(&self, next: &StateKey) {
        let Some(current) = &self.current else {
            return;
        };
        let prev = &current.key;
        if prev.suppressed || next.suppressed || prev.data_rat == next.data_rat {
            return;
        }
        self.store.add_data_service_switch(CellularDataServiceSwitch {
            rat_from: prev.data_rat,
            rat_to: next.data_rat,
            sim_slot_index: self.phone.sim_slot_index,
            is_multi_sim: self.phone.is_multi_sim,
            carrier_id: next.carrier_id,
            switch_count: 1,
        });
    }
}
