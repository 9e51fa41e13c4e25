//! Pull front-end over the atom store
//!
//! The export scheduler periodically asks for each atom type; the transport
//! that ships records off-device is someone else's problem. A denied pull
//! (`None`) means "ask again later" and is distinct from an empty collection,
//! which is a valid terminal answer.

use std::sync::Arc;

use crate::atoms::{
    CellularDataServiceSwitch, CellularServiceState, RawVoiceCallRatUsage, VoiceCallSession,
};
use crate::store::AtomStore;

/// Result of one scheduled collection pass; `None` fields were rate-limited
#[derive(Debug, Default)]
pub struct PulledAtoms {
    pub voice_call_sessions: Option<Vec<VoiceCallSession>>,
    pub rat_usage: Option<Vec<RawVoiceCallRatUsage>>,
    pub service_states: Option<Vec<CellularServiceState>>,
    pub data_service_switches: Option<Vec<CellularDataServiceSwitch>>,
}

/// Rate-limited reader for the export scheduler
pub struct Collector {
    store: Arc<AtomStore>,
    min_interval_millis: u64,
}

impl Collector {
    pub fn new(store: Arc<AtomStore>, min_interval_millis: u64) -> Self {
        Self {
            store,
            min_interval_millis,
        }
    }

    pub fn pull_voice_call_sessions(&self) -> Option<Vec<VoiceCallSession>> {
        self.store.pull_voice_call_sessions(self.min_interval_millis)
    }

    pub fn pull_rat_usage(&self) -> Option<Vec<RawVoiceCallRatUsage>> {
        self.store.pull_rat_usage(self.min_interval_millis)
    }

    pub fn pull_service_states(&self) -> Option<Vec<CellularServiceState>> {
        self.store.pull_service_states(self.min_interval_millis)
    }

    pub fn pull_data_service_switches(&self) -> Option<Vec<CellularDataServiceSwitch>> {
        self.store.pull_data_service_switches(self.min_interval_millis)
    }

    /// Pull every atom type in one pass; each type rate-limits independently
    pub fn pull_all(&self) -> PulledAtoms {
        PulledAtoms {
            voice_call_sessions: self.pull_voice_call_sessions(),
            rat_usage: self.pull_rat_usage(),
            service_states: self.pull_service_states(),
            data_service_switches: self.pull_data_service_switches(),
        }
    }
}
