//! Per-phone call session tracking
//!
//! One tracker instance per phone/slot consumes that phone's call lifecycle
//! events in order, drives the RAT usage aggregator, and emits exactly one
//! terminal record per logical call. A buggy or duplicate upstream event is
//! logged and ignored; nothing here can fail back into the event source.

use std::sync::Arc;

use fnv::FnvHashMap;
use tracing::{debug, warn};

use crate::call_session::{CallSession, DisconnectCause};
use crate::clock::Clock;
use crate::config::PhoneConfig;
use crate::events::TelephonyEvent;
use crate::rat_usage::RatUsageAggregator;
use crate::store::AtomStore;
use crate::types::{
    AudioCodec, Bearer, CallDirection, CallId, CallState, CarrierId, Rat, SrvccState,
};

/// Tracks every live call on one phone
pub struct CallSessionTracker {
    phone: PhoneConfig,
    clock: Arc<dyn Clock>,
    store: Arc<AtomStore>,
    live: FnvHashMap<CallId, CallSession>,
    rat_usage: RatUsageAggregator,
}

impl CallSessionTracker {
    pub fn new(phone: PhoneConfig, clock: Arc<dyn Clock>, store: Arc<AtomStore>) -> Self {
        let rat_usage = RatUsageAggregator::new(clock.clone());
        Self {
            phone,
            clock,
            store,
            live: FnvHashMap::default(),
            rat_usage,
        }
    }

    /// Apply one call-related event; service-state events do not belong here
    pub fn handle(&mut self, event: TelephonyEvent) {
        match event {
            TelephonyEvent::CallStart {
                call_id,
                direction,
                rat,
                carrier_id,
                is_emergency,
                is_roaming,
            } => self.on_call_start(call_id, direction, rat, carrier_id, is_emergency, is_roaming),
            TelephonyEvent::CallStateChanged { call_id, state } => {
                self.on_call_state_changed(call_id, state)
            }
            TelephonyEvent::AudioCodecChanged { call_id, codec } => {
                self.on_audio_codec_changed(call_id, codec)
            }
            TelephonyEvent::RttStarted { call_id } => self.on_rtt_started(call_id),
            TelephonyEvent::SrvccStateChanged { state } => self.on_srvcc_state_changed(state),
            TelephonyEvent::RatChanged { rat, carrier_id } => self.on_rat_changed(rat, carrier_id),
            TelephonyEvent::CallTerminated {
                call_id,
                reason_code,
                extra_code,
                extra_message,
            } => self.on_call_terminated(
                call_id,
                DisconnectCause {
                    reason_code,
                    extra_code,
                    extra_message,
                },
            ),
            TelephonyEvent::ServiceStateChanged(_) => {
                debug!(slot = self.phone.sim_slot_index, "service state event routed to call tracker, ignored");
            }
        }
    }

    /// A call was dialed or received
    pub fn on_call_start(
        &mut self,
        call_id: CallId,
        direction: CallDirection,
        rat: Rat,
        carrier_id: CarrierId,
        is_emergency: bool,
        is_roaming: bool,
    ) {
        if self.live.contains_key(&call_id) {
            warn!(call_id, slot = self.phone.sim_slot_index, "duplicate call start ignored");
            return;
        }
        let concurrent_at_start = self.live.len() as u32;
        let session = CallSession::new(
            call_id,
            direction,
            rat,
            carrier_id,
            is_emergency,
            is_roaming,
            concurrent_at_start,
            self.clock.now_millis(),
        );
        debug!(call_id, ?direction, ?rat, carrier_id, "call started");

        let first_live = self.live.is_empty();
        self.live.insert(call_id, session);
        self.rat_usage.note_active_rat(rat, carrier_id);
        self.rat_usage.note_call_became_live(call_id);
        if first_live {
            self.push_usage();
        }
    }

    /// The audio codec on a live call changed; unknown ids are a teardown race
    pub fn on_audio_codec_changed(&mut self, call_id: CallId, codec: AudioCodec) {
        match self.live.get_mut(&call_id) {
            Some(session) => session.note_codec(codec),
            None => debug!(call_id, "codec change for unknown call ignored"),
        }
    }

    /// The phone-wide voice RAT changed; applies to every live call
    pub fn on_rat_changed(&mut self, rat: Rat, carrier_id: CarrierId) {
        for session in self.live.values_mut() {
            session.note_rat(rat);
        }
        self.rat_usage.note_active_rat(rat, carrier_id);
        self.push_usage();
    }

    /// SRVCC handover progress, applied to live IMS-bearer calls
    pub fn on_srvcc_state_changed(&mut self, state: SrvccState) {
        match state {
            SrvccState::Started => {}
            SrvccState::Completed => {
                for session in self.live.values_mut().filter(|s| s.is_ims()) {
                    session.bearer_at_end = Bearer::CircuitSwitched;
                    session.srvcc_completed = true;
                }
            }
            SrvccState::Failed => {
                for session in self.live.values_mut().filter(|s| s.is_ims()) {
                    session.srvcc_failure_count += 1;
                }
            }
            SrvccState::Canceled => {
                for session in self.live.values_mut().filter(|s| s.is_ims()) {
                    session.srvcc_cancellation_count += 1;
                }
            }
        }
    }

    /// A live call's signalling state changed
    pub fn on_call_state_changed(&mut self, call_id: CallId, state: CallState) {
        let now = self.clock.now_millis();
        match self.live.get_mut(&call_id) {
            Some(session) => session.note_state(state, now),
            None => debug!(call_id, ?state, "state change for unknown call ignored"),
        }
    }

    /// Real-time text started on a live call; sticky for the session
    pub fn on_rtt_started(&mut self, call_id: CallId) {
        match self.live.get_mut(&call_id) {
            Some(session) => session.rtt_enabled = true,
            None => debug!(call_id, "RTT start for unknown call ignored"),
        }
    }

    /// A live call ended: emit its terminal record exactly once
    ///
    /// A second terminate for the same id finds no session and is ignored,
    /// so duplicates can never emit twice.
    pub fn on_call_terminated(&mut self, call_id: CallId, cause: DisconnectCause) {
        let Some(session) = self.live.remove(&call_id) else {
            warn!(call_id, slot = self.phone.sim_slot_index, "terminate for unknown call ignored");
            return;
        };
        // Siblings only: the map no longer holds the terminating call.
        let concurrent_at_end = self.live.len() as u32;
        let atom = session.into_atom(
            &cause,
            concurrent_at_end,
            self.phone.sim_slot_index,
            self.phone.is_multi_sim,
            self.phone.is_esim,
        );
        debug!(call_id, reason_code = cause.reason_code, "call terminated");
        self.store.add_voice_call_session(atom);

        self.rat_usage.note_call_ended(call_id);
        self.push_usage();
    }

    /// Number of currently live calls on this phone
    pub fn live_call_count(&self) -> usize {
        self.live.len()
    }

    /// Merge closed usage windows into the store
    fn push_usage(&mut self) {
        for usage in self.rat_usage.flush() {
            self.store.add_rat_usage(usage);
        }
    }
}
