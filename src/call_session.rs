//! In-flight state of one live call
//!
//! A `CallSession` is created on the dial/incoming event, mutated by every
//! subsequent codec/RAT/SRVCC/RTT event, and consumed the instant its
//! terminal [`VoiceCallSession`] atom is built. It is never persisted and
//! never mutated after emission.

use crate::atoms::VoiceCallSession;
use crate::types::{
    AudioCodec, Bearer, CallDirection, CallId, CallState, CarrierId, Rat, SetupDuration,
};

/// Disconnect detail as delivered by the terminate event
#[derive(Debug, Clone, Default)]
pub struct DisconnectCause {
    pub reason_code: i32,
    pub extra_code: i32,
    pub extra_message: Option<String>,
}

/// Longest retained prefix of a disconnect extra message
pub const MAX_DISCONNECT_MESSAGE_CHARS: usize = 128;

/// Sanitize a disconnect extra message: absent becomes empty, anything
/// longer than [`MAX_DISCONNECT_MESSAGE_CHARS`] keeps only that prefix
pub fn sanitize_disconnect_message(message: Option<&str>) -> String {
    match message {
        None => String::new(),
        Some(m) => m.chars().take(MAX_DISCONNECT_MESSAGE_CHARS).collect(),
    }
}

/// Mutable per-call accumulator owned by the call tracker
#[derive(Debug)]
pub struct CallSession {
    pub call_id: CallId,
    pub direction: CallDirection,
    pub created_millis: u64,
    pub bearer_at_start: Bearer,
    pub bearer_at_end: Bearer,
    pub rat_at_start: Rat,
    pub rat_at_end: Rat,
    pub rat_switch_count: u32,
    pub codec_bitmask: u64,
    pub concurrent_call_count_at_start: u32,
    pub srvcc_completed: bool,
    pub srvcc_failure_count: u32,
    pub srvcc_cancellation_count: u32,
    pub first_alert_or_active_millis: Option<u64>,
    pub answered: bool,
    pub rtt_enabled: bool,
    pub is_emergency: bool,
    pub is_roaming: bool,
    pub carrier_id: CarrierId,
}

impl CallSession {
    /// Create a session for a call observed at `now_millis`
    ///
    /// `concurrent_call_count_at_start` is the number of sibling live calls
    /// on the same phone, snapshotted before this call was inserted.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        call_id: CallId,
        direction: CallDirection,
        rat: Rat,
        carrier_id: CarrierId,
        is_emergency: bool,
        is_roaming: bool,
        concurrent_call_count_at_start: u32,
        now_millis: u64,
    ) -> Self {
        let bearer = Bearer::from_rat(rat);
        Self {
            call_id,
            direction,
            created_millis: now_millis,
            bearer_at_start: bearer,
            bearer_at_end: bearer,
            rat_at_start: rat,
            rat_at_end: rat,
            rat_switch_count: 0,
            codec_bitmask: 0,
            concurrent_call_count_at_start,
            srvcc_completed: false,
            srvcc_failure_count: 0,
            srvcc_cancellation_count: 0,
            first_alert_or_active_millis: None,
            answered: false,
            rtt_enabled: false,
            is_emergency,
            is_roaming,
            carrier_id,
        }
    }

    /// OR the codec's bit into the accumulated bitmask; never cleared
    pub fn note_codec(&mut self, codec: AudioCodec) {
        self.codec_bitmask |= codec.bit();
    }

    /// Apply a phone-wide RAT change; returns whether it differed
    pub fn note_rat(&mut self, rat: Rat) -> bool {
        if rat == self.rat_at_end {
            return false;
        }
        self.rat_at_end = rat;
        self.rat_switch_count += 1;
        true
    }

    /// Capture the first ALERTING/ACTIVE timestamp and answered transitions
    pub fn note_state(&mut self, state: CallState, now_millis: u64) {
        if matches!(state, CallState::Alerting | CallState::Active)
            && self.first_alert_or_active_millis.is_none()
        {
            self.first_alert_or_active_millis = Some(now_millis);
        }
        if state == CallState::Active {
            self.answered = true;
        }
    }

    /// Whether the call's voice media currently rides the IMS bearer
    pub fn is_ims(&self) -> bool {
        self.bearer_at_end == Bearer::Ims
    }

    /// Bucketed setup duration: elapsed creation-to-first-ALERTING/ACTIVE
    /// for calls that got that far, `Unknown` for failed setups
    pub fn setup_duration(&self) -> SetupDuration {
        match self.first_alert_or_active_millis {
            Some(t) => SetupDuration::classify(t.saturating_sub(self.created_millis)),
            None => SetupDuration::Unknown,
        }
    }

    /// Build the terminal atom, consuming the session
    ///
    /// `concurrent_call_count_at_end` is the sibling live-call count
    /// snapshotted before this call's removal; `sim_slot_index`,
    /// `is_multi_sim` and `is_esim` describe the owning phone.
    pub fn into_atom(
        self,
        cause: &DisconnectCause,
        concurrent_call_count_at_end: u32,
        sim_slot_index: i32,
        is_multi_sim: bool,
        is_esim: bool,
    ) -> VoiceCallSession {
        VoiceCallSession {
            direction: self.direction,
            bearer_at_start: self.bearer_at_start,
            bearer_at_end: self.bearer_at_end,
            setup_duration: self.setup_duration(),
            setup_failed: !self.answered,
            disconnect_reason_code: cause.reason_code,
            disconnect_extra_code: cause.extra_code,
            disconnect_extra_message: sanitize_disconnect_message(cause.extra_message.as_deref()),
            rat_at_start: self.rat_at_start,
            rat_at_end: self.rat_at_end,
            rat_switch_count: self.rat_switch_count,
            codec_bitmask: self.codec_bitmask,
            concurrent_call_count_at_start: self.concurrent_call_count_at_start,
            concurrent_call_count_at_end,
            sim_slot_index,
            is_multi_sim,
            is_esim,
            carrier_id: self.carrier_id,
            srvcc_completed: self.srvcc_completed,
            srvcc_failure_count: self.srvcc_failure_count,
            srvcc_cancellation_count: self.srvcc_cancellation_count,
            rtt_enabled: self.rtt_enabled,
            is_emergency: self.is_emergency,
            is_roaming: self.is_roaming,
        }
    }
}
