//! Persisted atom records
//!
//! One atom is a typed metrics record awaiting export. These are the only
//! shapes that cross the store boundary; everything in-flight stays inside
//! its tracker.

use serde::{Deserialize, Serialize};

use crate::types::{Bearer, CallDirection, CarrierId, Rat, RoamingType, SetupDuration};

/// Terminal summary of one completed voice call
///
/// Emitted exactly once per logical call, at termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCallSession {
    pub direction: CallDirection,

    /// Bearer when the call was created
    pub bearer_at_start: Bearer,

    /// Bearer when the call ended; SRVCC completion flips IMS to CS
    pub bearer_at_end: Bearer,

    /// Bucketed elapsed time between creation and first ALERTING/ACTIVE;
    /// `Unknown` when setup never completed
    pub setup_duration: SetupDuration,

    /// Whether the call never reached the active state
    pub setup_failed: bool,

    pub disconnect_reason_code: i32,
    pub disconnect_extra_code: i32,

    /// Sanitized at termination: never absent, at most 128 characters
    pub disconnect_extra_message: String,

    pub rat_at_start: Rat,
    pub rat_at_end: Rat,

    /// RAT changes observed while the call was live
    pub rat_switch_count: u32,

    /// OR-accumulated set of audio codecs ever used during the call
    pub codec_bitmask: u64,

    /// Sibling live calls on the same phone when this call was created
    pub concurrent_call_count_at_start: u32,

    /// Sibling live calls on the same phone when this call terminated
    pub concurrent_call_count_at_end: u32,

    pub sim_slot_index: i32,
    pub is_multi_sim: bool,
    pub is_esim: bool,
    pub carrier_id: CarrierId,

    pub srvcc_completed: bool,
    pub srvcc_failure_count: u32,
    pub srvcc_cancellation_count: u32,

    /// Sticky: true once RTT was observed at any point during the call
    pub rtt_enabled: bool,

    pub is_emergency: bool,
    pub is_roaming: bool,
}

/// Accumulated voice usage for one (carrier, RAT) pair
///
/// Sums duration and distinct-call counts across all closed usage windows;
/// never reset except by an explicit pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVoiceCallRatUsage {
    pub carrier_id: CarrierId,
    pub rat: Rat,
    pub total_duration_millis: u64,
    pub call_count: u32,
}

/// Time spent in one cellular service-state tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellularServiceState {
    pub voice_rat: Rat,
    pub data_rat: Rat,
    pub voice_roaming: RoamingType,
    pub data_roaming: RoamingType,
    pub is_endc: bool,
    pub sim_slot_index: i32,
    pub is_multi_sim: bool,
    pub carrier_id: CarrierId,
    pub total_time_millis: u64,
}

/// One observed data-RAT handover, coalesced by (from, to) until the next pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellularDataServiceSwitch {
    pub rat_from: Rat,
    pub rat_to: Rat,
    pub sim_slot_index: i32,
    pub is_multi_sim: bool,
    pub carrier_id: CarrierId,
    pub switch_count: u32,
}
